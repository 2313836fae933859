//! Middleware stages.
//!
//! - [`introspection`] - Populate the route-introspection cache for the rest of the chain
//! - [`cors`] - Apply the per-request CORS policy from a [`CorsConfigurationSource`]
//!
//! [`CorsConfigurationSource`]: archimedes_core::CorsConfigurationSource

pub mod cors;
pub mod introspection;

pub use cors::CorsMiddleware;
pub use introspection::IntrospectionCacheMiddleware;
