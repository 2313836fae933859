//! # Archimedes Core
//!
//! Core types shared by the Archimedes routing and introspection crates.
//!
//! This crate provides the foundational types used throughout Archimedes:
//!
//! - [`ServerRequest`] - The request surface routers and introspection work against
//! - [`Exchange`] - The concrete request carried through the middleware chain
//! - [`Attributes`] - Request-scoped, string-keyed attribute storage
//! - [`ExecutionChain`] - A resolved handler plus its ordered interceptors
//! - [`CorsConfiguration`] - Cross-origin policy attached to a route
//! - [`RoutingError`] - Standard error type for routing and introspection

#![doc(html_root_url = "https://docs.rs/archimedes-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod attributes;
pub mod cors;
mod error;
mod handler;
mod request;

pub use attributes::{AttributeValue, Attributes};
pub use cors::{AllowedOrigins, CorsConfiguration, CorsConfigurationSource, CorsInterceptor};
pub use error::{ErrorCategory, ErrorDetail, ErrorEnvelope, RoutingError, RoutingResult};
pub use handler::{ExecutionChain, Handler, HandlerInterceptor, OperationHandler};
pub use request::{Exchange, ServerRequest, ServerRequestExt};
