//! Route resolution introspection for Archimedes.
//!
//! This crate answers, for an inbound request, which router *would* handle it
//! and which CORS policy the resolved route *would* apply, without
//! dispatching the request. A security layer uses the answer to check path
//! patterns against exactly the path the router itself resolved.
//!
//! # Overview
//!
//! - [`RouterContext`] registers routers, handlers and router factories
//! - [`HandlerIntrospector`] discovers routers once and runs queries
//! - [`LookupPathMatchableRouter`] matches patterns against a resolved path
//! - [`AttributesPreservingRequest`] keeps probes from marking the request
//! - [`CacheScope`] caches results on the request for nested processing
//!
//! # Example
//!
//! ```rust
//! use archimedes_core::{CorsConfiguration, Exchange, OperationHandler};
//! use archimedes_introspect::{HandlerIntrospector, RouterContext};
//! use archimedes_router::PatternRouter;
//! use std::sync::Arc;
//!
//! let router = PatternRouter::builder("api")
//!     .route_with_cors(
//!         "/api/**",
//!         Arc::new(OperationHandler::new("api")),
//!         CorsConfiguration::builder().allow_origin("https://app.example").build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let mut context = RouterContext::new();
//! context.register_router("api", Arc::new(router));
//!
//! let introspector = HandlerIntrospector::new(Arc::new(context));
//! introspector.initialize().unwrap();
//!
//! let mut request = Exchange::new(http::Request::get("/api/orders").body(()).unwrap());
//! let visible = introspector
//!     .with_cache(&mut request, |request| {
//!         archimedes_introspect::cache::cached_router(&*request).is_some()
//!     })
//!     .unwrap();
//!
//! assert!(visible);
//! assert!(archimedes_introspect::cache::cached_router(&request).is_none());
//! ```

#![doc(html_root_url = "https://docs.rs/archimedes-introspect/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod adapter;
pub mod cache;
mod context;
mod cors;
mod engine;
mod introspector;
mod isolation;
mod pattern_cache;
mod registry;
mod scope;

pub use adapter::LookupPathMatchableRouter;
pub use cache::{CacheScope, CacheSnapshot, CachedCors};
pub use context::{RouterContext, RouterFactory, HANDLER_NAME_ROUTER, PATH_PATTERN_ROUTER};
pub use cors::extract_cors;
pub use introspector::HandlerIntrospector;
pub use isolation::AttributesPreservingRequest;
pub use pattern_cache::PathPatternMatchableRouter;
pub use registry::{RegisteredRouter, RouterRegistry};
pub use scope::AttributeScope;
