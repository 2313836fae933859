//! # Archimedes Middleware
//!
//! Async middleware chain for Archimedes route introspection.
//!
//! A [`Pipeline`] runs its stages in order around a handler. Two stages are
//! provided:
//!
//! | Stage                 | Middleware                             | Purpose                                        |
//! |-----------------------|----------------------------------------|------------------------------------------------|
//! | `introspection_cache` | [`stages::IntrospectionCacheMiddleware`] | Resolve once, cache router and CORS policy     |
//! | `cors`                | [`stages::CorsMiddleware`]             | Apply the route's CORS policy                  |
//!
//! ```text
//! Request → IntrospectionCache → Cors → Handler
//!                                          ↓
//! Response ← (cache restored) ← Cors ←─────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use archimedes_core::{CorsConfiguration, OperationHandler};
//! use archimedes_introspect::{HandlerIntrospector, RouterContext};
//! use archimedes_middleware::stages::{CorsMiddleware, IntrospectionCacheMiddleware};
//! use archimedes_middleware::Pipeline;
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
//! let introspector = Arc::new(HandlerIntrospector::new(Arc::new(context)));
//! introspector.initialize().unwrap();
//!
//! let pipeline = Pipeline::builder()
//!     .stage(IntrospectionCacheMiddleware::new(introspector.clone()))
//!     .stage(CorsMiddleware::new(introspector))
//!     .build();
//!
//! assert_eq!(pipeline.stage_names(), vec!["introspection_cache", "cors"]);
//! ```

#![doc(html_root_url = "https://docs.rs/archimedes-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use types::{Request, Response, ResponseExt};
