//! Router contracts and path matching for Archimedes.
//!
//! This crate defines what a router is and the path machinery routers share:
//!
//! - [`Router`] / [`MatchableRouter`] - resolving a request to an
//!   [`ExecutionChain`](archimedes_core::ExecutionChain), and testing
//!   arbitrary patterns against the path a router resolved with
//! - [`PathPatternParser`] / [`PathPattern`] - the pattern language
//!   (`?`, `*`, `**`, `{name}`, `{*name}`)
//! - [`RequestPath`] / [`LookupPath`] - the two path forms routers cache on a
//!   request, and the helpers in [`path`] that read and write them
//! - [`PatternRouter`] - a router over an ordered pattern table
//!
//! # Example
//!
//! ```rust
//! use archimedes_core::{Exchange, OperationHandler};
//! use archimedes_router::{path, MatchableRouter, PatternRouter, Router};
//! use std::sync::Arc;
//!
//! let router = PatternRouter::builder("api")
//!     .route("/users/{id}", Arc::new(OperationHandler::new("getUser")))
//!     .build()
//!     .unwrap();
//!
//! let mut request = Exchange::new(http::Request::get("/users/7").body(()).unwrap());
//! path::parse_and_cache(&mut request).unwrap();
//!
//! let chain = router.resolve(&mut request).unwrap().unwrap();
//! assert_eq!(chain.handler().name(), "getUser");
//!
//! let matched = router.match_pattern(&request, "/users/{userId}").unwrap().unwrap();
//! assert_eq!(matched.uri_variables().get("userId"), Some("7"));
//! ```
//!
//! # Path forms
//!
//! ```text
//!   /app/users;v=2//7         raw URI path, context path "/app"
//!        │
//!        ├── RequestPath      value "/app/users;v=2//7"
//!        │                    path within application "/users;v=2//7"
//!        │
//!        └── lookup path      "/users/7"  (no ';' params, no '//')
//! ```

mod mapping;
pub mod path;
mod pattern;
mod pattern_router;
mod variables;

pub use mapping::{
    is_logging_suppressed, MatchableRouter, RequestMatchResult, Router, HIGHEST_PRECEDENCE,
    LOWEST_PRECEDENCE, SUPPRESS_LOGGING_ATTRIBUTE,
};
pub use path::{LookupPath, RequestPath, LOOKUP_PATH_ATTRIBUTE, PARSED_PATH_ATTRIBUTE};
pub use pattern::{PathPattern, PathPatternParser, PatternElement};
pub use pattern_router::{PathMode, PatternRouter, PatternRouterBuilder};
pub use variables::UriVariables;
