//! # Archimedes Test
//!
//! Test utilities for Archimedes route introspection.
//!
//! ## Key Features
//!
//! - **Request Builder**: Fluent API producing [`Exchange`](archimedes_core::Exchange)s
//! - **Router Fixtures**: Invocation-counting and failing routers
//! - **CORS Fixtures**: Interceptors with and without CORS capability
//! - **Response Assertions**: Buffered responses with header and envelope helpers
//! - **Log Capture**: [`init_tracing`] routes `tracing` output to the test harness
//!
//! ## Example
//!
//! ```
//! use archimedes_router::Router;
//! use archimedes_test::{CountingRouter, InvocationLog, TestRequest};
//!
//! let log = InvocationLog::new();
//! let router = CountingRouter::resolved_patterns("api", 0, &["/api/**"], log.clone());
//!
//! let mut request = TestRequest::get("/api/users").exchange();
//! assert!(router.resolve(&mut request).unwrap().is_some());
//! assert_eq!(log.calls(), vec!["api"]);
//! ```

#![doc(html_root_url = "https://docs.rs/archimedes-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod request;
mod response;
mod routers;
mod tracing;

pub use error::TestError;
pub use request::TestRequest;
pub use response::TestResponse;
pub use routers::{
    ChainRouter, CountingRouter, FailingRouter, InvocationLog, StubCorsInterceptor, StubInterceptor,
};
pub use tracing::init_tracing;
