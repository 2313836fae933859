//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that every stage implements.
//! A stage borrows the request mutably for the duration of its call, so it can
//! set request attributes that downstream stages and the handler observe, and
//! put them back once the response is produced.
//!
//! # Example
//!
//! ```
//! use archimedes_core::ServerRequestExt;
//! use archimedes_middleware::{BoxFuture, Middleware, Next, Request, Response};
//!
//! struct TenantMiddleware;
//!
//! impl Middleware for TenantMiddleware {
//!     fn name(&self) -> &'static str {
//!         "tenant"
//!     }
//!
//!     fn process<'a>(&'a self, request: &'a mut Request, next: Next<'a>) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             request.set_typed_attribute("app.tenant", "acme".to_string());
//!             next.run(request).await
//!         })
//!     }
//! }
//! ```

use crate::types::{Request, Response};
use std::future::Future;
use std::pin::Pin;

/// A boxed future that returns a response.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The core middleware trait.
///
/// Middleware receives the request by mutable reference and a [`Next`]
/// callback to invoke the rest of the chain.
///
/// # Invariants
///
/// - Middleware MUST call `next.run()` at most once
/// - Attributes a stage sets for downstream use SHOULD be restored before it returns
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware stage, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request through this middleware.
    fn process<'a>(&'a self, request: &'a mut Request, next: Next<'a>) -> BoxFuture<'a, Response>;
}

/// Callback to invoke the next middleware in the chain.
///
/// Consumed by [`run`](Self::run). A stage that never calls it short-circuits
/// the chain and returns its own response.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(Box<dyn FnOnce(&mut Request) -> BoxFuture<'static, Response> + Send + 'a>),
}

impl<'a> Next<'a> {
    /// Creates a `Next` that invokes `middleware`, then `next`.
    pub fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    ///
    /// The handler sees the request with every upstream attribute in place.
    pub fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Invokes the next middleware or handler in the chain.
    pub async fn run(self, request: &mut Request) -> Response {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(request, *next).await,
            NextInner::Handler(handler) => handler(request).await,
        }
    }
}
