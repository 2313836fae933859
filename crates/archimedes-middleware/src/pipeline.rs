//! Ordered middleware pipeline.
//!
//! A [`Pipeline`] runs its stages in the order they were added, then the
//! handler. Each stage sees the request after every earlier stage has
//! touched it, and the response before every earlier stage does.
//!
//! The usual introspection setup puts the cache stage first, so that the CORS
//! stage and the handler both read the cached route:
//!
//! ```text
//! Request → IntrospectionCache → Cors → Handler
//!                                          ↓
//! Response ← (cache restored) ← Cors ←─────┘
//! ```

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable, ordered middleware pipeline.
///
/// # Example
///
/// ```ignore
/// use archimedes_middleware::stages::{CorsMiddleware, IntrospectionCacheMiddleware};
/// use archimedes_middleware::Pipeline;
///
/// let pipeline = Pipeline::builder()
///     .stage(IntrospectionCacheMiddleware::new(introspector.clone()))
///     .stage(CorsMiddleware::new(introspector))
///     .build();
///
/// let response = pipeline.process(&mut request, handler).await;
/// ```
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Processes a request through every stage, then the handler.
    pub async fn process<H>(&self, request: &mut Request, handler: H) -> Response
    where
        H: FnOnce(&mut Request) -> BoxFuture<'static, Response> + Send,
    {
        let next = self.build_chain(handler);
        next.run(request).await
    }

    // Wrapped innermost first, so the first stage added runs first.
    fn build_chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        self.stages
            .iter()
            .rev()
            .fold(Next::handler(handler), |next, stage| Next::new(stage.as_ref(), next))
    }

    /// Returns the names of all middleware stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of middleware stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("stages", &self.stage_names()).finish()
    }
}

/// Builder for constructing a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty pipeline builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage<M: Middleware>(self, middleware: M) -> Self {
        self.shared_stage(Arc::new(middleware))
    }

    /// Appends a stage that is shared with other pipelines.
    #[must_use]
    pub fn shared_stage(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline { stages: self.stages }
    }
}
