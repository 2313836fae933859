//! Route-introspection cache stage.
//!
//! Resolves the request once through the [`HandlerIntrospector`] and stores the
//! matched router and its CORS policy as request attributes. Every later stage
//! and the handler then read the cached answer instead of resolving again.
//!
//! The cache is scoped to this stage: the previous attribute values are put
//! back when the downstream chain returns, and also when the request future is
//! dropped before it completes.

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use archimedes_core::ServerRequest;
use archimedes_introspect::HandlerIntrospector;
use std::sync::Arc;

/// Populates the introspection cache for the rest of the chain.
///
/// If resolution fails, the stage answers with the error envelope of the
/// introspection error and the downstream chain is not invoked.
#[derive(Debug, Clone)]
pub struct IntrospectionCacheMiddleware {
    introspector: Arc<HandlerIntrospector>,
}

impl IntrospectionCacheMiddleware {
    /// Creates the stage around an initialized introspector.
    #[must_use]
    pub fn new(introspector: Arc<HandlerIntrospector>) -> Self {
        Self { introspector }
    }

    /// Returns the introspector backing this stage.
    #[must_use]
    pub fn introspector(&self) -> &Arc<HandlerIntrospector> {
        &self.introspector
    }
}

impl Middleware for IntrospectionCacheMiddleware {
    fn name(&self) -> &'static str {
        "introspection_cache"
    }

    fn process<'a>(&'a self, request: &'a mut Request, next: Next<'a>) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let mut scope = match self.introspector.cache_scope(request) {
                Ok(scope) => scope,
                Err(error) => return Response::routing_error(&error),
            };

            tracing::trace!(
                path = scope.uri().path(),
                matched = scope.matchable_router().is_some(),
                "Introspection cache populated"
            );

            next.run(&mut scope).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use archimedes_core::{CorsConfiguration, OperationHandler};
    use archimedes_introspect::cache::{cached_cors, cached_router, CORS_CONFIG_ATTRIBUTE, MATCHABLE_ROUTER_ATTRIBUTE};
    use archimedes_introspect::RouterContext;
    use archimedes_router::{PatternRouter, Router};
    use archimedes_test::{init_tracing, FailingRouter, TestRequest, TestResponse};
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn introspector() -> Arc<HandlerIntrospector> {
        let router = PatternRouter::builder("api")
            .route_with_cors(
                "/api/**",
                Arc::new(OperationHandler::new("api")),
                CorsConfiguration::builder().allow_origin("https://app.example").build(),
            )
            .build()
            .unwrap();
        let mut context = RouterContext::new();
        context.register_router("api", Arc::new(FailingRouter::new(Arc::new(router), "/api/broken")));

        let introspector = HandlerIntrospector::new(Arc::new(context));
        introspector.initialize().unwrap();
        Arc::new(introspector)
    }

    fn respond(status: StatusCode) -> BoxFuture<'static, Response> {
        Box::pin(async move {
            http::Response::builder()
                .status(status)
                .body(Full::new(Bytes::new()))
                .unwrap()
        })
    }

    #[tokio::test]
    async fn test_handler_sees_cached_route() {
        init_tracing();
        let pipeline = Pipeline::builder()
            .stage(IntrospectionCacheMiddleware::new(introspector()))
            .build();
        let mut request = TestRequest::get("/api/users").full_exchange();

        let response = pipeline
            .process(&mut request, |request: &mut Request| {
                let router = cached_router(&*request).expect("route cached");
                let cors = cached_cors(&*request).and_then(|cached| cached.policy());
                assert_eq!(router.router().name(), "api");
                assert!(cors.is_some());
                respond(StatusCode::OK)
            })
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(request.attribute(MATCHABLE_ROUTER_ATTRIBUTE).is_none());
        assert!(request.attribute(CORS_CONFIG_ATTRIBUTE).is_none());
    }

    #[tokio::test]
    async fn test_unmatched_request_passes_through_uncached() {
        let pipeline = Pipeline::builder()
            .stage(IntrospectionCacheMiddleware::new(introspector()))
            .build();
        let mut request = TestRequest::get("/static/app.js").full_exchange();

        let response = pipeline
            .process(&mut request, |request: &mut Request| {
                assert!(cached_router(&*request).is_none());
                respond(StatusCode::NOT_FOUND)
            })
            .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_resolution_failure_short_circuits() {
        init_tracing();
        let pipeline = Pipeline::builder()
            .stage(IntrospectionCacheMiddleware::new(introspector()))
            .build();
        let mut request = TestRequest::get("/api/broken").full_exchange();
        let handler_ran = Arc::new(AtomicBool::new(false));
        let flag = handler_ran.clone();

        let response = pipeline
            .process(&mut request, move |_request: &mut Request| {
                flag.store(true, Ordering::SeqCst);
                respond(StatusCode::OK)
            })
            .await;

        assert!(!handler_ran.load(Ordering::SeqCst));
        let response = TestResponse::from_http(response).await.unwrap();
        response
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
            .assert_error_code("INTROSPECTION_FAILED");
        assert!(request.attribute(MATCHABLE_ROUTER_ATTRIBUTE).is_none());
    }

    struct Stall;

    impl Middleware for Stall {
        fn name(&self) -> &'static str {
            "stall"
        }

        fn process<'a>(&'a self, request: &'a mut Request, _next: Next<'a>) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                assert!(cached_router(&*request).is_some());
                std::future::pending::<Response>().await
            })
        }
    }

    #[tokio::test]
    async fn test_cancelled_request_restores_cache() {
        let pipeline = Pipeline::builder()
            .stage(IntrospectionCacheMiddleware::new(introspector()))
            .stage(Stall)
            .build();
        let mut request = TestRequest::get("/api/users").full_exchange();

        let outcome = tokio::time::timeout(
            Duration::from_millis(20),
            pipeline.process(&mut request, |_request: &mut Request| respond(StatusCode::OK)),
        )
        .await;

        assert!(outcome.is_err());
        assert!(request.attribute(MATCHABLE_ROUTER_ATTRIBUTE).is_none());
        assert!(request.attribute(CORS_CONFIG_ATTRIBUTE).is_none());
    }

    #[test]
    fn test_middleware_name() {
        assert_eq!(IntrospectionCacheMiddleware::new(introspector()).name(), "introspection_cache");
    }
}
