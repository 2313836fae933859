//! Router and handler fixtures.
//!
//! [`CountingRouter`] records every `resolve` call into a shared
//! [`InvocationLog`], which makes ordering and short-circuit behavior
//! observable. [`FailingRouter`] fails for one path and delegates otherwise.

use archimedes_core::{
    CorsConfiguration, CorsConfigurationSource, ExecutionChain, HandlerInterceptor, OperationHandler, RoutingError,
    RoutingResult, ServerRequest, ServerRequestExt,
};
use archimedes_router::{MatchableRouter, PatternRouter, Router};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared, ordered record of router invocations.
#[derive(Debug, Clone, Default)]
pub struct InvocationLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl InvocationLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a call by `router`.
    pub fn record(&self, router: &str) {
        self.calls.lock().push(router.to_string());
    }

    /// Returns all recorded calls in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Returns how often `router` was called.
    pub fn count(&self, router: &str) -> usize {
        self.calls.lock().iter().filter(|call| *call == router).count()
    }

    /// Forgets all recorded calls.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// Wraps a router and records each `resolve` call.
#[derive(Debug)]
pub struct CountingRouter {
    inner: Arc<dyn Router>,
    log: InvocationLog,
}

impl CountingRouter {
    /// Wraps `inner`, recording into `log`.
    pub fn new(inner: Arc<dyn Router>, log: InvocationLog) -> Self {
        Self { inner, log }
    }

    /// Builds a parsed-path router named `name` with one route per pattern,
    /// each handled by an operation named after the router.
    pub fn patterns(name: &str, order: i32, patterns: &[&str], log: InvocationLog) -> Self {
        let builder = patterns.iter().fold(PatternRouter::builder(name).order(order), |builder, pattern| {
            builder.route(*pattern, Arc::new(OperationHandler::new(name)))
        });
        Self::new(Arc::new(builder.build().expect("valid test patterns")), log)
    }

    /// Like [`patterns`](Self::patterns), resolving against lookup paths.
    pub fn resolved_patterns(name: &str, order: i32, patterns: &[&str], log: InvocationLog) -> Self {
        let builder = patterns.iter().fold(
            PatternRouter::builder(name).order(order).resolved_paths(),
            |builder, pattern| builder.route(*pattern, Arc::new(OperationHandler::new(name))),
        );
        Self::new(Arc::new(builder.build().expect("valid test patterns")), log)
    }
}

impl Router for CountingRouter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn order(&self) -> i32 {
        self.inner.order()
    }

    fn resolve(&self, request: &mut dyn ServerRequest) -> RoutingResult<Option<ExecutionChain>> {
        self.log.record(self.inner.name());
        self.inner.resolve(request)
    }

    fn as_matchable(&self) -> Option<&dyn MatchableRouter> {
        self.inner.as_matchable()
    }
}

/// Fails with a resolution error for one path, delegating otherwise.
#[derive(Debug)]
pub struct FailingRouter {
    inner: Arc<dyn Router>,
    failing_path: String,
}

impl FailingRouter {
    /// Wraps `inner`, failing whenever the request path is `failing_path`.
    pub fn new(inner: Arc<dyn Router>, failing_path: impl Into<String>) -> Self {
        Self {
            inner,
            failing_path: failing_path.into(),
        }
    }
}

impl Router for FailingRouter {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn order(&self) -> i32 {
        self.inner.order()
    }

    fn resolve(&self, request: &mut dyn ServerRequest) -> RoutingResult<Option<ExecutionChain>> {
        if request.path() == self.failing_path {
            return Err(RoutingError::resolution(
                self.inner.name(),
                format!("backend unavailable for '{}'", self.failing_path),
            ));
        }
        self.inner.resolve(request)
    }

    fn as_matchable(&self) -> Option<&dyn MatchableRouter> {
        self.inner.as_matchable()
    }
}

/// An interceptor without CORS capability.
#[derive(Debug, Clone)]
pub struct StubInterceptor {
    name: String,
}

impl StubInterceptor {
    /// Creates an interceptor named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl HandlerInterceptor for StubInterceptor {
    fn name(&self) -> &str {
        &self.name
    }
}

/// An interceptor exposing CORS capability with a fixed answer, possibly none.
#[derive(Debug, Clone)]
pub struct StubCorsInterceptor {
    policy: Option<Arc<CorsConfiguration>>,
}

impl StubCorsInterceptor {
    /// Creates an interceptor answering `policy`.
    pub fn new(policy: Option<CorsConfiguration>) -> Self {
        Self {
            policy: policy.map(Arc::new),
        }
    }
}

impl HandlerInterceptor for StubCorsInterceptor {
    fn name(&self) -> &str {
        "stub-cors"
    }

    fn as_cors_source(&self) -> Option<&dyn CorsConfigurationSource> {
        Some(self)
    }
}

impl CorsConfigurationSource for StubCorsInterceptor {
    fn cors_configuration(&self, _request: &dyn ServerRequest) -> RoutingResult<Option<Arc<CorsConfiguration>>> {
        Ok(self.policy.clone())
    }
}

/// A router returning one fixed chain for every request.
///
/// It has no pattern matching capability.
#[derive(Debug)]
pub struct ChainRouter {
    name: String,
    order: i32,
    chain: ExecutionChain,
}

impl ChainRouter {
    /// Creates a router named `name` always answering `chain`.
    pub fn new(name: impl Into<String>, order: i32, chain: ExecutionChain) -> Self {
        Self {
            name: name.into(),
            order,
            chain,
        }
    }
}

impl Router for ChainRouter {
    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn resolve(&self, _request: &mut dyn ServerRequest) -> RoutingResult<Option<ExecutionChain>> {
        Ok(Some(self.chain.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestRequest;
    use archimedes_router::path::parse_and_cache;

    #[test]
    fn test_counting_router_records_calls() {
        let log = InvocationLog::new();
        let router = CountingRouter::resolved_patterns("a", 0, &["/a/**"], log.clone());
        let mut request = TestRequest::get("/a/1").exchange();

        assert!(router.resolve(&mut request).unwrap().is_some());
        assert!(router.resolve(&mut request).unwrap().is_some());

        assert_eq!(log.count("a"), 2);
        assert_eq!(log.calls(), vec!["a", "a"]);
        log.clear();
        assert!(log.calls().is_empty());
    }

    #[test]
    fn test_counting_router_keeps_capability() {
        let router = CountingRouter::patterns("p", 3, &["/p"], InvocationLog::new());
        assert_eq!(router.order(), 3);
        assert!(router.as_matchable().unwrap().pattern_parser().is_some());
    }

    #[test]
    fn test_failing_router_fails_only_for_its_path() {
        let inner = CountingRouter::patterns("inner", 0, &["/**"], InvocationLog::new());
        let router = FailingRouter::new(Arc::new(inner), "/broken");

        let mut broken = TestRequest::get("/broken").exchange();
        assert!(matches!(router.resolve(&mut broken), Err(RoutingError::Resolution { .. })));

        let mut fine = TestRequest::get("/fine").exchange();
        parse_and_cache(&mut fine).unwrap();
        assert!(router.resolve(&mut fine).unwrap().is_some());
    }

    #[test]
    fn test_stub_cors_interceptor() {
        let request = TestRequest::get("/").exchange();
        let interceptor = StubCorsInterceptor::new(None);
        let source = interceptor.as_cors_source().unwrap();
        assert!(source.cors_configuration(&request).unwrap().is_none());
        assert!(StubInterceptor::new("audit").as_cors_source().is_none());
    }

    #[test]
    fn test_chain_router_always_answers() {
        let chain = ExecutionChain::new(Arc::new(OperationHandler::new("fixed")));
        let router = ChainRouter::new("fixed", 0, chain);
        let mut request = TestRequest::get("/anything").exchange();

        assert_eq!(router.resolve(&mut request).unwrap().unwrap().handler().name(), "fixed");
        assert!(router.as_matchable().is_none());
    }
}
