//! Handlers, interceptors and the execution chain a router resolves to.
//!
//! Handlers and interceptors are opaque to introspection. The only thing it
//! ever asks of them is whether they carry a cross-origin policy, which they
//! expose through the optional [`as_cors_source`](Handler::as_cors_source)
//! capability accessor.

use crate::cors::{CorsConfiguration, CorsConfigurationSource};
use crate::error::RoutingResult;
use crate::request::ServerRequest;
use std::fmt;
use std::sync::Arc;

/// The terminal handler of an execution chain.
pub trait Handler: Send + Sync + fmt::Debug {
    /// Returns a name identifying the handler in logs.
    fn name(&self) -> &str;

    /// Returns the handler's cross-origin policy source, if it has one.
    fn as_cors_source(&self) -> Option<&dyn CorsConfigurationSource> {
        None
    }
}

/// A pre/post-processing step attached to an execution chain.
pub trait HandlerInterceptor: Send + Sync + fmt::Debug {
    /// Returns a name identifying the interceptor in logs.
    fn name(&self) -> &str;

    /// Returns the interceptor's cross-origin policy source, if it has one.
    fn as_cors_source(&self) -> Option<&dyn CorsConfigurationSource> {
        None
    }
}

/// A resolved handler plus its ordered interceptors.
///
/// # Example
///
/// ```
/// use archimedes_core::{ExecutionChain, OperationHandler};
/// use std::sync::Arc;
///
/// let chain = ExecutionChain::new(Arc::new(OperationHandler::new("getUser")));
/// assert_eq!(chain.handler().name(), "getUser");
/// assert!(chain.interceptors().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ExecutionChain {
    handler: Arc<dyn Handler>,
    interceptors: Vec<Arc<dyn HandlerInterceptor>>,
}

impl ExecutionChain {
    /// Creates a chain with no interceptors.
    #[must_use]
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self {
            handler,
            interceptors: Vec::new(),
        }
    }

    /// Appends an interceptor.
    #[must_use]
    pub fn with_interceptor(mut self, interceptor: Arc<dyn HandlerInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Appends several interceptors, preserving their order.
    #[must_use]
    pub fn with_interceptors<I>(mut self, interceptors: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn HandlerInterceptor>>,
    {
        self.interceptors.extend(interceptors);
        self
    }

    /// Inserts an interceptor ahead of all others.
    pub fn prepend_interceptor(&mut self, interceptor: Arc<dyn HandlerInterceptor>) {
        self.interceptors.insert(0, interceptor);
    }

    /// Returns the terminal handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Returns the interceptors in execution order.
    #[must_use]
    pub fn interceptors(&self) -> &[Arc<dyn HandlerInterceptor>] {
        &self.interceptors
    }
}

/// A handler identified by its operation ID.
///
/// Optionally carries a route-level cross-origin policy, in which case it
/// exposes the CORS capability.
#[derive(Debug, Clone)]
pub struct OperationHandler {
    operation_id: String,
    cors: Option<Arc<CorsConfiguration>>,
}

impl OperationHandler {
    /// Creates a handler without a cross-origin policy.
    #[must_use]
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            cors: None,
        }
    }

    /// Attaches a cross-origin policy.
    #[must_use]
    pub fn with_cors(mut self, cors: CorsConfiguration) -> Self {
        self.cors = Some(Arc::new(cors));
        self
    }

    /// Returns the operation ID.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }
}

impl Handler for OperationHandler {
    fn name(&self) -> &str {
        &self.operation_id
    }

    fn as_cors_source(&self) -> Option<&dyn CorsConfigurationSource> {
        self.cors.as_ref().map(|_| self as &dyn CorsConfigurationSource)
    }
}

impl CorsConfigurationSource for OperationHandler {
    fn cors_configuration(
        &self,
        _request: &dyn ServerRequest,
    ) -> RoutingResult<Option<Arc<CorsConfiguration>>> {
        Ok(self.cors.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cors::CorsInterceptor;

    #[derive(Debug)]
    struct Named(&'static str);

    impl HandlerInterceptor for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_chain_preserves_interceptor_order() {
        let chain = ExecutionChain::new(Arc::new(OperationHandler::new("op")))
            .with_interceptor(Arc::new(Named("first")))
            .with_interceptors([Arc::new(Named("second")) as Arc<dyn HandlerInterceptor>]);

        let names: Vec<_> = chain.interceptors().iter().map(|i| i.name().to_string()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_prepend_interceptor() {
        let mut chain = ExecutionChain::new(Arc::new(OperationHandler::new("op")))
            .with_interceptor(Arc::new(Named("logging")));
        chain.prepend_interceptor(Arc::new(CorsInterceptor::new(CorsConfiguration::default())));

        assert_eq!(chain.interceptors()[0].name(), "cors");
        assert_eq!(chain.interceptors()[1].name(), "logging");
    }

    #[test]
    fn test_operation_handler_without_cors() {
        let handler = OperationHandler::new("listUsers");
        assert_eq!(handler.name(), "listUsers");
        assert!(handler.as_cors_source().is_none());
    }

    #[test]
    fn test_operation_handler_with_cors() {
        let handler = OperationHandler::new("listUsers")
            .with_cors(CorsConfiguration::builder().allow_origin("https://a.example").build());
        let request = crate::Exchange::new(http::Request::get("/").body(()).unwrap());

        let source = handler.as_cors_source().unwrap();
        let config = source.cors_configuration(&request).unwrap().unwrap();
        assert!(config.allowed_origins().is_allowed("https://a.example"));
    }
}
