//! Cross-origin policy lookup on a resolved execution chain.

use archimedes_core::{CorsConfiguration, ExecutionChain, RoutingResult, ServerRequest};
use std::sync::Arc;

/// Returns the CORS policy `chain` would apply to `request`.
///
/// The first interceptor exposing a CORS source decides, even when it yields
/// no policy. Without one, the handler's source is asked.
pub fn extract_cors(
    chain: &ExecutionChain,
    request: &dyn ServerRequest,
) -> RoutingResult<Option<Arc<CorsConfiguration>>> {
    if let Some(source) = chain.interceptors().iter().find_map(|interceptor| interceptor.as_cors_source()) {
        return source.cors_configuration(request);
    }

    match chain.handler().as_cors_source() {
        Some(source) => source.cors_configuration(request),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archimedes_core::{CorsConfigurationSource, CorsInterceptor, Exchange, HandlerInterceptor, OperationHandler};

    #[derive(Debug)]
    struct Logging;

    impl HandlerInterceptor for Logging {
        fn name(&self) -> &str {
            "logging"
        }
    }

    #[derive(Debug)]
    struct NoPolicy;

    impl HandlerInterceptor for NoPolicy {
        fn name(&self) -> &str {
            "no-policy"
        }

        fn as_cors_source(&self) -> Option<&dyn CorsConfigurationSource> {
            Some(self)
        }
    }

    impl CorsConfigurationSource for NoPolicy {
        fn cors_configuration(&self, _request: &dyn ServerRequest) -> RoutingResult<Option<Arc<CorsConfiguration>>> {
            Ok(None)
        }
    }

    fn policy(origin: &str) -> CorsConfiguration {
        CorsConfiguration::builder().allow_origin(origin).build()
    }

    fn request() -> Exchange {
        Exchange::new(http::Request::get("/").body(()).unwrap())
    }

    #[test]
    fn test_first_cors_interceptor_wins() {
        let chain = ExecutionChain::new(Arc::new(OperationHandler::new("h").with_cors(policy("https://handler.example"))))
            .with_interceptor(Arc::new(Logging))
            .with_interceptor(Arc::new(CorsInterceptor::new(policy("https://first.example"))))
            .with_interceptor(Arc::new(CorsInterceptor::new(policy("https://second.example"))));

        let found = extract_cors(&chain, &request()).unwrap().unwrap();
        assert!(found.allowed_origins().is_allowed("https://first.example"));
        assert!(!found.allowed_origins().is_allowed("https://second.example"));
    }

    #[test]
    fn test_falls_back_to_handler() {
        let chain = ExecutionChain::new(Arc::new(OperationHandler::new("h").with_cors(policy("https://handler.example"))))
            .with_interceptor(Arc::new(Logging));

        let found = extract_cors(&chain, &request()).unwrap().unwrap();
        assert!(found.allowed_origins().is_allowed("https://handler.example"));
    }

    #[test]
    fn test_none_without_sources() {
        let chain = ExecutionChain::new(Arc::new(OperationHandler::new("h"))).with_interceptor(Arc::new(Logging));
        assert!(extract_cors(&chain, &request()).unwrap().is_none());
    }

    #[test]
    fn test_interceptor_without_policy_still_decides() {
        let chain = ExecutionChain::new(Arc::new(OperationHandler::new("h").with_cors(policy("https://handler.example"))))
            .with_interceptor(Arc::new(NoPolicy));

        assert!(extract_cors(&chain, &request()).unwrap().is_none());
    }
}
