//! The resolution loop shared by every introspection query.

use crate::registry::{RegisteredRouter, RouterRegistry};
use crate::scope::AttributeScope;
use archimedes_core::{ExecutionChain, RoutingResult, ServerRequest};
use archimedes_router::path::{parse_and_cache, PARSED_PATH_ATTRIBUTE};

/// Asks each registered router in turn for a chain and hands the first one to
/// `extractor`.
///
/// When any router resolves against parsed paths, the request path is parsed
/// and cached first; a parse failure propagates. The parsed-path attribute is
/// restored before returning on every path. With `suppress_router_errors`, a
/// router failure counts as "no match" and the next router is consulted.
pub(crate) fn resolve_with<T, F>(
    registry: &RouterRegistry,
    request: &mut dyn ServerRequest,
    suppress_router_errors: bool,
    extractor: F,
) -> RoutingResult<Option<T>>
where
    F: FnOnce(&RegisteredRouter, ExecutionChain, &mut dyn ServerRequest) -> RoutingResult<T>,
{
    let entries = registry.entries()?;
    let mut scope = AttributeScope::save(request, PARSED_PATH_ATTRIBUTE);

    if entries.iter().any(RegisteredRouter::uses_parsed_path) {
        parse_and_cache(&mut *scope)?;
    }

    for entry in entries {
        match entry.router().resolve(&mut *scope) {
            Ok(Some(chain)) => return extractor(entry, chain, &mut *scope).map(Some),
            Ok(None) => {}
            Err(error) if suppress_router_errors => {
                tracing::debug!(
                    router = entry.router().name(),
                    error = %error,
                    "Ignoring router failure during introspection"
                );
            }
            Err(error) => return Err(error),
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RouterContext;
    use archimedes_config::IntrospectionConfig;
    use archimedes_core::{Exchange, OperationHandler, RoutingError, ServerRequestExt};
    use archimedes_router::path::RequestPath;
    use archimedes_router::{PatternRouter, Router};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Broken;

    impl Router for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn order(&self) -> i32 {
            0
        }

        fn resolve(&self, _request: &mut dyn ServerRequest) -> RoutingResult<Option<ExecutionChain>> {
            Err(RoutingError::resolution("broken", "always fails"))
        }
    }

    fn registry(routers: Vec<(&str, Arc<dyn Router>)>) -> RouterRegistry {
        let mut context = RouterContext::new();
        for (name, router) in routers {
            context.register_router(name, router);
        }
        let registry = RouterRegistry::new();
        registry.initialize(&context, &IntrospectionConfig::default()).unwrap();
        registry
    }

    fn catch_all() -> Arc<dyn Router> {
        Arc::new(
            PatternRouter::builder("catch-all")
                .route("/**", Arc::new(OperationHandler::new("fallback")))
                .build()
                .unwrap(),
        )
    }

    fn exchange(path: &str) -> Exchange {
        Exchange::new(http::Request::get(path).body(()).unwrap())
    }

    fn handler_name(entry: &RegisteredRouter, chain: ExecutionChain, _: &mut dyn ServerRequest) -> RoutingResult<String> {
        Ok(format!("{}:{}", entry.router().name(), chain.handler().name()))
    }

    #[test]
    fn test_uninitialized_registry_is_state_error() {
        let mut request = exchange("/");
        let error = resolve_with(&RouterRegistry::new(), &mut request, true, handler_name).unwrap_err();
        assert!(matches!(error, RoutingError::IllegalState { .. }));
    }

    #[test]
    fn test_first_chain_goes_to_extractor() {
        let registry = registry(vec![("catch-all", catch_all())]);
        let mut request = exchange("/anything");

        let found = resolve_with(&registry, &mut request, false, handler_name).unwrap();
        assert_eq!(found.as_deref(), Some("catch-all:fallback"));
    }

    #[test]
    fn test_no_match_is_none() {
        let empty: Arc<dyn Router> = Arc::new(PatternRouter::builder("empty").build().unwrap());
        let registry = registry(vec![("empty", empty)]);
        let mut request = exchange("/anything");

        assert!(resolve_with(&registry, &mut request, false, handler_name).unwrap().is_none());
    }

    #[test]
    fn test_router_errors_propagate_unless_suppressed() {
        let registry = registry(vec![("broken", Arc::new(Broken)), ("catch-all", catch_all())]);
        let mut request = exchange("/anything");

        let error = resolve_with(&registry, &mut request, false, handler_name).unwrap_err();
        assert!(matches!(error, RoutingError::Resolution { .. }));

        let found = resolve_with(&registry, &mut request, true, handler_name).unwrap();
        assert_eq!(found.as_deref(), Some("catch-all:fallback"));
    }

    #[test]
    fn test_parsed_path_visible_to_extractor_then_restored() {
        let registry = registry(vec![("catch-all", catch_all())]);
        let mut request = exchange("/api/users");

        let seen = resolve_with(&registry, &mut request, false, |_, _, request| {
            Ok(archimedes_router::path::parsed_path(request).map(|path| path.value().to_string()))
        })
        .unwrap();

        assert_eq!(seen, Some(Some("/api/users".to_string())));
        assert!(request.attribute(PARSED_PATH_ATTRIBUTE).is_none());
    }

    #[test]
    fn test_previous_parsed_path_restored_after_error() {
        let registry = registry(vec![("broken", Arc::new(Broken)), ("catch-all", catch_all())]);
        let mut request = exchange("/api/users");
        let previous = Arc::new(RequestPath::parse("/earlier", "").unwrap());
        request.set_attribute(PARSED_PATH_ATTRIBUTE, Arc::clone(&previous) as archimedes_core::AttributeValue);

        assert!(resolve_with(&registry, &mut request, false, handler_name).is_err());

        let after = request.typed_attribute::<RequestPath>(PARSED_PATH_ATTRIBUTE).unwrap();
        assert!(Arc::ptr_eq(&previous, &after));
    }

    #[test]
    fn test_invalid_request_path_propagates_even_when_suppressed() {
        let registry = registry(vec![("catch-all", catch_all())]);
        let mut request = exchange("/api/users").with_context_path("/shop");

        let error = resolve_with(&registry, &mut request, true, handler_name).unwrap_err();
        assert!(matches!(error, RoutingError::InvalidPath { .. }));
    }
}
