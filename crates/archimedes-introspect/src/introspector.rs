//! The introspector: which router, and which CORS policy, would a request get.

use crate::adapter::{not_matchable, LookupPathMatchableRouter};
use crate::cache::{cached_cors, cached_router, set_cache, CacheScope};
use crate::context::RouterContext;
use crate::cors::extract_cors;
use crate::engine;
use crate::isolation::AttributesPreservingRequest;
use crate::registry::{RegisteredRouter, RouterRegistry};
use archimedes_config::IntrospectionConfig;
use archimedes_core::{
    CorsConfiguration, CorsConfigurationSource, ExecutionChain, RoutingError, RoutingResult, ServerRequest,
};
use archimedes_router::path::{require_parsed_path, require_resolved_lookup_path};
use archimedes_router::{Router, LOOKUP_PATH_ATTRIBUTE};
use std::sync::Arc;

/// Finds the router that would handle a request, without dispatching it.
///
/// Routers are discovered once from a [`RouterContext`] by
/// [`initialize`](Self::initialize). Every query runs against an
/// [`AttributesPreservingRequest`], so routers may mark the probe freely while
/// the caller's request is left as it was.
///
/// # Example
///
/// ```rust
/// use archimedes_core::{Exchange, OperationHandler};
/// use archimedes_introspect::{HandlerIntrospector, RouterContext};
/// use archimedes_router::PatternRouter;
/// use std::sync::Arc;
///
/// let mut context = RouterContext::new();
/// context.register_router(
///     "api",
///     Arc::new(
///         PatternRouter::builder("api")
///             .route("/api/**", Arc::new(OperationHandler::new("api")))
///             .build()
///             .unwrap(),
///     ),
/// );
///
/// let introspector = HandlerIntrospector::new(Arc::new(context));
/// introspector.initialize().unwrap();
///
/// let mut request = Exchange::new(http::Request::get("/api/users/5").body(()).unwrap());
/// let router = introspector.matchable_router(&request).unwrap().unwrap();
///
/// assert!(router.match_pattern(&mut request, "/api/users/*").unwrap().is_some());
/// assert!(router.match_pattern(&mut request, "/admin/**").unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct HandlerIntrospector {
    context: Arc<RouterContext>,
    config: IntrospectionConfig,
    registry: RouterRegistry,
}

impl HandlerIntrospector {
    /// Creates an introspector with the default configuration.
    #[must_use]
    pub fn new(context: Arc<RouterContext>) -> Self {
        Self::with_config(context, IntrospectionConfig::default())
    }

    /// Creates an introspector with `config`.
    #[must_use]
    pub fn with_config(context: Arc<RouterContext>, config: IntrospectionConfig) -> Self {
        Self {
            context,
            config,
            registry: RouterRegistry::new(),
        }
    }

    /// Discovers the routers to consult. Safe to call more than once.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the default routers cannot be built.
    pub fn initialize(&self) -> RoutingResult<()> {
        self.registry.initialize(&self.context, &self.config)
    }

    /// Returns true once routers have been discovered.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.registry.is_initialized()
    }

    /// Returns the routers in the order they are consulted.
    #[must_use]
    pub fn routers(&self) -> Vec<Arc<dyn Router>> {
        self.registry.routers()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &IntrospectionConfig {
        &self.config
    }

    /// Returns the router context routers are discovered from.
    #[must_use]
    pub fn context(&self) -> &Arc<RouterContext> {
        &self.context
    }

    /// Returns the first router handling `request`, bound to the path it
    /// resolved.
    ///
    /// A cached adapter is returned as is. Otherwise routers are probed and
    /// any router failure propagates; the fresh adapter is not cached.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the matching router cannot match
    /// patterns, and propagates router and path errors.
    pub fn matchable_router(
        &self,
        request: &dyn ServerRequest,
    ) -> RoutingResult<Option<Arc<LookupPathMatchableRouter>>> {
        if let Some(cached) = cached_router(request) {
            return Ok(Some(cached));
        }

        let mut probe = self.probe(request);
        engine::resolve_with(&self.registry, &mut probe, false, |entry, _chain, probe| {
            bind(entry, probe).map(Arc::new)
        })
    }

    /// Returns the CORS policy the first router handling `request` applies.
    ///
    /// A cached outcome is returned as is. Otherwise routers are probed and
    /// failing routers are skipped.
    ///
    /// # Errors
    ///
    /// Any error surfacing from the lookup is returned as a state error.
    pub fn cors_configuration(&self, request: &dyn ServerRequest) -> RoutingResult<Option<Arc<CorsConfiguration>>> {
        if let Some(cached) = cached_cors(request) {
            return Ok(cached.policy());
        }

        let mut probe = self.probe(request);
        engine::resolve_with(&self.registry, &mut probe, true, |_entry, chain, probe| {
            extract_cors(&chain, probe)
        })
        .map(Option::flatten)
        .map_err(RoutingError::state_from)
    }

    /// Runs the resolution loop over a probe of `request`.
    ///
    /// `extractor` receives the first matching router, its chain and the
    /// probe. With `suppress_router_errors`, failing routers are skipped.
    ///
    /// # Errors
    ///
    /// Returns a state error before initialization and propagates path
    /// errors, extractor errors and unsuppressed router errors.
    pub fn resolve<T, F>(
        &self,
        request: &dyn ServerRequest,
        suppress_router_errors: bool,
        extractor: F,
    ) -> RoutingResult<Option<T>>
    where
        F: FnOnce(&RegisteredRouter, ExecutionChain, &mut dyn ServerRequest) -> RoutingResult<T>,
    {
        let mut probe = self.probe(request);
        engine::resolve_with(&self.registry, &mut probe, suppress_router_errors, extractor)
    }

    /// Resolves `request` once and caches the adapter and CORS policy on it
    /// for the lifetime of the returned scope.
    ///
    /// When no router matches, the cache attributes are left as they were.
    /// Dropping the scope restores both attributes to their prior state.
    ///
    /// # Errors
    ///
    /// Wraps any resolution failure as an introspection error.
    pub fn cache_scope<'r, R: ServerRequest>(&self, request: &'r mut R) -> RoutingResult<CacheScope<'r, R>> {
        let resolved = {
            let mut probe = self.probe(&*request);
            engine::resolve_with(&self.registry, &mut probe, false, |entry, chain, probe| {
                let adapter = bind(entry, probe)?;
                let cors = extract_cors(&chain, probe)?;
                Ok((adapter, cors))
            })
        };

        let resolved = resolved.map_err(|error| {
            tracing::warn!(
                method = %request.method(),
                path = request.uri().path(),
                error = %error,
                "Route introspection failed"
            );
            RoutingError::introspection(error)
        })?;

        let mut scope = CacheScope::new(request);
        if let Some((adapter, cors)) = resolved {
            set_cache(&mut *scope, Arc::new(adapter), cors);
        }
        Ok(scope)
    }

    /// Runs `downstream` with the introspection cache populated, then puts
    /// the previous cache attributes back.
    ///
    /// # Errors
    ///
    /// Returns an introspection error, without calling `downstream`, if
    /// resolution fails.
    pub fn with_cache<R, T, F>(&self, request: &mut R, downstream: F) -> RoutingResult<T>
    where
        R: ServerRequest,
        F: FnOnce(&mut R) -> T,
    {
        let mut scope = self.cache_scope(request)?;
        Ok(downstream(&mut scope))
    }

    /// Only a lookup path resolved by the matching router itself is bound,
    /// so one cached on `request` earlier is hidden from the probe.
    fn probe<'a>(&self, request: &'a dyn ServerRequest) -> AttributesPreservingRequest<'a> {
        let mut probe = AttributesPreservingRequest::new(request, self.config.suppress_probe_logging);
        probe.remove_attribute(LOOKUP_PATH_ATTRIBUTE);
        probe
    }
}

impl CorsConfigurationSource for HandlerIntrospector {
    fn cors_configuration(&self, request: &dyn ServerRequest) -> RoutingResult<Option<Arc<CorsConfiguration>>> {
        HandlerIntrospector::cors_configuration(self, request)
    }
}

/// Binds the matched router to the path it resolved on `probe`.
fn bind(entry: &RegisteredRouter, probe: &dyn ServerRequest) -> RoutingResult<LookupPathMatchableRouter> {
    if let Some(path_patterns) = entry.path_patterns() {
        let path = require_parsed_path(probe)?;
        return Ok(LookupPathMatchableRouter::parsed(Arc::clone(path_patterns), path));
    }

    let router = entry.router();
    if router.as_matchable().is_none() {
        return Err(not_matchable(router.as_ref()));
    }
    let lookup_path = require_resolved_lookup_path(probe)?;
    LookupPathMatchableRouter::resolved(Arc::clone(router), lookup_path)
}
