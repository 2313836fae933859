//! A router backed by an ordered table of path patterns.

use crate::mapping::{is_logging_suppressed, MatchableRouter, RequestMatchResult, Router, LOWEST_PRECEDENCE};
use crate::path::{require_parsed_path, require_resolved_lookup_path, resolve_and_cache_lookup_path};
use crate::pattern::{PathPattern, PathPatternParser};
use archimedes_core::{
    CorsConfiguration, CorsInterceptor, ExecutionChain, Handler, HandlerInterceptor, RoutingResult,
    ServerRequest,
};
use std::sync::Arc;

/// Which path form a [`PatternRouter`] matches against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMode {
    /// Match the parsed request path with the given parser.
    ///
    /// The path must already be parsed and cached on the request.
    Parsed(PathPatternParser),
    /// Resolve, cache and match the normalized lookup path.
    Resolved,
}

impl PathMode {
    fn parser(&self) -> &PathPatternParser {
        match self {
            Self::Parsed(parser) => parser,
            Self::Resolved => PathPatternParser::default_instance(),
        }
    }
}

#[derive(Debug)]
struct Route {
    pattern: PathPattern,
    handler: Arc<dyn Handler>,
    cors: Option<Arc<CorsConfiguration>>,
}

/// Router matching requests against patterns in registration order.
///
/// The first route whose pattern matches wins. Routes declaring a CORS policy
/// get a [`CorsInterceptor`] in front of the router's own interceptors.
///
/// # Example
///
/// ```rust
/// use archimedes_core::{Exchange, OperationHandler};
/// use archimedes_router::{PatternRouter, Router};
/// use std::sync::Arc;
///
/// let router = PatternRouter::builder("api")
///     .resolved_paths()
///     .route("/users/{id}", Arc::new(OperationHandler::new("getUser")))
///     .build()
///     .unwrap();
///
/// let mut request = Exchange::new(http::Request::get("/users/7").body(()).unwrap());
/// let chain = router.resolve(&mut request).unwrap().unwrap();
/// assert_eq!(chain.handler().name(), "getUser");
/// ```
#[derive(Debug)]
pub struct PatternRouter {
    name: String,
    order: i32,
    mode: PathMode,
    routes: Vec<Route>,
    interceptors: Vec<Arc<dyn HandlerInterceptor>>,
}

impl PatternRouter {
    /// Starts building a router named `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> PatternRouterBuilder {
        PatternRouterBuilder::new(name)
    }

    /// Returns the path mode.
    #[must_use]
    pub fn mode(&self) -> &PathMode {
        &self.mode
    }

    /// Returns the route patterns in matching order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|route| route.pattern.as_str())
    }

    /// Returns the path this router matches `request` against, caching it if needed.
    fn lookup_path(&self, request: &mut dyn ServerRequest) -> RoutingResult<String> {
        match &self.mode {
            PathMode::Parsed(_) => Ok(require_parsed_path(request)?.path_within_application().to_string()),
            PathMode::Resolved => Ok(resolve_and_cache_lookup_path(request)?.as_str().to_string()),
        }
    }
}

impl Router for PatternRouter {
    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn resolve(&self, request: &mut dyn ServerRequest) -> RoutingResult<Option<ExecutionChain>> {
        let lookup = self.lookup_path(request)?;
        let quiet = is_logging_suppressed(request);

        let Some(route) = self.routes.iter().find(|route| route.pattern.matches(&lookup)) else {
            if !quiet {
                tracing::trace!(router = %self.name, path = %lookup, "No route matched");
            }
            return Ok(None);
        };

        let mut chain =
            ExecutionChain::new(Arc::clone(&route.handler)).with_interceptors(self.interceptors.iter().cloned());
        if let Some(cors) = &route.cors {
            chain.prepend_interceptor(Arc::new(CorsInterceptor::shared(Arc::clone(cors))));
        }

        if !quiet {
            tracing::debug!(
                router = %self.name,
                path = %lookup,
                pattern = %route.pattern,
                handler = route.handler.name(),
                "Mapped request"
            );
        }
        Ok(Some(chain))
    }

    fn as_matchable(&self) -> Option<&dyn MatchableRouter> {
        Some(self)
    }
}

impl MatchableRouter for PatternRouter {
    fn pattern_parser(&self) -> Option<&PathPatternParser> {
        match &self.mode {
            PathMode::Parsed(parser) => Some(parser),
            PathMode::Resolved => None,
        }
    }

    fn match_pattern(
        &self,
        request: &dyn ServerRequest,
        pattern: &str,
    ) -> RoutingResult<Option<RequestMatchResult>> {
        let lookup = match &self.mode {
            PathMode::Parsed(_) => require_parsed_path(request)?.path_within_application().to_string(),
            PathMode::Resolved => require_resolved_lookup_path(request)?.as_str().to_string(),
        };
        let pattern = self.mode.parser().parse(pattern)?;

        Ok(pattern
            .match_and_extract(&lookup)
            .map(|variables| RequestMatchResult::new(pattern.as_str(), lookup.as_str(), variables)))
    }
}

/// Builder for [`PatternRouter`].
#[derive(Debug)]
pub struct PatternRouterBuilder {
    name: String,
    order: i32,
    mode: PathMode,
    routes: Vec<(String, Arc<dyn Handler>, Option<CorsConfiguration>)>,
    interceptors: Vec<Arc<dyn HandlerInterceptor>>,
}

impl PatternRouterBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: LOWEST_PRECEDENCE,
            mode: PathMode::Parsed(PathPatternParser::new()),
            routes: Vec::new(),
            interceptors: Vec::new(),
        }
    }

    /// Sets the router's priority.
    #[must_use]
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Matches parsed request paths with `parser`. This is the default mode.
    #[must_use]
    pub fn parsed_paths(mut self, parser: PathPatternParser) -> Self {
        self.mode = PathMode::Parsed(parser);
        self
    }

    /// Matches resolved lookup paths.
    #[must_use]
    pub fn resolved_paths(mut self) -> Self {
        self.mode = PathMode::Resolved;
        self
    }

    /// Adds a route.
    #[must_use]
    pub fn route(mut self, pattern: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.routes.push((pattern.into(), handler, None));
        self
    }

    /// Adds a route carrying a CORS policy.
    #[must_use]
    pub fn route_with_cors(
        mut self,
        pattern: impl Into<String>,
        handler: Arc<dyn Handler>,
        cors: CorsConfiguration,
    ) -> Self {
        self.routes.push((pattern.into(), handler, Some(cors)));
        self
    }

    /// Adds an interceptor applied to every route.
    #[must_use]
    pub fn interceptor(mut self, interceptor: Arc<dyn HandlerInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Parses the route patterns and builds the router.
    pub fn build(self) -> RoutingResult<PatternRouter> {
        let parser = *self.mode.parser();
        let routes = self
            .routes
            .into_iter()
            .map(|(pattern, handler, cors)| {
                let pattern = parser.parse(&parser.init_full_path_pattern(&pattern))?;
                Ok(Route {
                    pattern,
                    handler,
                    cors: cors.map(Arc::new),
                })
            })
            .collect::<RoutingResult<Vec<_>>>()?;

        Ok(PatternRouter {
            name: self.name,
            order: self.order,
            mode: self.mode,
            routes,
            interceptors: self.interceptors,
        })
    }
}
