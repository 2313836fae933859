//! A router bound to the path it resolved a request against.

use crate::pattern_cache::PathPatternMatchableRouter;
use crate::scope::AttributeScope;
use archimedes_core::{ExecutionChain, RoutingError, RoutingResult, ServerRequest};
use archimedes_router::{
    LookupPath, MatchableRouter, PathPatternParser, RequestMatchResult, RequestPath, Router,
};
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
enum MatchDelegate {
    Router(Arc<dyn Router>),
    PathPatterns(Arc<PathPatternMatchableRouter>),
}

impl MatchDelegate {
    fn router(&self) -> &dyn Router {
        match self {
            Self::Router(router) => router.as_ref(),
            Self::PathPatterns(wrapper) => wrapper.as_ref(),
        }
    }

    fn matchable(&self) -> RoutingResult<&dyn MatchableRouter> {
        match self {
            Self::Router(router) => router.as_matchable().ok_or_else(|| not_matchable(router.as_ref())),
            Self::PathPatterns(wrapper) => Ok(wrapper.as_ref()),
        }
    }
}

pub(crate) fn not_matchable(router: &dyn Router) -> RoutingError {
    RoutingError::configuration(format!("router '{}' cannot match path patterns", router.name()))
}

/// Matches patterns against one fixed lookup path with the router that
/// resolved it.
///
/// The adapter is immutable and may be cached and shared. Every match
/// temporarily installs the bound path on the request under the attribute its
/// form uses and puts the previous value (or absence) back afterwards.
#[derive(Clone)]
pub struct LookupPathMatchableRouter {
    delegate: MatchDelegate,
    lookup_path: LookupPath,
}

impl LookupPathMatchableRouter {
    /// Binds a router with matching capability to a resolved lookup path.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `router` cannot match patterns.
    pub fn resolved(router: Arc<dyn Router>, lookup_path: Arc<String>) -> RoutingResult<Self> {
        let delegate = MatchDelegate::Router(router);
        delegate.matchable()?;
        Ok(Self {
            delegate,
            lookup_path: LookupPath::Resolved(lookup_path),
        })
    }

    /// Binds a parsed-path router's pattern wrapper to a parsed request path.
    #[must_use]
    pub fn parsed(path_patterns: Arc<PathPatternMatchableRouter>, path: Arc<RequestPath>) -> Self {
        Self {
            delegate: MatchDelegate::PathPatterns(path_patterns),
            lookup_path: LookupPath::Parsed(path),
        }
    }

    /// Returns the bound lookup path.
    #[must_use]
    pub fn lookup_path(&self) -> &LookupPath {
        &self.lookup_path
    }

    /// Returns the router this adapter delegates to.
    #[must_use]
    pub fn router(&self) -> &dyn Router {
        self.delegate.router()
    }

    /// Returns the delegate's pattern parser, if it uses parsed paths.
    #[must_use]
    pub fn pattern_parser(&self) -> Option<&PathPatternParser> {
        self.delegate.matchable().ok().and_then(|matchable| matchable.pattern_parser())
    }

    /// Matches `pattern` against the bound lookup path.
    ///
    /// The pattern is first expanded to its full form (a leading `/` is added
    /// when missing). The request's path attribute is identical before and
    /// after the call, whatever the outcome.
    pub fn match_pattern(
        &self,
        request: &mut dyn ServerRequest,
        pattern: &str,
    ) -> RoutingResult<Option<RequestMatchResult>> {
        let matchable = self.delegate.matchable()?;
        let parser = matchable
            .pattern_parser()
            .unwrap_or(PathPatternParser::default_instance());
        let pattern = parser.init_full_path_pattern(pattern);

        let scope = AttributeScope::replace(
            request,
            self.lookup_path.attribute_name(),
            self.lookup_path.attribute_value(),
        );
        matchable.match_pattern(&*scope, &pattern)
    }

    /// Resolves `request` with the delegate router.
    pub fn resolve(&self, request: &mut dyn ServerRequest) -> RoutingResult<Option<ExecutionChain>> {
        self.delegate.router().resolve(request)
    }
}

impl fmt::Debug for LookupPathMatchableRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupPathMatchableRouter")
            .field("router", &self.router().name())
            .field("lookup_path", &self.lookup_path)
            .finish()
    }
}
