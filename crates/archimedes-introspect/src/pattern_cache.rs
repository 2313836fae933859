//! Pattern matching for routers that resolve against parsed paths.

use archimedes_core::{ExecutionChain, RoutingError, RoutingResult, ServerRequest};
use archimedes_router::path::require_parsed_path;
use archimedes_router::{MatchableRouter, PathPattern, PathPatternParser, RequestMatchResult, Router};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Wraps a parsed-path router and matches patterns with its parser.
///
/// Each distinct pattern is parsed once and kept, up to `limit` entries.
/// Once the cache is full, patterns already cached keep matching and new ones
/// are rejected with a state error.
pub struct PathPatternMatchableRouter {
    router: Arc<dyn Router>,
    parser: PathPatternParser,
    patterns: RwLock<HashMap<String, Arc<PathPattern>>>,
    limit: usize,
}

impl PathPatternMatchableRouter {
    /// Wraps `router` if it is matchable and declares a pattern parser.
    pub fn wrap(router: Arc<dyn Router>, limit: usize) -> Option<Self> {
        let parser = *router.as_matchable()?.pattern_parser()?;
        Some(Self {
            router,
            parser,
            patterns: RwLock::new(HashMap::new()),
            limit,
        })
    }

    /// Returns the wrapped router.
    #[must_use]
    pub fn router(&self) -> &Arc<dyn Router> {
        &self.router
    }

    /// Returns the number of cached patterns.
    #[must_use]
    pub fn cached_patterns(&self) -> usize {
        self.patterns.read().len()
    }

    fn pattern(&self, pattern: &str) -> RoutingResult<Arc<PathPattern>> {
        if let Some(parsed) = self.patterns.read().get(pattern) {
            return Ok(Arc::clone(parsed));
        }

        let mut patterns = self.patterns.write();
        if let Some(parsed) = patterns.get(pattern) {
            return Ok(Arc::clone(parsed));
        }
        if patterns.len() >= self.limit {
            return Err(RoutingError::illegal_state(format!(
                "pattern cache of router '{}' is full ({} entries); cannot cache '{pattern}'",
                self.router.name(),
                self.limit
            )));
        }

        let parsed = Arc::new(self.parser.parse(pattern)?);
        patterns.insert(pattern.to_string(), Arc::clone(&parsed));
        Ok(parsed)
    }
}

impl Router for PathPatternMatchableRouter {
    fn name(&self) -> &str {
        self.router.name()
    }

    fn order(&self) -> i32 {
        self.router.order()
    }

    fn resolve(&self, request: &mut dyn ServerRequest) -> RoutingResult<Option<ExecutionChain>> {
        self.router.resolve(request)
    }

    fn as_matchable(&self) -> Option<&dyn MatchableRouter> {
        Some(self)
    }
}

impl MatchableRouter for PathPatternMatchableRouter {
    fn pattern_parser(&self) -> Option<&PathPatternParser> {
        Some(&self.parser)
    }

    fn match_pattern(
        &self,
        request: &dyn ServerRequest,
        pattern: &str,
    ) -> RoutingResult<Option<RequestMatchResult>> {
        let path = require_parsed_path(request)?;
        let lookup = path.path_within_application();
        let pattern = self.pattern(pattern)?;

        Ok(pattern
            .match_and_extract(lookup)
            .map(|variables| RequestMatchResult::new(pattern.as_str(), lookup, variables)))
    }
}

impl fmt::Debug for PathPatternMatchableRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathPatternMatchableRouter")
            .field("router", &self.router.name())
            .field("parser", &self.parser)
            .field("cached_patterns", &self.cached_patterns())
            .field("limit", &self.limit)
            .finish()
    }
}
