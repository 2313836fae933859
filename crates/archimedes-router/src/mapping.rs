//! Router contracts.

use crate::variables::UriVariables;
use crate::pattern::PathPatternParser;
use archimedes_core::{ExecutionChain, RoutingResult, ServerRequest, ServerRequestExt};
use std::fmt;

/// Order value of routers that should run first.
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// Order value of routers that should run last; the default.
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// Attribute asking routers not to log their per-request mapping decisions.
///
/// Set on probe requests so introspection does not duplicate the router's own
/// logs for the real dispatch.
pub const SUPPRESS_LOGGING_ATTRIBUTE: &str = "archimedes.router.SUPPRESS_LOGGING";

/// A component that resolves requests to execution chains.
///
/// Routers are consulted in ascending [`order`](Router::order); the first one
/// returning a chain handles the request. A router may cache path state on
/// the request (see [`crate::path`]) but must not otherwise mutate it.
pub trait Router: Send + Sync + fmt::Debug {
    /// Returns a name identifying the router in logs and errors.
    fn name(&self) -> &str;

    /// Returns the router's priority; lower runs first.
    fn order(&self) -> i32 {
        LOWEST_PRECEDENCE
    }

    /// Resolves `request`, returning `None` if this router does not handle it.
    ///
    /// A matchable router without a [`pattern_parser`](MatchableRouter::pattern_parser)
    /// must cache the lookup path it resolved with under
    /// [`LOOKUP_PATH_ATTRIBUTE`](crate::LOOKUP_PATH_ATTRIBUTE) before returning
    /// a chain; introspection binds that value and fails with a state error
    /// when it is missing.
    fn resolve(&self, request: &mut dyn ServerRequest) -> RoutingResult<Option<ExecutionChain>>;

    /// Returns the router's pattern matching capability, if it has one.
    fn as_matchable(&self) -> Option<&dyn MatchableRouter> {
        None
    }
}

/// A router able to test arbitrary patterns against a request's path.
pub trait MatchableRouter: Send + Sync {
    /// Returns the parser this router matches with, if it uses parsed paths.
    ///
    /// Routers returning a parser read the path from
    /// [`PARSED_PATH_ATTRIBUTE`](crate::PARSED_PATH_ATTRIBUTE); others read
    /// the lookup path they cached under
    /// [`LOOKUP_PATH_ATTRIBUTE`](crate::LOOKUP_PATH_ATTRIBUTE) during
    /// [`Router::resolve`].
    fn pattern_parser(&self) -> Option<&PathPatternParser> {
        None
    }

    /// Matches `pattern` against the path cached on `request`.
    fn match_pattern(
        &self,
        request: &dyn ServerRequest,
        pattern: &str,
    ) -> RoutingResult<Option<RequestMatchResult>>;
}

/// Returns true if `request` asks routers to stay quiet.
pub fn is_logging_suppressed(request: &dyn ServerRequest) -> bool {
    request
        .typed_attribute::<bool>(SUPPRESS_LOGGING_ATTRIBUTE)
        .is_some_and(|suppressed| *suppressed)
}

/// Outcome of a successful pattern match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMatchResult {
    pattern: String,
    lookup_path: String,
    uri_variables: UriVariables,
}

impl RequestMatchResult {
    /// Creates a match result.
    #[must_use]
    pub fn new(pattern: impl Into<String>, lookup_path: impl Into<String>, uri_variables: UriVariables) -> Self {
        Self {
            pattern: pattern.into(),
            lookup_path: lookup_path.into(),
            uri_variables,
        }
    }

    /// Returns the pattern that matched.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the path the pattern matched.
    #[must_use]
    pub fn lookup_path(&self) -> &str {
        &self.lookup_path
    }

    /// Returns the captured URI template variables.
    #[must_use]
    pub fn uri_variables(&self) -> &UriVariables {
        &self.uri_variables
    }
}
