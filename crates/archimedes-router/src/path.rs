//! Request paths as routers see them.
//!
//! Routers work on one of two path forms, each cached on the request under its
//! own attribute:
//!
//! - a [`RequestPath`], parsed once per request and stored under
//!   [`PARSED_PATH_ATTRIBUTE`], used by routers that match with a
//!   [`PathPatternParser`](crate::PathPatternParser);
//! - a resolved lookup path string, stored under [`LOOKUP_PATH_ATTRIBUTE`],
//!   used by routers that match against a normalized path.
//!
//! [`LookupPath`] carries either form together with its attribute key.

use archimedes_core::{AttributeValue, RoutingError, RoutingResult, ServerRequest, ServerRequestExt};
use std::fmt;
use std::sync::Arc;

/// Attribute holding the resolved lookup path (`String`).
pub const LOOKUP_PATH_ATTRIBUTE: &str = "archimedes.router.LOOKUP_PATH";

/// Attribute holding the parsed [`RequestPath`].
pub const PARSED_PATH_ATTRIBUTE: &str = "archimedes.router.PARSED_PATH";

/// A request path split into context path and path within the application.
///
/// # Example
///
/// ```rust
/// use archimedes_router::RequestPath;
///
/// let path = RequestPath::parse("/app/users/7", "/app").unwrap();
/// assert_eq!(path.context_path(), "/app");
/// assert_eq!(path.path_within_application(), "/users/7");
///
/// assert!(RequestPath::parse("/application/users", "/app").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    value: String,
    context_len: usize,
}

impl RequestPath {
    /// Parses `path` under `context_path`.
    ///
    /// The context path must be empty, or start with `/`, not end with `/`,
    /// and prefix `path` on a segment boundary.
    pub fn parse(path: &str, context_path: &str) -> RoutingResult<Self> {
        if !path.starts_with('/') {
            return Err(RoutingError::invalid_path(path, "path must start with '/'"));
        }
        if !context_path.is_empty() {
            if !context_path.starts_with('/') {
                return Err(RoutingError::invalid_path(
                    path,
                    format!("context path '{context_path}' must start with '/'"),
                ));
            }
            if context_path.ends_with('/') {
                return Err(RoutingError::invalid_path(
                    path,
                    format!("context path '{context_path}' must not end with '/'"),
                ));
            }
            let on_boundary = path
                .strip_prefix(context_path)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
            if !on_boundary {
                return Err(RoutingError::invalid_path(
                    path,
                    format!("context path '{context_path}' does not prefix the request path"),
                ));
            }
        }

        Ok(Self {
            value: path.to_string(),
            context_len: context_path.len(),
        })
    }

    /// Returns the full request path.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the context path, empty when mounted at the root.
    #[must_use]
    pub fn context_path(&self) -> &str {
        &self.value[..self.context_len]
    }

    /// Returns the path after the context path.
    #[must_use]
    pub fn path_within_application(&self) -> &str {
        &self.value[self.context_len..]
    }
}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Parses the request path and caches it under [`PARSED_PATH_ATTRIBUTE`].
pub fn parse_and_cache(request: &mut dyn ServerRequest) -> RoutingResult<Arc<RequestPath>> {
    let parsed = Arc::new(RequestPath::parse(request.uri().path(), request.context_path())?);
    request.set_attribute(PARSED_PATH_ATTRIBUTE, Arc::clone(&parsed) as AttributeValue);
    Ok(parsed)
}

/// Returns the cached parsed path, if any.
pub fn parsed_path(request: &dyn ServerRequest) -> Option<Arc<RequestPath>> {
    request.typed_attribute::<RequestPath>(PARSED_PATH_ATTRIBUTE)
}

/// Returns the cached parsed path, or a state error if it was never parsed.
pub fn require_parsed_path(request: &dyn ServerRequest) -> RoutingResult<Arc<RequestPath>> {
    parsed_path(request).ok_or_else(|| {
        RoutingError::illegal_state(format!(
            "expected a parsed request path in attribute '{PARSED_PATH_ATTRIBUTE}'"
        ))
    })
}

/// Caches `path` as the parsed path, or removes the attribute when `None`.
pub fn set_parsed_path(request: &mut dyn ServerRequest, path: Option<Arc<RequestPath>>) {
    request.restore_attribute(PARSED_PATH_ATTRIBUTE, path.map(|p| p as AttributeValue));
}

/// Computes the lookup path of a request without caching it.
///
/// Strips the context path, drops `;` path parameters and collapses repeated
/// separators. An empty result becomes `/`.
pub fn resolve_lookup_path(request: &dyn ServerRequest) -> RoutingResult<String> {
    let parsed = RequestPath::parse(request.uri().path(), request.context_path())?;
    Ok(normalize_lookup_path(parsed.path_within_application()))
}

/// Resolves the lookup path and caches it under [`LOOKUP_PATH_ATTRIBUTE`].
pub fn resolve_and_cache_lookup_path(request: &mut dyn ServerRequest) -> RoutingResult<Arc<String>> {
    let lookup = Arc::new(resolve_lookup_path(request)?);
    request.set_attribute(LOOKUP_PATH_ATTRIBUTE, Arc::clone(&lookup) as AttributeValue);
    Ok(lookup)
}

/// Returns the cached lookup path, if any.
pub fn resolved_lookup_path(request: &dyn ServerRequest) -> Option<Arc<String>> {
    request.typed_attribute::<String>(LOOKUP_PATH_ATTRIBUTE)
}

/// Returns the cached lookup path, or a state error if it was never resolved.
pub fn require_resolved_lookup_path(request: &dyn ServerRequest) -> RoutingResult<Arc<String>> {
    resolved_lookup_path(request).ok_or_else(|| {
        RoutingError::illegal_state(format!(
            "expected a resolved lookup path in attribute '{LOOKUP_PATH_ATTRIBUTE}'"
        ))
    })
}

fn normalize_lookup_path(path: &str) -> String {
    let trailing = path.len() > 1 && path.ends_with('/');
    let mut normalized = String::with_capacity(path.len());

    for segment in path.split('/') {
        let segment = segment.split(';').next().unwrap_or_default();
        if segment.is_empty() {
            continue;
        }
        normalized.push('/');
        normalized.push_str(segment);
    }

    if normalized.is_empty() {
        return "/".to_string();
    }
    if trailing {
        normalized.push('/');
    }
    normalized
}

/// A path value a router resolved against, in either form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupPath {
    /// A resolved lookup path string.
    Resolved(Arc<String>),
    /// A parsed request path.
    Parsed(Arc<RequestPath>),
}

impl LookupPath {
    /// Returns the request attribute this form is cached under.
    #[must_use]
    pub fn attribute_name(&self) -> &'static str {
        match self {
            Self::Resolved(_) => LOOKUP_PATH_ATTRIBUTE,
            Self::Parsed(_) => PARSED_PATH_ATTRIBUTE,
        }
    }

    /// Returns the value to store under [`attribute_name`](Self::attribute_name).
    #[must_use]
    pub fn attribute_value(&self) -> AttributeValue {
        match self {
            Self::Resolved(path) => Arc::clone(path) as AttributeValue,
            Self::Parsed(path) => Arc::clone(path) as AttributeValue,
        }
    }

    /// Returns the path patterns are matched against.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Resolved(path) => path.as_str(),
            Self::Parsed(path) => path.path_within_application(),
        }
    }
}

impl fmt::Display for LookupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
