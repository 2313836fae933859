//! Error types for routing and introspection.
//!
//! This module provides [`RoutingError`], the error type shared by routers,
//! the router registry and the introspector, classified by [`ErrorCategory`].
//!
//! | Category | Raised when | Status |
//! |---|---|---|
//! | `Configuration` | a router setup is unusable (default routers, missing capability) | 500 |
//! | `State` | an operation runs in a state it cannot handle | 500 |
//! | `Resolution` | a router fails while resolving a request | 500 |
//! | `InvalidRequest` | a request path or a pattern cannot be parsed | 400 |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`RoutingError`].
pub type RoutingResult<T> = Result<T, RoutingError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Unusable router configuration.
    Configuration,
    /// Operation invoked in an invalid state.
    State,
    /// Router failure while resolving a request.
    Resolution,
    /// Malformed request path or pattern.
    InvalidRequest,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Configuration | Self::State | Self::Resolution => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
        }
    }
}

/// Standard error type for routing and introspection.
///
/// # Example
///
/// ```
/// use archimedes_core::{ErrorCategory, RoutingError};
///
/// let error = RoutingError::resolution("api", "backend table unavailable");
/// assert_eq!(error.category(), ErrorCategory::Resolution);
/// assert!(error.to_string().contains("api"));
/// ```
#[derive(Error, Debug)]
pub enum RoutingError {
    /// A router failed while resolving a request.
    #[error("router '{router}' failed to resolve request: {message}")]
    Resolution {
        /// Name of the failing router.
        router: String,
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The request path could not be parsed.
    #[error("invalid request path '{path}': {reason}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A path pattern could not be parsed.
    #[error("invalid path pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An operation ran in a state it cannot handle.
    #[error("illegal state: {message}")]
    IllegalState {
        /// Human-readable error message.
        message: String,
        /// The error that led to this state, if any.
        #[source]
        source: Option<Box<RoutingError>>,
    },

    /// Router configuration is unusable.
    #[error("configuration error: {message}")]
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// Route introspection failed before downstream processing could run.
    #[error("route introspection failed: {source}")]
    Introspection {
        /// The introspection error.
        #[source]
        source: Box<RoutingError>,
    },
}

impl RoutingError {
    /// Creates a resolution error for a router.
    #[must_use]
    pub fn resolution(router: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            router: router.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a resolution error with an underlying cause.
    pub fn resolution_with_source(
        router: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Resolution {
            router: router.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates an invalid path error.
    #[must_use]
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid pattern error.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Creates an illegal state error.
    #[must_use]
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps another error as an illegal state, keeping it as the source.
    #[must_use]
    pub fn state_from(source: RoutingError) -> Self {
        Self::IllegalState {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Wraps an error raised while introspecting ahead of downstream processing.
    #[must_use]
    pub fn introspection(source: RoutingError) -> Self {
        Self::Introspection {
            source: Box::new(source),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Resolution { .. } => ErrorCategory::Resolution,
            Self::InvalidPath { .. } | Self::InvalidPattern { .. } => ErrorCategory::InvalidRequest,
            Self::IllegalState { .. } => ErrorCategory::State,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Introspection { source } => source.category(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Converts this error to a serializable error envelope.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
            },
        }
    }

    /// Returns a machine-readable error code.
    fn error_code(&self) -> &'static str {
        match self {
            Self::Resolution { .. } => "ROUTER_RESOLUTION_FAILED",
            Self::InvalidPath { .. } => "INVALID_PATH",
            Self::InvalidPattern { .. } => "INVALID_PATTERN",
            Self::IllegalState { .. } => "ILLEGAL_STATE",
            Self::Configuration { .. } => "ROUTER_CONFIGURATION",
            Self::Introspection { .. } => "INTROSPECTION_FAILED",
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_resolution_error() {
        let error = RoutingError::resolution("legacy", "table locked");
        assert_eq!(error.category(), ErrorCategory::Resolution);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error.to_string().contains("legacy"));
        assert!(error.to_string().contains("table locked"));
    }

    #[test]
    fn test_resolution_error_keeps_source() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let error = RoutingError::resolution_with_source("files", "lookup failed", cause);
        assert!(error.source().is_some());
    }

    #[test]
    fn test_invalid_requests_map_to_bad_request() {
        let path = RoutingError::invalid_path("/app", "context path mismatch");
        let pattern = RoutingError::invalid_pattern("/{id", "unclosed variable");

        assert_eq!(path.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(pattern.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_state_from_keeps_chain() {
        let inner = RoutingError::invalid_path("/x", "bad");
        let error = RoutingError::state_from(inner);

        assert_eq!(error.category(), ErrorCategory::State);
        assert!(error.to_string().contains("bad"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_introspection_keeps_inner_category() {
        let error = RoutingError::introspection(RoutingError::configuration("no matching capability"));
        assert_eq!(error.category(), ErrorCategory::Configuration);
        assert!(error.to_string().contains("introspection failed"));
    }

    #[test]
    fn test_error_envelope_serialization() {
        let error = RoutingError::illegal_state("routers not initialized");
        let json = serde_json::to_string(&error.to_envelope()).expect("serialization should work");

        assert!(json.contains("\"code\":\"ILLEGAL_STATE\""));
        assert!(json.contains("\"category\":\"state\""));
    }

    #[test]
    fn test_all_categories_map_to_error_status() {
        let categories = [
            ErrorCategory::Configuration,
            ErrorCategory::State,
            ErrorCategory::Resolution,
            ErrorCategory::InvalidRequest,
        ];

        for category in categories {
            let status = category.default_status_code();
            assert!(
                status.is_client_error() || status.is_server_error(),
                "Category {:?} should map to error status code, got {}",
                category,
                status
            );
        }
    }
}
