//! Failures raised by the test fixtures themselves.

use std::fmt;

/// A fixture could not be built or a response could not be read back.
#[derive(Debug)]
pub enum TestError {
    /// The request description is not a valid HTTP request.
    InvalidRequest(String),
    /// The response body could not be collected or decoded as text.
    Body(String),
    /// The response body is not the expected JSON document.
    Json(serde_json::Error),
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest(reason) => write!(f, "invalid test request: {reason}"),
            Self::Body(reason) => write!(f, "unreadable response body: {reason}"),
            Self::Json(source) => write!(f, "unexpected response JSON: {source}"),
        }
    }
}

impl std::error::Error for TestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::Json(source) = self {
            Some(source)
        } else {
            None
        }
    }
}

impl From<serde_json::Error> for TestError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json(source)
    }
}
