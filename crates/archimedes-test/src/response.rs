//! Buffered responses for assertions.

use crate::error::TestError;
use archimedes_core::ErrorEnvelope;
use bytes::Bytes;
use http::response::Parts;
use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use std::fmt;

/// A response whose body has been collected, with chainable assertions.
pub struct TestResponse {
    parts: Parts,
    body: Bytes,
}

impl TestResponse {
    /// Collects the body of `response`.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Body`] if the body stream fails.
    pub async fn from_http<B>(response: http::Response<B>) -> Result<Self, TestError>
    where
        B: BodyExt,
        B::Error: fmt::Display,
    {
        let (parts, body) = response.into_parts();
        let collected = body.collect().await.map_err(|e| TestError::Body(e.to_string()))?;
        Ok(Self {
            parts,
            body: collected.to_bytes(),
        })
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.parts.status
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Returns a header as text, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns the collected body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decodes the body as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Body`] if the body is not UTF-8.
    pub fn text(&self) -> Result<&str, TestError> {
        std::str::from_utf8(&self.body).map_err(|e| TestError::Body(e.to_string()))
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserializes the body as a routing error envelope.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body is not an envelope.
    pub fn error_envelope(&self) -> Result<ErrorEnvelope, TestError> {
        self.json()
    }

    /// # Panics
    ///
    /// Panics unless the status is `expected`.
    #[track_caller]
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(self.status(), expected, "status mismatch, body: {}", self.body_lossy());
        self
    }

    /// # Panics
    ///
    /// Panics unless header `name` is present with value `expected`.
    #[track_caller]
    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        assert_eq!(self.header(name), Some(expected), "header {name}");
        self
    }

    /// # Panics
    ///
    /// Panics if header `name` is present.
    #[track_caller]
    pub fn assert_no_header(&self, name: &str) -> &Self {
        if let Some(value) = self.parts.headers.get(name) {
            panic!("unexpected header {name}: {value:?}");
        }
        self
    }

    /// # Panics
    ///
    /// Panics unless the body is an error envelope carrying `code`.
    #[track_caller]
    pub fn assert_error_code(&self, code: &str) -> &Self {
        match self.error_envelope() {
            Ok(envelope) => assert_eq!(envelope.error.code, code, "error code"),
            Err(e) => panic!("body is not an error envelope ({e}): {}", self.body_lossy()),
        }
        self
    }

    fn body_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("status", &self.parts.status)
            .field("headers", &self.parts.headers)
            .field("body", &self.body_lossy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archimedes_core::RoutingError;
    use http_body_util::Full;

    fn response(status: StatusCode, body: impl Into<Bytes>) -> http::Response<Full<Bytes>> {
        http::Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(Full::new(body.into()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_buffers_response() {
        let response = TestResponse::from_http(response(StatusCode::OK, "{}")).await.unwrap();

        response
            .assert_status(StatusCode::OK)
            .assert_header("content-type", "application/json")
            .assert_no_header("vary");
        assert_eq!(response.text().unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_reads_error_envelope() {
        let error = RoutingError::illegal_state("registry not initialized");
        let body = serde_json::to_vec(&error.to_envelope()).unwrap();

        let response = TestResponse::from_http(response(error.status_code(), body)).await.unwrap();

        response.assert_error_code("ILLEGAL_STATE");
        let envelope = response.error_envelope().unwrap();
        assert!(envelope.error.message.contains("registry not initialized"));
    }

    #[tokio::test]
    #[should_panic(expected = "unexpected header content-type")]
    async fn test_assert_no_header_panics_when_present() {
        let response = TestResponse::from_http(response(StatusCode::OK, "{}")).await.unwrap();
        response.assert_no_header("content-type");
    }
}
