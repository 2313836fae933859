//! Fluent construction of [`Exchange`]s for tests.

use crate::error::TestError;
use archimedes_core::{AttributeValue, Exchange};
use bytes::Bytes;
use http::{header, HeaderName, HeaderValue, Method};
use http_body_util::Full;
use std::any::Any;
use std::sync::Arc;

/// Describes a request and turns it into an [`Exchange`].
///
/// Invalid header names or values are remembered and reported when the
/// exchange is built, so a chain of calls never panics halfway.
///
/// # Example
///
/// ```
/// use archimedes_core::ServerRequest;
/// use archimedes_test::TestRequest;
///
/// let exchange = TestRequest::get("/shop/cart")
///     .context_path("/shop")
///     .origin("https://app.example")
///     .exchange();
///
/// assert_eq!(exchange.context_path(), "/shop");
/// assert_eq!(exchange.headers()["origin"], "https://app.example");
/// ```
#[must_use]
#[derive(Debug)]
pub struct TestRequest {
    parts: http::request::Builder,
    context_path: String,
    attributes: Vec<(String, AttributeValue)>,
    body: Bytes,
    invalid: Option<String>,
}

impl TestRequest {
    /// Starts a request with an arbitrary method.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            parts: http::Request::builder().method(method).uri(uri.as_ref()),
            context_path: String::new(),
            attributes: Vec::new(),
            body: Bytes::new(),
            invalid: None,
        }
    }

    /// Starts a GET request.
    pub fn get(uri: impl AsRef<str>) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(uri: impl AsRef<str>) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Starts an OPTIONS request without preflight headers.
    pub fn options(uri: impl AsRef<str>) -> Self {
        Self::new(Method::OPTIONS, uri)
    }

    /// Adds a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let (name, value) = (name.as_ref(), value.as_ref());
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => self.parts = self.parts.header(name, value),
            _ => {
                self.invalid.get_or_insert_with(|| format!("bad header {name}: {value:?}"));
            }
        }
        self
    }

    /// Sets the `Origin` header.
    pub fn origin(self, origin: impl AsRef<str>) -> Self {
        self.header(header::ORIGIN.as_str(), origin)
    }

    /// Makes this a CORS preflight from `origin` asking for `method`.
    pub fn preflight(mut self, origin: impl AsRef<str>, method: &Method) -> Self {
        self.parts = self.parts.method(Method::OPTIONS);
        self.origin(origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD.as_str(), method.as_str())
    }

    /// Sets the prefix the application is mounted under.
    pub fn context_path(mut self, context_path: impl Into<String>) -> Self {
        self.context_path = context_path.into();
        self
    }

    /// Stores an attribute that is present before any router runs.
    pub fn attribute<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.attributes.push((name.into(), Arc::new(value)));
        self
    }

    /// Sets the body carried by [`full_exchange`](Self::full_exchange).
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the exchange around `body`.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::InvalidRequest`] for a malformed URI, method or header.
    pub fn try_exchange<B>(self, body: B) -> Result<Exchange<B>, TestError> {
        if let Some(reason) = self.invalid {
            return Err(TestError::InvalidRequest(reason));
        }

        let request = self
            .parts
            .body(body)
            .map_err(|e| TestError::InvalidRequest(e.to_string()))?;
        let mut exchange = Exchange::new(request).with_context_path(self.context_path);
        for (name, value) in self.attributes {
            exchange.attributes_mut().insert(name, value);
        }
        Ok(exchange)
    }

    /// Builds a body-less exchange.
    ///
    /// # Panics
    ///
    /// Panics if the request is malformed.
    pub fn exchange(self) -> Exchange {
        self.try_exchange(()).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Builds an exchange carrying the body set with [`body`](Self::body).
    ///
    /// # Panics
    ///
    /// Panics if the request is malformed.
    pub fn full_exchange(self) -> Exchange<Full<Bytes>> {
        let body = Full::new(self.body.clone());
        self.try_exchange(body).unwrap_or_else(|e| panic!("{e}"))
    }
}
