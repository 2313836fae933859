//! The request surface seen by routers and introspection.
//!
//! [`ServerRequest`] is deliberately small: the HTTP request line and headers,
//! the application context path, and a mutable attribute store. Routers use the
//! attribute store to cache lookup state; introspection swaps the store out
//! (see `archimedes-introspect`) so that probing a request never leaves marks
//! on the real one.

use crate::attributes::{AttributeValue, Attributes};
use http::{HeaderMap, Method, Uri};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A request as seen by routers.
///
/// Attribute writes are the only mutation a router may perform. Storing an
/// attribute replaces any existing value; removing a missing attribute is a
/// no-op.
pub trait ServerRequest: Send + Sync {
    /// Returns the HTTP method.
    fn method(&self) -> &Method;

    /// Returns the request URI.
    fn uri(&self) -> &Uri;

    /// Returns the request headers.
    fn headers(&self) -> &HeaderMap;

    /// Returns the path prefix the application is mounted under.
    ///
    /// Empty when the application is mounted at the root.
    fn context_path(&self) -> &str;

    /// Returns the attribute stored under `name`.
    fn attribute(&self, name: &str) -> Option<AttributeValue>;

    /// Stores an attribute.
    fn set_attribute(&mut self, name: &str, value: AttributeValue);

    /// Removes an attribute, returning its value.
    fn remove_attribute(&mut self, name: &str) -> Option<AttributeValue>;

    /// Returns the names of all stored attributes.
    fn attribute_names(&self) -> Vec<String>;
}

/// Typed conveniences over [`ServerRequest`].
pub trait ServerRequestExt: ServerRequest {
    /// Returns the attribute stored under `name` if it has type `T`.
    fn typed_attribute<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.attribute(name).and_then(|value| value.downcast::<T>().ok())
    }

    /// Wraps and stores a typed attribute.
    fn set_typed_attribute<T: Any + Send + Sync>(&mut self, name: &str, value: T) {
        self.set_attribute(name, Arc::new(value));
    }

    /// Stores `value` under `name`, or removes the attribute when `value` is `None`.
    ///
    /// This is the restore half of every save/restore pair: restoring a
    /// previously absent attribute removes it rather than storing a placeholder.
    fn restore_attribute(&mut self, name: &str, value: Option<AttributeValue>) {
        match value {
            Some(value) => self.set_attribute(name, value),
            None => {
                self.remove_attribute(name);
            }
        }
    }

    /// Returns the URI path.
    fn path(&self) -> &str {
        self.uri().path()
    }
}

impl<R: ServerRequest + ?Sized> ServerRequestExt for R {}

/// An HTTP request paired with its context path and attribute store.
///
/// This is the concrete request type carried through the middleware chain.
///
/// # Example
///
/// ```
/// use archimedes_core::{Exchange, ServerRequest, ServerRequestExt};
///
/// let request = http::Request::get("/app/users/7").body(()).unwrap();
/// let mut exchange = Exchange::new(request).with_context_path("/app");
///
/// exchange.set_typed_attribute("app.user", 7_u64);
/// assert_eq!(exchange.context_path(), "/app");
/// assert_eq!(exchange.typed_attribute::<u64>("app.user").as_deref(), Some(&7));
/// ```
pub struct Exchange<B = ()> {
    request: http::Request<B>,
    context_path: String,
    attributes: Attributes,
}

impl<B> Exchange<B> {
    /// Wraps an HTTP request mounted at the root context.
    pub fn new(request: http::Request<B>) -> Self {
        Self {
            request,
            context_path: String::new(),
            attributes: Attributes::new(),
        }
    }

    /// Sets the context path.
    #[must_use]
    pub fn with_context_path(mut self, context_path: impl Into<String>) -> Self {
        self.context_path = context_path.into();
        self
    }

    /// Returns the wrapped HTTP request.
    pub fn request(&self) -> &http::Request<B> {
        &self.request
    }

    /// Returns the wrapped HTTP request mutably.
    pub fn request_mut(&mut self) -> &mut http::Request<B> {
        &mut self.request
    }

    /// Returns the attribute store.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns the attribute store mutably.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Unwraps the HTTP request, dropping the attributes.
    pub fn into_request(self) -> http::Request<B> {
        self.request
    }
}

impl<B: Send + Sync> ServerRequest for Exchange<B> {
    fn method(&self) -> &Method {
        self.request.method()
    }

    fn uri(&self) -> &Uri {
        self.request.uri()
    }

    fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    fn context_path(&self) -> &str {
        &self.context_path
    }

    fn attribute(&self, name: &str) -> Option<AttributeValue> {
        self.attributes.get(name)
    }

    fn set_attribute(&mut self, name: &str, value: AttributeValue) {
        self.attributes.insert(name, value);
    }

    fn remove_attribute(&mut self, name: &str) -> Option<AttributeValue> {
        self.attributes.remove(name)
    }

    fn attribute_names(&self) -> Vec<String> {
        self.attributes.names()
    }
}

impl<B> fmt::Debug for Exchange<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("method", self.request.method())
            .field("uri", self.request.uri())
            .field("context_path", &self.context_path)
            .field("attributes", &self.attributes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(uri: &str) -> Exchange {
        Exchange::new(http::Request::get(uri).body(()).unwrap())
    }

    #[test]
    fn test_exchange_request_line() {
        let exchange = exchange("/users?page=2");
        assert_eq!(exchange.method(), Method::GET);
        assert_eq!(exchange.path(), "/users");
        assert_eq!(exchange.context_path(), "");
    }

    #[test]
    fn test_typed_attributes() {
        let mut exchange = exchange("/");
        exchange.set_typed_attribute("flag", true);

        assert_eq!(exchange.typed_attribute::<bool>("flag").as_deref(), Some(&true));
        assert!(exchange.typed_attribute::<String>("flag").is_none());
        assert_eq!(exchange.attribute_names(), vec!["flag".to_string()]);
    }

    #[test]
    fn test_restore_attribute_removes_when_absent() {
        let mut exchange = exchange("/");
        exchange.set_typed_attribute("temp", 1_i32);

        exchange.restore_attribute("temp", None);
        assert!(exchange.attribute("temp").is_none());
    }

    #[test]
    fn test_restore_attribute_reinstates_same_value() {
        let mut exchange = exchange("/");
        exchange.set_typed_attribute("path", "/a".to_string());
        let saved = exchange.attribute("path");

        exchange.set_typed_attribute("path", "/b".to_string());
        exchange.restore_attribute("path", saved.clone());

        let restored = exchange.attribute("path").unwrap();
        assert!(Arc::ptr_eq(&restored, &saved.unwrap()));
    }

    #[test]
    fn test_into_request_keeps_headers() {
        let request = http::Request::get("/")
            .header("x-request-id", "abc")
            .body(())
            .unwrap();
        let exchange = Exchange::new(request);

        let request = exchange.into_request();
        assert_eq!(request.headers()["x-request-id"], "abc");
    }
}
