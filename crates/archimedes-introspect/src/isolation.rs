//! A request view that keeps attribute writes to itself.

use archimedes_core::{AttributeValue, Attributes, ServerRequest};
use archimedes_router::SUPPRESS_LOGGING_ATTRIBUTE;
use http::{HeaderMap, Method, Uri};
use std::fmt;

/// Wraps a request so routers can be probed without marking it.
///
/// The view starts with a copy of the request's attributes (values are shared,
/// not cloned). Every attribute read, write, removal and listing afterwards
/// touches only that copy; everything else reads through to the request.
///
/// # Example
///
/// ```rust
/// use archimedes_core::{Exchange, ServerRequest, ServerRequestExt};
/// use archimedes_introspect::AttributesPreservingRequest;
///
/// let mut request = Exchange::new(http::Request::get("/users").body(()).unwrap());
/// request.set_typed_attribute("tenant", "acme".to_string());
///
/// let mut view = AttributesPreservingRequest::new(&request, false);
/// view.set_typed_attribute("scratch", 1_u8);
/// view.remove_attribute("tenant");
///
/// assert!(request.attribute("scratch").is_none());
/// assert!(request.attribute("tenant").is_some());
/// ```
pub struct AttributesPreservingRequest<'a> {
    request: &'a dyn ServerRequest,
    attributes: Attributes,
}

impl<'a> AttributesPreservingRequest<'a> {
    /// Creates a view over `request`.
    ///
    /// With `suppress_logging`, the view also carries the marker asking
    /// routers to skip their per-request mapping logs.
    pub fn new(request: &'a dyn ServerRequest, suppress_logging: bool) -> Self {
        let mut attributes = Attributes::new();
        for name in request.attribute_names() {
            if let Some(value) = request.attribute(&name) {
                attributes.insert(name, value);
            }
        }
        if suppress_logging {
            attributes.insert_value(SUPPRESS_LOGGING_ATTRIBUTE, true);
        }

        Self {
            request,
            attributes,
        }
    }

    /// Returns the view's private attributes.
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

impl ServerRequest for AttributesPreservingRequest<'_> {
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
        self.request.context_path()
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

impl fmt::Debug for AttributesPreservingRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributesPreservingRequest")
            .field("method", self.method())
            .field("uri", self.uri())
            .field("attributes", &self.attributes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archimedes_core::{Exchange, ServerRequestExt};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn exchange() -> Exchange {
        let request = http::Request::post("/orders?draft=1")
            .header("origin", "https://shop.example")
            .body(())
            .unwrap();
        Exchange::new(request).with_context_path("")
    }

    #[test]
    fn test_request_line_passes_through() {
        let request = exchange();
        let view = AttributesPreservingRequest::new(&request, false);

        assert_eq!(view.method(), Method::POST);
        assert_eq!(view.uri().path(), "/orders");
        assert_eq!(view.headers()["origin"], "https://shop.example");
        assert_eq!(view.context_path(), "");
    }

    #[test]
    fn test_seeded_values_are_shared() {
        let mut request = exchange();
        request.set_typed_attribute("shared", vec![1_u8]);
        let original = request.attribute("shared").unwrap();

        let view = AttributesPreservingRequest::new(&request, false);
        let seen = view.attribute("shared").unwrap();
        assert!(Arc::ptr_eq(&original, &seen));
    }

    #[test]
    fn test_suppress_logging_marker() {
        let request = exchange();

        let quiet = AttributesPreservingRequest::new(&request, true);
        assert!(archimedes_router::is_logging_suppressed(&quiet));
        assert!(!archimedes_router::is_logging_suppressed(&request));

        let loud = AttributesPreservingRequest::new(&request, false);
        assert!(!archimedes_router::is_logging_suppressed(&loud));
    }

    proptest! {
        #[test]
        fn prop_view_mutations_never_reach_the_request(
            seeded in prop::collection::btree_map("[a-c]", any::<u8>(), 0..3),
            writes in prop::collection::vec(("[a-e]", any::<u8>()), 0..8),
            removals in prop::collection::vec("[a-e]", 0..4),
        ) {
            let mut request = exchange();
            for (name, value) in &seeded {
                request.set_typed_attribute(name, *value);
            }
            let before = request.attribute_names();

            {
                let mut view = AttributesPreservingRequest::new(&request, true);
                for (name, value) in &writes {
                    view.set_typed_attribute(name, *value);
                }
                for name in &removals {
                    view.remove_attribute(name);
                }
            }

            prop_assert_eq!(request.attribute_names(), before);
            for (name, value) in &seeded {
                let kept = request.typed_attribute::<u8>(name);
                prop_assert_eq!(kept.as_deref(), Some(value));
            }
        }
    }
}
