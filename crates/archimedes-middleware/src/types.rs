//! Request and response types carried through the middleware chain.

use archimedes_core::{Exchange, RoutingError};
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::Full;

/// The request every stage sees: an [`Exchange`] with a buffered body, so
/// stages can read and write request attributes.
pub type Request = Exchange<Full<Bytes>>;

/// The response every stage produces.
pub type Response = http::Response<Full<Bytes>>;

/// Shortcuts for the responses stages answer with on their own.
pub trait ResponseExt {
    /// A `text/plain` response.
    fn text(status: StatusCode, message: &str) -> Response;

    /// The JSON error envelope of `error`, sent with the error's own status.
    fn routing_error(error: &RoutingError) -> Response;
}

impl ResponseExt for Response {
    fn text(status: StatusCode, message: &str) -> Response {
        with_body(status, "text/plain; charset=utf-8", Bytes::copy_from_slice(message.as_bytes()))
    }

    fn routing_error(error: &RoutingError) -> Response {
        let status = error.status_code();
        match serde_json::to_vec(&error.to_envelope()) {
            Ok(body) => with_body(status, "application/json", Bytes::from(body)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize error envelope");
                Self::text(status, &error.to_string())
            }
        }
    }
}

fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> Response {
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
