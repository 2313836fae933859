//! CORS (Cross-Origin Resource Sharing) middleware.
//!
//! Applies the cross-origin policy of the route a request resolves to. The
//! policy is looked up per request through a [`CorsConfigurationSource`],
//! typically the [`HandlerIntrospector`], so each route's own configuration
//! decides, rather than one global policy.
//!
//! - Requests without an `Origin` header pass through untouched.
//! - Requests whose route has no policy pass through untouched.
//! - Preflight requests are answered here: `204` with the policy's CORS
//!   headers when origin, method and headers are allowed, `403` otherwise.
//! - Other requests reach the handler; the response gets
//!   `Access-Control-Allow-Origin` and related headers when the origin is allowed.
//!
//! ## Example
//!
//! ```ignore
//! use archimedes_middleware::stages::{CorsMiddleware, IntrospectionCacheMiddleware};
//! use archimedes_middleware::Pipeline;
//!
//! let pipeline = Pipeline::builder()
//!     .stage(IntrospectionCacheMiddleware::new(introspector.clone()))
//!     .stage(CorsMiddleware::new(introspector))
//!     .build();
//! ```
//!
//! [`HandlerIntrospector`]: archimedes_introspect::HandlerIntrospector

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use archimedes_core::{CorsConfiguration, CorsConfigurationSource, CorsInterceptor, ServerRequest};
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::Full;
use std::sync::Arc;

/// CORS header names.
pub mod headers {
    /// `Access-Control-Allow-Origin` header.
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    /// `Access-Control-Allow-Methods` header.
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    /// `Access-Control-Allow-Headers` header.
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    /// `Access-Control-Allow-Credentials` header.
    pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
    /// `Access-Control-Expose-Headers` header.
    pub const EXPOSE_HEADERS: &str = "access-control-expose-headers";
    /// `Access-Control-Max-Age` header.
    pub const MAX_AGE: &str = "access-control-max-age";
    /// `Access-Control-Request-Method` header.
    pub const REQUEST_METHOD: &str = "access-control-request-method";
    /// `Access-Control-Request-Headers` header.
    pub const REQUEST_HEADERS: &str = "access-control-request-headers";
    /// `Origin` header.
    pub const ORIGIN: &str = "origin";
    /// `Vary` header.
    pub const VARY: &str = "vary";
}

/// Applies per-route CORS policies.
#[derive(Clone)]
pub struct CorsMiddleware {
    source: Arc<dyn CorsConfigurationSource>,
}

impl CorsMiddleware {
    /// Creates a CORS stage asking `source` for each request's policy.
    #[must_use]
    pub fn new(source: Arc<dyn CorsConfigurationSource>) -> Self {
        Self { source }
    }

    /// Creates a CORS stage applying one policy to every request.
    #[must_use]
    pub fn fixed(config: CorsConfiguration) -> Self {
        Self::new(Arc::new(CorsInterceptor::new(config)))
    }

    /// Checks if a request is a CORS preflight request.
    fn is_preflight(request: &Request) -> bool {
        request.method() == Method::OPTIONS
            && request.headers().contains_key(headers::ORIGIN)
            && request.headers().contains_key(headers::REQUEST_METHOD)
    }

    fn get_origin(request: &Request) -> Option<&str> {
        request.headers().get(headers::ORIGIN).and_then(|v| v.to_str().ok())
    }

    /// Handles a preflight OPTIONS request.
    fn handle_preflight(config: &CorsConfiguration, request: &Request, origin: &str) -> Response {
        if !config.allowed_origins().is_allowed(origin) {
            return Self::forbidden_response("Origin not allowed");
        }

        if let Some(method) = request
            .headers()
            .get(headers::REQUEST_METHOD)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<Method>().ok())
        {
            if !config.allows_method(&method) {
                return Self::forbidden_response("Method not allowed");
            }
        }

        if let Some(requested) = request.headers().get(headers::REQUEST_HEADERS).and_then(|v| v.to_str().ok()) {
            let rejected = requested
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .find(|h| !config.allows_header(h));
            if let Some(header) = rejected {
                return Self::forbidden_response(&format!("Header '{}' not allowed", header.to_lowercase()));
            }
        }

        Self::preflight_response(config, origin)
    }

    /// Creates a 204 No Content preflight response with CORS headers.
    fn preflight_response(config: &CorsConfiguration, origin: &str) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::new()));
        *response.status_mut() = StatusCode::NO_CONTENT;

        let response_headers = response.headers_mut();
        Self::insert_origin_headers(config, response_headers, origin);

        if let Some(value) = joined(config.allowed_methods().iter().map(Method::as_str)) {
            response_headers.insert(headers::ALLOW_METHODS, value);
        }
        if let Some(value) = joined(config.allowed_headers().iter().map(String::as_str)) {
            response_headers.insert(headers::ALLOW_HEADERS, value);
        }
        if let Some(max_age) = config.max_age() {
            response_headers.insert(headers::MAX_AGE, HeaderValue::from(max_age.as_secs()));
        }
        response_headers.insert(
            headers::VARY,
            HeaderValue::from_static("Origin, Access-Control-Request-Method, Access-Control-Request-Headers"),
        );

        response
    }

    /// Creates a 403 Forbidden response.
    fn forbidden_response(message: &str) -> Response {
        Response::text(StatusCode::FORBIDDEN, message)
    }

    /// Adds CORS headers to a response for non-preflight requests.
    fn add_cors_headers(config: &CorsConfiguration, response: &mut Response, origin: &str) {
        let response_headers = response.headers_mut();
        Self::insert_origin_headers(config, response_headers, origin);

        if let Some(value) = joined(config.expose_headers().iter().map(String::as_str)) {
            response_headers.insert(headers::EXPOSE_HEADERS, value);
        }
        response_headers.insert(headers::VARY, HeaderValue::from_static("Origin"));
    }

    fn insert_origin_headers(config: &CorsConfiguration, response_headers: &mut HeaderMap, origin: &str) {
        if let Some(value) = config.allowed_origins().header_value(origin) {
            response_headers.insert(headers::ALLOW_ORIGIN, value);
        }
        if config.allow_credentials() {
            response_headers.insert(headers::ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }
    }
}

/// Sorted, comma separated list value; `None` when empty or not a valid header.
fn joined<'a>(values: impl Iterator<Item = &'a str>) -> Option<HeaderValue> {
    let mut values: Vec<_> = values.collect();
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    HeaderValue::from_str(&values.join(", ")).ok()
}

impl std::fmt::Debug for CorsMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorsMiddleware").finish_non_exhaustive()
    }
}

impl Middleware for CorsMiddleware {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn process<'a>(&'a self, request: &'a mut Request, next: Next<'a>) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let Some(origin) = Self::get_origin(request).map(String::from) else {
                return next.run(request).await;
            };

            let config = match self.source.cors_configuration(&*request) {
                Ok(Some(config)) => config,
                Ok(None) => return next.run(request).await,
                Err(error) => {
                    tracing::warn!(
                        path = request.uri().path(),
                        origin = %origin,
                        error = %error,
                        "CORS policy lookup failed"
                    );
                    return Response::routing_error(&error);
                }
            };

            if Self::is_preflight(request) {
                let response = Self::handle_preflight(&config, request, &origin);
                tracing::debug!(
                    path = request.uri().path(),
                    origin = %origin,
                    status = response.status().as_u16(),
                    "CORS preflight answered"
                );
                return response;
            }

            let mut response = next.run(request).await;
            if config.allowed_origins().is_allowed(&origin) {
                Self::add_cors_headers(&config, &mut response, &origin);
            }
            response
        })
    }
}
