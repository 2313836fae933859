//! Cross-origin (CORS) configuration.
//!
//! A [`CorsConfiguration`] describes the cross-origin policy of a route. It is
//! produced by a [`CorsConfigurationSource`]: a route handler, an interceptor
//! such as [`CorsInterceptor`], or the introspector, which finds the policy the
//! resolved route would apply.
//!
//! ## Example
//!
//! ```
//! use archimedes_core::CorsConfiguration;
//! use http::Method;
//! use std::time::Duration;
//!
//! let cors = CorsConfiguration::builder()
//!     .allow_origin("https://app.example.com")
//!     .allow_methods([Method::GET, Method::POST])
//!     .allow_headers(["Content-Type", "Authorization"])
//!     .allow_credentials(true)
//!     .max_age(Duration::from_secs(3600))
//!     .build();
//!
//! assert!(cors.allowed_origins().is_allowed("https://app.example.com"));
//! assert!(cors.allows_method(&Method::POST));
//! assert!(!cors.allows_method(&Method::DELETE));
//! ```

use crate::error::RoutingResult;
use crate::handler::HandlerInterceptor;
use crate::request::ServerRequest;
use http::{HeaderValue, Method};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// A source of per-request cross-origin configuration.
pub trait CorsConfigurationSource: Send + Sync {
    /// Returns the policy for `request`, or `None` if no policy applies.
    fn cors_configuration(
        &self,
        request: &dyn ServerRequest,
    ) -> RoutingResult<Option<Arc<CorsConfiguration>>>;
}

/// Represents the set of allowed origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Allow any origin (wildcard `*`).
    Any,
    /// Allow specific origins.
    List(HashSet<String>),
}

impl AllowedOrigins {
    /// Checks if an origin is allowed.
    pub fn is_allowed(&self, origin: &str) -> bool {
        match self {
            AllowedOrigins::Any => true,
            AllowedOrigins::List(origins) => origins.contains(origin),
        }
    }

    /// Returns the `Access-Control-Allow-Origin` value for a given origin.
    pub fn header_value(&self, origin: &str) -> Option<HeaderValue> {
        match self {
            AllowedOrigins::Any => Some(HeaderValue::from_static("*")),
            AllowedOrigins::List(origins) => {
                if origins.contains(origin) {
                    HeaderValue::from_str(origin).ok()
                } else {
                    None
                }
            }
        }
    }
}

/// Cross-origin policy of a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfiguration {
    allowed_origins: AllowedOrigins,
    allowed_methods: HashSet<Method>,
    allowed_headers: HashSet<String>,
    expose_headers: HashSet<String>,
    allow_credentials: bool,
    max_age: Option<Duration>,
}

impl Default for CorsConfiguration {
    fn default() -> Self {
        Self {
            allowed_origins: AllowedOrigins::List(HashSet::new()),
            allowed_methods: HashSet::from([Method::GET, Method::HEAD, Method::POST]),
            allowed_headers: HashSet::from(["*".to_string()]),
            expose_headers: HashSet::new(),
            allow_credentials: false,
            max_age: Some(Duration::from_secs(1800)),
        }
    }
}

impl CorsConfiguration {
    /// Creates a new builder starting from the default policy.
    #[must_use]
    pub fn builder() -> CorsBuilder {
        CorsBuilder::new()
    }

    /// Returns the allowed origins.
    #[must_use]
    pub fn allowed_origins(&self) -> &AllowedOrigins {
        &self.allowed_origins
    }

    /// Returns the allowed methods.
    #[must_use]
    pub fn allowed_methods(&self) -> &HashSet<Method> {
        &self.allowed_methods
    }

    /// Returns the allowed request headers, lowercased.
    #[must_use]
    pub fn allowed_headers(&self) -> &HashSet<String> {
        &self.allowed_headers
    }

    /// Returns the headers exposed to scripts, lowercased.
    #[must_use]
    pub fn expose_headers(&self) -> &HashSet<String> {
        &self.expose_headers
    }

    /// Returns whether credentials are allowed.
    #[must_use]
    pub fn allow_credentials(&self) -> bool {
        self.allow_credentials
    }

    /// Returns the preflight cache duration.
    #[must_use]
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    /// Checks whether a method is allowed.
    #[must_use]
    pub fn allows_method(&self, method: &Method) -> bool {
        self.allowed_methods.contains(method)
    }

    /// Checks whether a request header is allowed.
    #[must_use]
    pub fn allows_header(&self, header: &str) -> bool {
        self.allowed_headers.contains("*") || self.allowed_headers.contains(&header.to_lowercase())
    }
}

/// Builder for [`CorsConfiguration`].
#[derive(Debug, Clone, Default)]
pub struct CorsBuilder {
    config: CorsConfiguration,
}

impl CorsBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows any origin (wildcard `*`).
    ///
    /// **Warning**: browsers reject `Access-Control-Allow-Origin: *` combined
    /// with `Access-Control-Allow-Credentials: true`.
    #[must_use]
    pub fn allow_any_origin(mut self) -> Self {
        self.config.allowed_origins = AllowedOrigins::Any;
        self
    }

    /// Adds an allowed origin.
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        if let AllowedOrigins::List(origins) = &mut self.config.allowed_origins {
            origins.insert(origin.into());
        }
        self
    }

    /// Sets the allowed HTTP methods.
    #[must_use]
    pub fn allow_methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        self.config.allowed_methods = methods.into_iter().collect();
        self
    }

    /// Sets the allowed request headers.
    #[must_use]
    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_headers = headers.into_iter().map(|h| h.into().to_lowercase()).collect();
        self
    }

    /// Sets the headers exposed to scripts.
    #[must_use]
    pub fn expose_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.expose_headers = headers.into_iter().map(|h| h.into().to_lowercase()).collect();
        self
    }

    /// Sets whether to allow credentials (cookies, authorization headers).
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.config.allow_credentials = allow;
        self
    }

    /// Sets the preflight cache duration.
    #[must_use]
    pub fn max_age(mut self, duration: Duration) -> Self {
        self.config.max_age = Some(duration);
        self
    }

    /// Disables preflight caching.
    #[must_use]
    pub fn no_max_age(mut self) -> Self {
        self.config.max_age = None;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> CorsConfiguration {
        self.config
    }
}

/// Interceptor carrying a route-level cross-origin policy.
///
/// Routers prepend one to the execution chain of routes declaring a policy.
#[derive(Debug, Clone)]
pub struct CorsInterceptor {
    config: Arc<CorsConfiguration>,
}

impl CorsInterceptor {
    /// Creates an interceptor for `config`.
    #[must_use]
    pub fn new(config: CorsConfiguration) -> Self {
        Self::shared(Arc::new(config))
    }

    /// Creates an interceptor sharing an existing policy.
    #[must_use]
    pub fn shared(config: Arc<CorsConfiguration>) -> Self {
        Self { config }
    }
}

impl HandlerInterceptor for CorsInterceptor {
    fn name(&self) -> &str {
        "cors"
    }

    fn as_cors_source(&self) -> Option<&dyn CorsConfigurationSource> {
        Some(self)
    }
}

impl CorsConfigurationSource for CorsInterceptor {
    fn cors_configuration(
        &self,
        _request: &dyn ServerRequest,
    ) -> RoutingResult<Option<Arc<CorsConfiguration>>> {
        Ok(Some(Arc::clone(&self.config)))
    }
}
