//! Request-scoped caching of introspection results.
//!
//! The matched adapter and CORS policy are stored as request attributes so
//! code further down the same request (a security filter, a CORS stage) can
//! reuse them without resolving again. A [`CacheScope`] bounds how long they
//! stay visible: whatever the two attributes held before the scope is put
//! back when it ends.

use crate::adapter::LookupPathMatchableRouter;
use archimedes_core::{AttributeValue, CorsConfiguration, ServerRequest, ServerRequestExt};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Attribute holding the cached [`LookupPathMatchableRouter`].
pub const MATCHABLE_ROUTER_ATTRIBUTE: &str = "archimedes.introspect.MATCHABLE_ROUTER";

/// Attribute holding the cached [`CachedCors`].
pub const CORS_CONFIG_ATTRIBUTE: &str = "archimedes.introspect.CORS_CONFIG";

/// A cached CORS lookup outcome.
///
/// `NoPolicy` records that the matched route has no policy, which differs
/// from the attribute being absent (nothing computed yet).
#[derive(Debug, Clone)]
pub enum CachedCors {
    /// The matched route applies no CORS policy.
    NoPolicy,
    /// The matched route's CORS policy.
    Policy(Arc<CorsConfiguration>),
}

impl CachedCors {
    /// Returns the policy, if any.
    #[must_use]
    pub fn policy(&self) -> Option<Arc<CorsConfiguration>> {
        match self {
            Self::NoPolicy => None,
            Self::Policy(config) => Some(Arc::clone(config)),
        }
    }
}

impl From<Option<Arc<CorsConfiguration>>> for CachedCors {
    fn from(policy: Option<Arc<CorsConfiguration>>) -> Self {
        policy.map_or(Self::NoPolicy, Self::Policy)
    }
}

/// Returns the cached adapter.
pub fn cached_router<R: ServerRequest + ?Sized>(request: &R) -> Option<Arc<LookupPathMatchableRouter>> {
    request.typed_attribute::<LookupPathMatchableRouter>(MATCHABLE_ROUTER_ATTRIBUTE)
}

/// Returns the cached CORS outcome.
pub fn cached_cors<R: ServerRequest + ?Sized>(request: &R) -> Option<Arc<CachedCors>> {
    request.typed_attribute::<CachedCors>(CORS_CONFIG_ATTRIBUTE)
}

/// Caches an adapter and the CORS policy of the same match.
pub fn set_cache<R: ServerRequest + ?Sized>(
    request: &mut R,
    router: Arc<LookupPathMatchableRouter>,
    cors: Option<Arc<CorsConfiguration>>,
) {
    request.set_attribute(MATCHABLE_ROUTER_ATTRIBUTE, router);
    request.set_typed_attribute(CORS_CONFIG_ATTRIBUTE, CachedCors::from(cors));
}

/// Removes both cache attributes.
pub fn clear_cache<R: ServerRequest + ?Sized>(request: &mut R) {
    request.remove_attribute(MATCHABLE_ROUTER_ATTRIBUTE);
    request.remove_attribute(CORS_CONFIG_ATTRIBUTE);
}

/// The raw contents of both cache attributes at one point in time.
#[derive(Clone, Default)]
pub struct CacheSnapshot {
    router: Option<AttributeValue>,
    cors: Option<AttributeValue>,
}

impl CacheSnapshot {
    /// Records the current cache attributes of `request`.
    pub fn capture<R: ServerRequest + ?Sized>(request: &R) -> Self {
        Self {
            router: request.attribute(MATCHABLE_ROUTER_ATTRIBUTE),
            cors: request.attribute(CORS_CONFIG_ATTRIBUTE),
        }
    }

    /// Puts the recorded values back, removing attributes that were absent.
    pub fn restore<R: ServerRequest + ?Sized>(self, request: &mut R) {
        request.restore_attribute(MATCHABLE_ROUTER_ATTRIBUTE, self.router);
        request.restore_attribute(CORS_CONFIG_ATTRIBUTE, self.cors);
    }

    /// Returns true if neither attribute was set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.router.is_none() && self.cors.is_none()
    }
}

impl std::fmt::Debug for CacheSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSnapshot")
            .field("router", &self.router.is_some())
            .field("cors", &self.cors.is_some())
            .finish()
    }
}

/// Holds a request whose cache attributes are restored when the scope drops.
///
/// Dropping covers normal exit, unwinding and cancellation of a future
/// holding the scope.
pub struct CacheScope<'a, R: ServerRequest + ?Sized> {
    request: &'a mut R,
    snapshot: Option<CacheSnapshot>,
}

impl<'a, R: ServerRequest + ?Sized> CacheScope<'a, R> {
    /// Snapshots the cache attributes of `request`.
    pub fn new(request: &'a mut R) -> Self {
        let snapshot = CacheSnapshot::capture(&*request);
        Self {
            request,
            snapshot: Some(snapshot),
        }
    }

    /// Returns the adapter visible inside this scope.
    #[must_use]
    pub fn matchable_router(&self) -> Option<Arc<LookupPathMatchableRouter>> {
        cached_router(&*self.request)
    }

    /// Returns the CORS policy visible inside this scope.
    #[must_use]
    pub fn cors_configuration(&self) -> Option<Arc<CorsConfiguration>> {
        cached_cors(&*self.request).and_then(|cached| cached.policy())
    }
}

impl<R: ServerRequest + ?Sized> Deref for CacheScope<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        &*self.request
    }
}

impl<R: ServerRequest + ?Sized> DerefMut for CacheScope<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut *self.request
    }
}

impl<R: ServerRequest + ?Sized> Drop for CacheScope<'_, R> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            snapshot.restore(&mut *self.request);
        }
    }
}

impl<R: ServerRequest + ?Sized> std::fmt::Debug for CacheScope<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheScope")
            .field("matchable_router", &self.matchable_router())
            .field("snapshot", &self.snapshot)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archimedes_core::Exchange;
    use archimedes_router::{PatternRouter, Router};

    fn exchange() -> Exchange {
        Exchange::new(http::Request::get("/api").body(()).unwrap())
    }

    fn adapter(path: &str) -> Arc<LookupPathMatchableRouter> {
        let router: Arc<dyn Router> = Arc::new(PatternRouter::builder("legacy").resolved_paths().build().unwrap());
        Arc::new(LookupPathMatchableRouter::resolved(router, Arc::new(path.to_string())).unwrap())
    }

    fn policy() -> Arc<CorsConfiguration> {
        Arc::new(CorsConfiguration::builder().allow_any_origin().build())
    }

    #[test]
    fn test_set_and_read_cache() {
        let mut request = exchange();
        set_cache(&mut request, adapter("/api"), Some(policy()));

        assert_eq!(cached_router(&request).unwrap().lookup_path().as_str(), "/api");
        assert!(cached_cors(&request).unwrap().policy().is_some());
    }

    #[test]
    fn test_no_policy_sentinel_differs_from_absent() {
        let mut request = exchange();
        assert!(cached_cors(&request).is_none());

        set_cache(&mut request, adapter("/api"), None);
        let cached = cached_cors(&request).unwrap();
        assert!(matches!(*cached, CachedCors::NoPolicy));
        assert!(cached.policy().is_none());
    }

    #[test]
    fn test_clear_cache() {
        let mut request = exchange();
        set_cache(&mut request, adapter("/api"), None);
        clear_cache(&mut request);

        assert!(CacheSnapshot::capture(&request).is_empty());
    }

    #[test]
    fn test_scope_restores_absence() {
        let mut request = exchange();
        {
            let mut scope = CacheScope::new(&mut request);
            set_cache(&mut *scope, adapter("/inner"), Some(policy()));
            assert!(scope.matchable_router().is_some());
            assert!(scope.cors_configuration().is_some());
        }
        assert!(CacheSnapshot::capture(&request).is_empty());
    }

    #[test]
    fn test_nested_scopes_restore_outer_values() {
        let mut request = exchange();
        let mut outer = CacheScope::new(&mut request);
        set_cache(&mut *outer, adapter("/outer"), None);
        let outer_router = outer.attribute(MATCHABLE_ROUTER_ATTRIBUTE).unwrap();
        let outer_cors = outer.attribute(CORS_CONFIG_ATTRIBUTE).unwrap();

        {
            let mut inner = CacheScope::new(&mut *outer);
            set_cache(&mut *inner, adapter("/inner"), Some(policy()));
            assert_eq!(inner.matchable_router().unwrap().lookup_path().as_str(), "/inner");
        }

        assert!(Arc::ptr_eq(&outer.attribute(MATCHABLE_ROUTER_ATTRIBUTE).unwrap(), &outer_router));
        assert!(Arc::ptr_eq(&outer.attribute(CORS_CONFIG_ATTRIBUTE).unwrap(), &outer_cors));

        drop(outer);
        assert!(CacheSnapshot::capture(&request).is_empty());
    }

    #[test]
    fn test_scope_restores_on_unwind() {
        let mut request = exchange();
        set_cache(&mut request, adapter("/before"), None);

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut scope = CacheScope::new(&mut request);
            clear_cache(&mut *scope);
            panic!("downstream failed");
        }));

        assert_eq!(cached_router(&request).unwrap().lookup_path().as_str(), "/before");
    }
}
