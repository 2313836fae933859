//! The ordered, build-once list of routers an introspector consults.

use crate::context::RouterContext;
use crate::pattern_cache::PathPatternMatchableRouter;
use archimedes_config::IntrospectionConfig;
use archimedes_core::{RoutingError, RoutingResult};
use archimedes_router::Router;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

/// A router together with its parsed-path matching wrapper, if it has one.
#[derive(Debug, Clone)]
pub struct RegisteredRouter {
    router: Arc<dyn Router>,
    path_patterns: Option<Arc<PathPatternMatchableRouter>>,
}

impl RegisteredRouter {
    fn new(router: Arc<dyn Router>, pattern_cache_limit: usize) -> Self {
        let path_patterns = PathPatternMatchableRouter::wrap(Arc::clone(&router), pattern_cache_limit).map(Arc::new);
        Self { router, path_patterns }
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Arc<dyn Router> {
        &self.router
    }

    /// Returns the parsed-path wrapper, present when the router declares a parser.
    #[must_use]
    pub fn path_patterns(&self) -> Option<&Arc<PathPatternMatchableRouter>> {
        self.path_patterns.as_ref()
    }

    /// Returns true if the router resolves against parsed paths.
    #[must_use]
    pub fn uses_parsed_path(&self) -> bool {
        self.path_patterns.is_some()
    }
}

/// Routers in the order they are consulted.
///
/// Built once by [`initialize`](Self::initialize); concurrent first callers
/// serialize on a lock and all observe the same completed list.
#[derive(Debug, Default)]
pub struct RouterRegistry {
    entries: OnceLock<Vec<RegisteredRouter>>,
    init_lock: Mutex<()>,
}

impl RouterRegistry {
    /// Creates an uninitialized registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discovers routers from `context` unless already done.
    ///
    /// Registered routers are sorted by order, ties keeping registration
    /// order. With no registered routers, the configured default kinds are
    /// built through the context's factories, in listed order. A failed
    /// build leaves the registry uninitialized.
    pub fn initialize(&self, context: &RouterContext, config: &IntrospectionConfig) -> RoutingResult<()> {
        if self.entries.get().is_some() {
            return Ok(());
        }

        let _guard = self.init_lock.lock();
        if self.entries.get().is_some() {
            return Ok(());
        }

        let routers = discover(context, config)?;
        let entries = routers
            .into_iter()
            .map(|router| RegisteredRouter::new(router, config.pattern_cache_limit))
            .collect();

        // Only this thread can set the cell while it holds the lock.
        let _ = self.entries.set(entries);
        Ok(())
    }

    /// Returns true once [`initialize`](Self::initialize) has succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.entries.get().is_some()
    }

    /// Returns the registered routers, or a state error before initialization.
    pub fn entries(&self) -> RoutingResult<&[RegisteredRouter]> {
        self.entries
            .get()
            .map(Vec::as_slice)
            .ok_or_else(|| RoutingError::illegal_state("router registry has not been initialized"))
    }

    /// Returns the routers in order; empty before initialization.
    #[must_use]
    pub fn routers(&self) -> Vec<Arc<dyn Router>> {
        self.entries
            .get()
            .map(|entries| entries.iter().map(|entry| Arc::clone(&entry.router)).collect())
            .unwrap_or_default()
    }
}

fn discover(context: &RouterContext, config: &IntrospectionConfig) -> RoutingResult<Vec<Arc<dyn Router>>> {
    let mut routers: Vec<Arc<dyn Router>> = context.routers().into_iter().map(|(_, router)| router).collect();

    if !routers.is_empty() {
        routers.sort_by_key(|router| router.order());
        tracing::info!(
            count = routers.len(),
            routers = ?routers.iter().map(|r| r.name()).collect::<Vec<_>>(),
            "Discovered routers"
        );
        return Ok(routers);
    }

    let kinds = config
        .default_router_kinds()
        .map_err(|e| RoutingError::configuration(format!("cannot load default routers: {e}")))?;

    let routers = kinds
        .iter()
        .map(|kind| context.create_router(kind))
        .collect::<RoutingResult<Vec<_>>>()?;

    tracing::info!(kinds = ?kinds, "No routers registered, using default routers");
    Ok(routers)
}
