//! Router discovery.
//!
//! A [`RouterContext`] holds the routers and handlers an application
//! registered, plus factories that can build routers by kind. Contexts form a
//! hierarchy: lookups fall through to the parent, and a local registration
//! shadows a parent registration with the same name.
//!
//! # Example
//!
//! ```rust
//! use archimedes_core::OperationHandler;
//! use archimedes_introspect::RouterContext;
//! use archimedes_router::PatternRouter;
//! use std::sync::Arc;
//!
//! let mut context = RouterContext::new();
//! context.register_router(
//!     "api",
//!     Arc::new(
//!         PatternRouter::builder("api")
//!             .route("/users/{id}", Arc::new(OperationHandler::new("getUser")))
//!             .build()
//!             .unwrap(),
//!     ),
//! );
//!
//! assert_eq!(context.routers().len(), 1);
//! ```

use archimedes_core::{Handler, RoutingError, RoutingResult};
use archimedes_router::{PathPatternParser, PatternRouter, Router};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds a router of one kind from a context.
pub type RouterFactory = Arc<dyn Fn(&RouterContext) -> RoutingResult<Arc<dyn Router>> + Send + Sync>;

/// Kind of the built-in router mapping handlers registered under `/`-prefixed names.
pub const HANDLER_NAME_ROUTER: &str = "handler-name";

/// Kind of the built-in, initially empty, parsed-path pattern router.
pub const PATH_PATTERN_ROUTER: &str = "path-pattern";

/// Registry of routers, handlers and router factories.
pub struct RouterContext {
    routers: IndexMap<String, Arc<dyn Router>>,
    handlers: IndexMap<String, Arc<dyn Handler>>,
    factories: HashMap<String, RouterFactory>,
    parent: Option<Arc<RouterContext>>,
}

impl Default for RouterContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterContext {
    /// Creates a root context with the built-in router factories.
    #[must_use]
    pub fn new() -> Self {
        let mut context = Self::empty();
        context.register_factory(HANDLER_NAME_ROUTER, handler_name_router);
        context.register_factory(PATH_PATTERN_ROUTER, |_context: &RouterContext| {
            let router = PatternRouter::builder(PATH_PATTERN_ROUTER)
                .parsed_paths(PathPatternParser::new())
                .build()?;
            Ok(Arc::new(router) as Arc<dyn Router>)
        });
        context
    }

    /// Creates a root context without any factories.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            routers: IndexMap::new(),
            handlers: IndexMap::new(),
            factories: HashMap::new(),
            parent: None,
        }
    }

    /// Creates a child context that falls back to `parent`.
    #[must_use]
    pub fn with_parent(parent: Arc<RouterContext>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::empty()
        }
    }

    /// Returns the parent context.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<RouterContext>> {
        self.parent.as_ref()
    }

    /// Registers a router, replacing any local router with the same name.
    pub fn register_router(&mut self, name: impl Into<String>, router: Arc<dyn Router>) {
        self.routers.insert(name.into(), router);
    }

    /// Registers a handler, replacing any local handler with the same name.
    pub fn register_handler(&mut self, name: impl Into<String>, handler: Arc<dyn Handler>) {
        self.handlers.insert(name.into(), handler);
    }

    /// Registers a factory for routers of `kind`.
    pub fn register_factory<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&RouterContext) -> RoutingResult<Arc<dyn Router>> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
    }

    /// Returns all visible routers by name, local registrations first.
    ///
    /// Parent routers whose name is registered locally are skipped.
    #[must_use]
    pub fn routers(&self) -> Vec<(String, Arc<dyn Router>)> {
        self.collect(|context| &context.routers)
    }

    /// Returns all visible handlers by name, local registrations first.
    #[must_use]
    pub fn handlers(&self) -> Vec<(String, Arc<dyn Handler>)> {
        self.collect(|context| &context.handlers)
    }

    /// Builds a router of `kind` with the nearest factory registered for it.
    pub fn create_router(&self, kind: &str) -> RoutingResult<Arc<dyn Router>> {
        let factory = self.factory(kind).ok_or_else(|| {
            RoutingError::configuration(format!("no router factory registered for kind '{kind}'"))
        })?;

        (**factory)(self).map_err(|e| {
            RoutingError::configuration(format!("failed to create default router '{kind}': {e}"))
        })
    }

    fn factory(&self, kind: &str) -> Option<&RouterFactory> {
        self.factories
            .get(kind)
            .or_else(|| self.parent.as_deref().and_then(|parent| parent.factory(kind)))
    }

    fn collect<T: Clone>(
        &self,
        select: impl Fn(&RouterContext) -> &IndexMap<String, T>,
    ) -> Vec<(String, T)> {
        let mut visible: IndexMap<String, T> = IndexMap::new();
        let mut context = Some(self);

        while let Some(current) = context {
            for (name, item) in select(current) {
                if !visible.contains_key(name) {
                    visible.insert(name.clone(), item.clone());
                }
            }
            context = current.parent.as_deref();
        }

        visible.into_iter().collect()
    }
}

impl fmt::Debug for RouterContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut factories: Vec<&String> = self.factories.keys().collect();
        factories.sort();

        f.debug_struct("RouterContext")
            .field("routers", &self.routers.keys().collect::<Vec<_>>())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("factories", &factories)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Maps every handler whose registered name is a path (`/...`) to that path.
fn handler_name_router(context: &RouterContext) -> RoutingResult<Arc<dyn Router>> {
    let router = context
        .handlers()
        .into_iter()
        .filter(|(name, _)| name.starts_with('/'))
        .fold(
            PatternRouter::builder(HANDLER_NAME_ROUTER).resolved_paths(),
            |builder, (name, handler)| builder.route(name, handler),
        )
        .build()?;

    Ok(Arc::new(router) as Arc<dyn Router>)
}
