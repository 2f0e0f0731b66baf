use std::{collections::HashMap, fmt, sync::Arc};

use crate::{handlers::api_user_token, Error, Handler};

/// Derives a handler identifier from a request-target: leading and trailing
/// slashes are stripped and the remaining slashes become underscores, so
/// `/api/user/token` maps to `api_user_token`. A query string stays in the
/// identifier.
pub fn handler_id(path: &str) -> String {
    path.trim_matches('/').replace('/', "_")
}

/// A fixed table of handlers keyed by identifier. Built once before the
/// server starts and shared read-only between connections.
#[derive(Clone, Default)]
pub struct Registry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl Registry {
    /// Creates an empty registry. Every request against it fails with
    /// [Error::HandlerNotFound].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry containing the stock handlers, currently only
    /// `api_user_token`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("api_user_token", api_user_token);
        registry
    }

    /// Registers a handler under the given identifier, replacing any handler
    /// previously registered under it.
    pub fn register<H: Handler + 'static>(
        &mut self,
        id: impl Into<String>,
        handler: H,
    ) -> &mut Self {
        self.handlers.insert(id.into(), Arc::new(handler));
        self
    }

    /// Registers a handler under the identifier derived from `path`.
    pub fn route<H: Handler + 'static>(&mut self, path: &str, handler: H) -> &mut Self {
        self.register(handler_id(path), handler)
    }

    /// Looks up the handler for a URL path.
    pub fn resolve(&self, path: &str) -> Result<Arc<dyn Handler>, Error> {
        let id = handler_id(path);
        match self.handlers.get(&id) {
            Some(handler) => Ok(handler.clone()),
            None => Err(Error::HandlerNotFound { id }),
        }
    }

    /// Returns the registered identifiers in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("handlers", &self.ids())
            .finish()
    }
}
