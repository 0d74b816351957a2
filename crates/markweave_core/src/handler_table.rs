//! Keyed handler tables used by plugins that dispatch on a string key.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// Handlers keyed by a case-insensitive name.
///
/// Keys are stored lowercase. Inserting an existing key replaces its
/// handler.
pub struct HandlerTable<H: ?Sized> {
    handlers: HashMap<String, Arc<H>>,
}

impl<H: ?Sized> HandlerTable<H> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` under `key`, returning the handler it replaced.
    pub fn insert(&mut self, key: &str, handler: Arc<H>) -> Option<Arc<H>> {
        let key = key.to_lowercase();
        let previous = self.handlers.insert(key.clone(), handler);
        if previous.is_some() {
            debug!(key = %key, "Handler overridden");
        }
        previous
    }

    pub fn get(&self, key: &str) -> Option<&H> {
        self.handlers
            .get(&key.to_lowercase())
            .map(|handler| handler.as_ref())
    }

    pub fn remove(&mut self, key: &str) -> Option<Arc<H>> {
        self.handlers.remove(&key.to_lowercase())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.handlers.contains_key(&key.to_lowercase())
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<H: ?Sized> Default for HandlerTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> Clone for HandlerTable<H> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<H: ?Sized> fmt::Debug for HandlerTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("keys", &self.keys())
            .finish()
    }
}
