//! Listeners keyed by canonical path, plus subscriptions waiting for their
//! query to resolve.
use indexmap::IndexMap;

use super::listener::Handler;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    pub handler: Handler,
    /// The query the handler was subscribed with.
    pub query: String,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    paths: IndexMap<String, Vec<Entry>>,
    pending: Vec<Entry>,
}

impl Registry {
    /// Register `handler` under a canonical path. Returns `false` if it was
    /// already registered there.
    pub fn add(&mut self, path: String, query: &str, handler: Handler) -> bool {
        let entries = self.paths.entry(path).or_default();
        if entries.iter().any(|e| e.handler == handler) {
            return false;
        }

        entries.push(Entry {
            handler,
            query: query.to_owned(),
        });
        true
    }

    pub fn remove(&mut self, path: &str, handler: &Handler) -> bool {
        let Some(entries) = self.paths.get_mut(path) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|e| &e.handler != handler);
        let removed = entries.len() != before;

        if entries.is_empty() {
            self.paths.shift_remove(path);
        }

        removed
    }

    pub fn add_pending(&mut self, query: &str, handler: Handler) {
        if !self
            .pending
            .iter()
            .any(|e| e.query == query && e.handler == handler)
        {
            self.pending.push(Entry {
                handler,
                query: query.to_owned(),
            });
        }
    }

    pub fn remove_pending(&mut self, query: &str, handler: &Handler) -> bool {
        let before = self.pending.len();
        self.pending
            .retain(|e| !(e.query == query && &e.handler == handler));
        self.pending.len() != before
    }

    pub fn take_pending(&mut self) -> Vec<Entry> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// A snapshot of the handlers registered at `path`.
    pub fn handlers(&self, path: &str) -> Vec<Handler> {
        self.paths
            .get(path)
            .map(|entries| entries.iter().map(|e| e.handler.clone()).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains_key(path)
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.keys().cloned().collect()
    }
}
