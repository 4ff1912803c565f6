//! Documentation contexts
//!
//! The capability layer publishes documentation per scope: one shared
//! context for the common type library and one per operation.

use indexmap::IndexMap;

use super::scope::DocScope;

/// Documentation entries recorded while emitting one scope
#[derive(Debug, Clone, Default)]
pub struct DocContext {
    scope: DocScope,
    entries: IndexMap<String, String>,
}

impl DocContext {
    /// Create an empty context
    pub fn new(scope: DocScope) -> Self {
        Self {
            scope,
            entries: IndexMap::new(),
        }
    }

    /// Scope of this context
    pub fn scope(&self) -> DocScope {
        self.scope
    }

    /// Record documentation for `name`
    ///
    /// Empty text is ignored and the first registration wins. Returns whether
    /// the entry was recorded.
    pub fn register(&mut self, name: impl Into<String>, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let name = name.into();
        if self.entries.contains_key(&name) {
            return false;
        }
        tracing::trace!(scope = %self.scope, name = %name, "documentation registered");
        self.entries.insert(name, text.to_string());
        true
    }

    /// Documentation for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|s| s.as_str())
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
