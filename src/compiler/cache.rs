//! Classifier and class memoization
//!
//! One [`ClassifierCache`] lives for exactly one generation session. It is
//! insert-once: a second insert under an existing key is a resolver bug and
//! fails with [`Error::DuplicateKey`] instead of overwriting.

use indexmap::IndexMap;

use super::context::ClassifierContext;
use crate::error::{Error, Result};

/// Session-scoped memo tables for classifier contexts and qualified class names
#[derive(Debug, Default)]
pub struct ClassifierCache {
    classifiers: IndexMap<String, ClassifierContext>,
    classes: IndexMap<String, String>,
}

impl ClassifierCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear both tables. Call at the start of each generation run, never mid-run.
    pub fn flush(&mut self) {
        tracing::debug!(
            classifiers = self.classifiers.len(),
            classes = self.classes.len(),
            "flushing classifier cache"
        );
        self.classifiers.clear();
        self.classes.clear();
    }

    /// Record the context produced for a classifier key
    pub fn add_classifier_context(
        &mut self,
        key: impl Into<String>,
        context: ClassifierContext,
    ) -> Result<()> {
        let key = key.into();
        if self.classifiers.contains_key(&key) {
            return Err(Error::DuplicateKey(key));
        }
        self.classifiers.insert(key, context);
        Ok(())
    }

    /// Record the qualified name produced for a class key
    pub fn add_qualified_class_name(
        &mut self,
        key: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<()> {
        let key = key.into();
        if self.classes.contains_key(&key) {
            return Err(Error::DuplicateKey(key));
        }
        self.classes.insert(key, name.into());
        Ok(())
    }

    /// The cached context, if any
    pub fn get_classifier_context(&self, key: &str) -> Option<&ClassifierContext> {
        self.classifiers.get(key)
    }

    /// The cached qualified name, or an empty string when absent
    pub fn get_qualified_class_name(&self, key: &str) -> &str {
        self.classes.get(key).map(|s| s.as_str()).unwrap_or("")
    }

    /// Whether a classifier key was already resolved
    pub fn has_classifier_key(&self, key: &str) -> bool {
        self.classifiers.contains_key(key)
    }

    /// Whether a class key was already named
    pub fn has_class_key(&self, key: &str) -> bool {
        self.classes.contains_key(key)
    }

    /// Number of cached classifier contexts
    pub fn classifier_count(&self) -> usize {
        self.classifiers.len()
    }

    /// Number of cached class names
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// All cached qualified class names, in insertion order
    pub fn qualified_class_names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.classes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
