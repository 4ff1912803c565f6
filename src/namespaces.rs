//! Namespace handling
//!
//! This module provides prefixed type references and the token → URI
//! mappings each emitted schema declares.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::fmt;

/// Namespace URI
pub type NamespaceUri = String;

/// Namespace token (prefix)
pub type Prefix = String;

/// Reference to a type definition, written `prefix:localName`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Namespace token; empty for no prefix
    pub prefix: Prefix,
    /// Local type name
    pub local_name: String,
    /// Whether the target is a dialect primitive rather than an emitted definition
    pub primitive: bool,
}

impl TypeRef {
    /// Reference to an emitted definition
    pub fn new(prefix: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            local_name: local_name.into(),
            primitive: false,
        }
    }

    /// Reference to a dialect primitive
    pub fn primitive(prefix: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            local_name: local_name.into(),
            primitive: true,
        }
    }

    /// Parse a `prefix:localName` string
    pub fn parse(qualified: &str) -> Self {
        match qualified.split_once(':') {
            Some((prefix, local)) => Self::new(prefix, local),
            None => Self::new("", qualified),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}", self.local_name)
        } else {
            write!(f, "{}:{}", self.prefix, self.local_name)
        }
    }
}

/// Ordered token → namespace URI declarations of one schema
#[derive(Debug, Clone, Default)]
pub struct NamespaceMap {
    prefixes: IndexMap<Prefix, NamespaceUri>,
}

impl NamespaceMap {
    /// Create a new empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a token. Re-declaring the same binding is a no-op; binding a
    /// token to a second URI is an error.
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Result<()> {
        let prefix = prefix.into();
        let namespace = namespace.into();
        match self.prefixes.get(&prefix) {
            Some(existing) if *existing == namespace => Ok(()),
            Some(existing) => Err(Error::Namespace(format!(
                "token '{}' already bound to '{}', cannot rebind to '{}'",
                prefix, existing, namespace
            ))),
            None => {
                self.prefixes.insert(prefix, namespace);
                Ok(())
            }
        }
    }

    /// Get the namespace for a token
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Get the token bound to a namespace
    pub fn get_prefix(&self, namespace: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(_, ns)| ns.as_str() == namespace)
            .map(|(p, _)| p.as_str())
    }

    /// Iterate over declarations in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    /// Absorb declarations from another map
    pub fn merge(&mut self, other: &NamespaceMap) -> Result<()> {
        for (prefix, ns) in other.iter() {
            self.add_prefix(prefix, ns)?;
        }
        Ok(())
    }

    /// Number of declarations
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// Whether nothing is declared
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

/// Check that a namespace is a usable identifier: absolute URLs must parse,
/// URNs and relative names only need to be non-empty and whitespace free.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() || namespace.contains(char::is_whitespace) {
        return Err(Error::Namespace(format!("invalid namespace '{}'", namespace)));
    }
    if namespace.contains("://") {
        url::Url::parse(namespace)
            .map_err(|e| Error::Namespace(format!("invalid namespace '{}': {}", namespace, e)))?;
    }
    Ok(())
}
