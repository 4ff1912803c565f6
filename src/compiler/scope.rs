//! Schema and documentation scopes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural level at which a classifier or class name must be unique
///
/// Ordered from broadest to narrowest visibility. `Common` and `Remote`
/// share the broadest rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaScope {
    /// Shared type library
    Common,
    /// Types owned by another interface
    Remote,
    /// Visible to the whole interface
    Interface,
    /// Visible to every operation using a profile
    Profile,
    /// Local to one operation
    Operation,
    /// Local to one message
    Message,
}

impl SchemaScope {
    /// Visibility rank, 0 being the broadest
    pub fn rank(self) -> u8 {
        match self {
            SchemaScope::Common | SchemaScope::Remote => 0,
            SchemaScope::Interface => 1,
            SchemaScope::Profile => 2,
            SchemaScope::Operation => 3,
            SchemaScope::Message => 4,
        }
    }

    /// The scope used for qualified naming: Remote and Common behave as Interface
    pub fn for_naming(self) -> Self {
        match self {
            SchemaScope::Remote | SchemaScope::Common => SchemaScope::Interface,
            other => other,
        }
    }

    /// Whether definitions at this scope belong in the common schema (when one exists)
    pub fn targets_common(self) -> bool {
        matches!(
            self,
            SchemaScope::Common | SchemaScope::Remote | SchemaScope::Interface | SchemaScope::Profile
        )
    }

    /// Scope a member of a shared type at `owner` scope is resolved under
    ///
    /// A type in the common schema may only refer to common definitions, so
    /// operation and message scopes are widened to the owner's scope.
    pub fn widened_to(self, owner: SchemaScope) -> Self {
        if owner.targets_common() && !self.targets_common() {
            owner
        } else {
            self
        }
    }

    /// Lower-case name, as used in cache keys and configuration
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaScope::Common => "common",
            SchemaScope::Remote => "remote",
            SchemaScope::Interface => "interface",
            SchemaScope::Profile => "profile",
            SchemaScope::Operation => "operation",
            SchemaScope::Message => "message",
        }
    }
}

impl Default for SchemaScope {
    fn default() -> Self {
        SchemaScope::Interface
    }
}

impl fmt::Display for SchemaScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where documentation for a definition is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocScope {
    /// Shared documentation context
    #[default]
    Common,
    /// Documentation local to the current operation
    Local,
}

impl fmt::Display for DocScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocScope::Common => write!(f, "common"),
            DocScope::Local => write!(f, "local"),
        }
    }
}

/// The (SchemaScope, DocScope) pair a classifier is resolved under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScopePair {
    /// Schema visibility
    pub schema: SchemaScope,
    /// Documentation visibility
    pub doc: DocScope,
}

impl ScopePair {
    /// Create a new scope pair
    pub fn new(schema: SchemaScope, doc: DocScope) -> Self {
        Self { schema, doc }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_ordering() {
        assert_eq!(SchemaScope::Common.rank(), SchemaScope::Remote.rank());
        assert!(SchemaScope::Interface.rank() < SchemaScope::Profile.rank());
        assert!(SchemaScope::Profile.rank() < SchemaScope::Operation.rank());
        assert!(SchemaScope::Operation.rank() < SchemaScope::Message.rank());
    }

    #[test]
    fn test_remote_named_as_interface() {
        assert_eq!(SchemaScope::Remote.for_naming(), SchemaScope::Interface);
        assert_eq!(SchemaScope::Message.for_naming(), SchemaScope::Message);
    }

    #[test]
    fn test_targets_common() {
        assert!(SchemaScope::Profile.targets_common());
        assert!(SchemaScope::Remote.targets_common());
        assert!(!SchemaScope::Operation.targets_common());
        assert!(!SchemaScope::Message.targets_common());
    }

    #[test]
    fn test_widened_to_shared_owner() {
        assert_eq!(SchemaScope::Operation.widened_to(SchemaScope::Interface), SchemaScope::Interface);
        assert_eq!(SchemaScope::Message.widened_to(SchemaScope::Profile), SchemaScope::Profile);
        assert_eq!(SchemaScope::Common.widened_to(SchemaScope::Interface), SchemaScope::Common);
        // Local owners may use anything
        assert_eq!(SchemaScope::Message.widened_to(SchemaScope::Operation), SchemaScope::Message);
    }

    #[test]
    fn test_scope_deserialize() {
        let scope: SchemaScope = serde_json::from_str("\"message\"").unwrap();
        assert_eq!(scope, SchemaScope::Message);
        let doc: DocScope = serde_json::from_str("\"local\"").unwrap();
        assert_eq!(doc, DocScope::Local);
    }
}
