//! Scope-sensitive qualified class names
//!
//! The same class may be used at several structural levels. Names are
//! disambiguated by prefixing package and role names at message scope and
//! the profile name at profile scope, so that two messages can carry
//! different shapes of the same class without colliding.

use super::scope::SchemaScope;
use crate::config::NamingConfig;
use crate::model::ClassNode;
use crate::names::is_marked_with;
use crate::namespaces::TypeRef;

/// Computes `token:Name` references for classes
#[derive(Debug, Clone)]
pub struct QualifiedNameResolver<'c> {
    naming: &'c NamingConfig,
    common_token: Option<String>,
    local_token: String,
    role: String,
}

impl<'c> QualifiedNameResolver<'c> {
    /// Create a resolver for one message role
    pub fn new(
        naming: &'c NamingConfig,
        common_token: Option<&str>,
        local_token: &str,
        role: &str,
    ) -> Self {
        Self {
            naming,
            common_token: common_token.map(str::to_string),
            local_token: local_token.to_string(),
            role: role.to_string(),
        }
    }

    /// Token of the schema a class at `scope` is emitted into
    pub fn namespace_token(&self, scope: SchemaScope) -> &str {
        match (&self.common_token, scope.for_naming()) {
            (Some(common), SchemaScope::Interface | SchemaScope::Profile) => common,
            _ => &self.local_token,
        }
    }

    /// Disambiguated local name of `class` at `scope`
    pub fn local_name(&self, class: &ClassNode, scope: SchemaScope) -> String {
        let base = class.display_name();
        let package = &class.package;
        match scope.for_naming() {
            SchemaScope::Message => {
                let mut name = base.to_string();
                if !package.name.is_empty()
                    && package.name != self.naming.service_model_package
                    && !package.name.eq_ignore_ascii_case(&self.role)
                {
                    name = format!("{}{}", package.name, name);
                }
                if !is_marked_with(&name, &self.role) {
                    name = format!("{}{}", self.role, name);
                }
                name
            }
            SchemaScope::Profile
                if package.has_stereotype(&self.naming.profile_stereotype)
                    && !package.name.eq_ignore_ascii_case(&self.naming.basic_profile) =>
            {
                format!("{}{}", package.name, base)
            }
            _ => base.to_string(),
        }
    }

    /// Qualified reference of `class` at `scope`
    pub fn qualified_type_ref(&self, class: &ClassNode, scope: SchemaScope) -> TypeRef {
        TypeRef::new(self.namespace_token(scope), self.local_name(class, scope))
    }

    /// Qualified name of `class` at `scope`, written `token:Name`
    pub fn qualified_class_name(&self, class: &ClassNode, scope: SchemaScope) -> String {
        self.qualified_type_ref(class, scope).to_string()
    }
}
