//! Classifier resolution results

use super::scope::ScopePair;
use crate::schema::primitives::PrimitiveType;
use crate::namespaces::TypeRef;

/// Content-type category of a resolved classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentCategory {
    /// Restricted primitive
    Simple,
    /// Primitive content with supplementary attributes, or an external reference
    Complex,
    /// Enumerated values
    Enum,
    /// Could not be resolved; callers skip it and continue
    Unknown,
}

/// Where and how a classifier was emitted
///
/// Cached contexts are never rewritten. Callers that need a different name
/// variant derive it from a clone.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierContext {
    /// Content-type category
    pub category: ContentCategory,
    /// Emitted name (may be role-prefixed at Message scope)
    pub name: String,
    /// Scope pair the classifier was resolved under
    pub scope: ScopePair,
    /// Whether the definition lives in the common schema
    pub in_common_schema: bool,
    /// Namespace token of the schema holding the definition
    pub namespace_token: String,
    /// Primitive the classifier derives from
    pub primitive: Option<PrimitiveType>,
    /// The classifier is a bare primitive and was not emitted at all
    pub is_primitive: bool,
}

impl ClassifierContext {
    /// Context for a classifier that could not be resolved
    pub fn unknown(name: impl Into<String>, scope: ScopePair) -> Self {
        Self {
            category: ContentCategory::Unknown,
            name: name.into(),
            scope,
            in_common_schema: false,
            namespace_token: String::new(),
            primitive: None,
            is_primitive: false,
        }
    }

    /// Context for a bare primitive, which is referenced but never emitted
    pub fn primitive(primitive: PrimitiveType, scope: ScopePair) -> Self {
        Self {
            category: ContentCategory::Simple,
            name: primitive.base_type.to_string(),
            scope,
            in_common_schema: false,
            namespace_token: primitive.dialect.primitive_token().to_string(),
            primitive: Some(primitive),
            is_primitive: true,
        }
    }

    /// Reference to the emitted definition
    pub fn type_ref(&self) -> TypeRef {
        TypeRef {
            prefix: self.namespace_token.clone(),
            local_name: self.name.clone(),
            primitive: self.is_primitive,
        }
    }

    /// Whether the context can be referenced from content
    pub fn is_resolved(&self) -> bool {
        self.category != ContentCategory::Unknown
    }
}
