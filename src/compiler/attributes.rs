//! Output attribute and association value objects
//!
//! These describe one element, attribute or association of a constructed
//! type after its classifier has been resolved. They carry no behavior
//! beyond construction and a few derived properties.

use super::cardinality::Cardinality;
use super::choice::ChoiceGroup;
use crate::namespaces::TypeRef;
use crate::schema::facets::Facet;
use crate::schema::primitives::PrimitiveType;

/// Whether an attribute is structural content or meta-data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Emitted as a child element / object property
    Content,
    /// Emitted as an XML attribute / sibling property
    Supplementary,
}

/// One resolved attribute of a constructed type or classifier
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaAttribute {
    /// Content or supplementary
    pub kind: AttributeKind,
    /// Output name
    pub name: String,
    /// Type the attribute refers to
    pub type_ref: TypeRef,
    /// Dialect primitive, when `type_ref` points at one
    pub primitive: Option<PrimitiveType>,
    /// Occurrence bounds
    pub cardinality: Cardinality,
    /// Default value
    pub default_value: Option<String>,
    /// Fixed value
    pub fixed_value: Option<String>,
    /// Ordering key, 0 when unset
    pub sequence_key: u32,
    /// Choice group membership
    pub choice: Option<ChoiceGroup>,
    /// Documentation text
    pub documentation: String,
    /// Facets restricting a primitive type inline
    pub restriction: Vec<Facet>,
}

impl SchemaAttribute {
    /// A content attribute
    pub fn content(name: impl Into<String>, type_ref: TypeRef, cardinality: Cardinality) -> Self {
        Self {
            kind: AttributeKind::Content,
            name: name.into(),
            type_ref,
            primitive: None,
            cardinality,
            default_value: None,
            fixed_value: None,
            sequence_key: 0,
            choice: None,
            documentation: String::new(),
            restriction: Vec::new(),
        }
    }

    /// A supplementary attribute; supplementaries never repeat
    pub fn supplementary(name: impl Into<String>, type_ref: TypeRef, optional: bool) -> Self {
        let cardinality = if optional {
            Cardinality::OPTIONAL
        } else {
            Cardinality::ONE
        };
        Self {
            kind: AttributeKind::Supplementary,
            ..Self::content(name, type_ref, cardinality)
        }
    }

    /// Record the dialect primitive the type refers to
    pub fn with_primitive(mut self, primitive: Option<PrimitiveType>) -> Self {
        self.primitive = primitive;
        self
    }

    /// Set default and fixed values
    pub fn with_values(mut self, default_value: Option<String>, fixed_value: Option<String>) -> Self {
        self.default_value = default_value;
        self.fixed_value = fixed_value;
        self
    }

    /// Set the ordering key
    pub fn with_sequence(mut self, sequence_key: u32) -> Self {
        self.sequence_key = sequence_key;
        self
    }

    /// Set the choice group
    pub fn with_choice(mut self, choice: Option<ChoiceGroup>) -> Self {
        self.choice = choice;
        self
    }

    /// Set documentation
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    /// Set the inline restriction facets
    pub fn with_restriction(mut self, restriction: Vec<Facet>) -> Self {
        self.restriction = restriction;
        self
    }

    /// Whether the attribute may be omitted
    pub fn is_optional(&self) -> bool {
        self.cardinality.is_optional()
    }

    /// Whether the attribute is meta-data
    pub fn is_supplementary(&self) -> bool {
        self.kind == AttributeKind::Supplementary
    }
}

/// One resolved association to a constructed type
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaAssociation {
    /// Element name (role name of the association end)
    pub name: String,
    /// Constructed type of the target class
    pub type_ref: TypeRef,
    /// Occurrence bounds
    pub cardinality: Cardinality,
    /// Ordering key, 0 when unset
    pub sequence_key: u32,
    /// Choice group membership
    pub choice: Option<ChoiceGroup>,
    /// Documentation text
    pub documentation: String,
}

impl SchemaAssociation {
    /// Create an association
    pub fn new(name: impl Into<String>, type_ref: TypeRef, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            type_ref,
            cardinality,
            sequence_key: 0,
            choice: None,
            documentation: String::new(),
        }
    }

    /// Set the ordering key
    pub fn with_sequence(mut self, sequence_key: u32) -> Self {
        self.sequence_key = sequence_key;
        self
    }

    /// Set the choice group
    pub fn with_choice(mut self, choice: Option<ChoiceGroup>) -> Self {
        self.choice = choice;
        self
    }

    /// Set documentation
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    /// Whether the association may be omitted
    pub fn is_optional(&self) -> bool {
        self.cardinality.is_optional()
    }
}

/// One literal of an enumerated classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumItem {
    /// Literal value
    pub value: String,
    /// Documentation text
    pub documentation: String,
}

impl EnumItem {
    /// Create a literal
    pub fn new(value: impl Into<String>, documentation: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            documentation: documentation.into(),
        }
    }
}
