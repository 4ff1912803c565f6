//! Dialect-independent schema document
//!
//! Backends collect definitions here; only [`super::Schema::save`] looks at
//! the dialect. The document keeps insertion order until [`SchemaDocument::sort`]
//! is called.

use indexmap::IndexMap;
use std::cmp::Ordering;

use super::facets::Facet;
use super::primitives::PrimitiveType;
use crate::compiler::attributes::{EnumItem, SchemaAssociation, SchemaAttribute};
use crate::compiler::cardinality::Cardinality;
use crate::compiler::choice::Choice;
use crate::error::{Error, Result};
use crate::namespaces::{NamespaceMap, TypeRef};

// =============================================================================
// Definitions
// =============================================================================

/// A restricted primitive
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleClassifier {
    /// Type name
    pub name: String,
    /// Documentation text
    pub documentation: String,
    /// Base primitive, after substitutions
    pub primitive: PrimitiveType,
    /// Applicable facets
    pub facets: Vec<Facet>,
}

/// Primitive content with supplementary attributes
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexClassifier {
    /// Type name
    pub name: String,
    /// Documentation text
    pub documentation: String,
    /// Base primitive, after substitutions
    pub primitive: PrimitiveType,
    /// Facets restricting the content
    pub facets: Vec<Facet>,
    /// Meta-data attributes
    pub supplementaries: Vec<SchemaAttribute>,
}

/// Enumerated literals
#[derive(Debug, Clone, PartialEq)]
pub struct EnumClassifier {
    /// Type name
    pub name: String,
    /// Documentation text
    pub documentation: String,
    /// Primitive of the literals
    pub primitive: PrimitiveType,
    /// Literals in declaration order
    pub items: Vec<EnumItem>,
    /// Meta-data attributes
    pub supplementaries: Vec<SchemaAttribute>,
}

/// A type defined in another schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalClassifier {
    /// Local type name wrapping the reference
    pub name: String,
    /// Documentation text
    pub documentation: String,
    /// Namespace of the external schema
    pub namespace: String,
    /// Token the external namespace is bound to
    pub namespace_token: String,
    /// Location of the external schema
    pub schema_name: String,
    /// Referenced declaration in the external schema
    pub base_type: String,
    /// Occurrence bounds of the reference
    pub cardinality: Cardinality,
}

impl ExternalClassifier {
    /// Reference to the external declaration
    pub fn base_ref(&self) -> TypeRef {
        TypeRef::new(self.namespace_token.clone(), self.base_type.clone())
    }
}

/// A constructed type (aggregate) built from a class
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AbieType {
    /// Type name
    pub name: String,
    /// Documentation text
    pub documentation: String,
    /// Content attributes outside any choice
    pub content: Vec<SchemaAttribute>,
    /// Meta-data attributes
    pub supplementaries: Vec<SchemaAttribute>,
    /// Associations outside any choice
    pub associations: Vec<SchemaAssociation>,
    /// Choices between alternatives
    pub choices: Vec<Choice>,
}

/// One ordered particle of a constructed type
#[derive(Debug, Clone, Copy)]
pub enum Particle<'a> {
    /// A content attribute
    Attribute(&'a SchemaAttribute),
    /// An association
    Association(&'a SchemaAssociation),
    /// A choice
    Choice(&'a Choice),
}

impl<'a> Particle<'a> {
    fn sort_key(&self) -> (u32, &'a str) {
        match *self {
            Particle::Attribute(a) => (a.sequence_key, a.name.as_str()),
            Particle::Association(a) => (a.sequence_key, a.name.as_str()),
            Particle::Choice(c) => (c.sequence_key(), c.id()),
        }
    }
}

impl AbieType {
    /// Content, associations and choices in emission order
    pub fn particles(&self) -> Vec<Particle<'_>> {
        let mut particles: Vec<Particle<'_>> = self
            .content
            .iter()
            .map(Particle::Attribute)
            .chain(self.associations.iter().map(Particle::Association))
            .chain(self.choices.iter().map(Particle::Choice))
            .collect();
        particles.sort_by(|a, b| {
            let (ka, na) = a.sort_key();
            let (kb, nb) = b.sort_key();
            compare_sequence(ka, kb).then_with(|| na.cmp(nb))
        });
        particles
    }
}

/// A global element declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDecl {
    /// Element name
    pub name: String,
    /// Type of the element
    pub type_ref: TypeRef,
    /// Documentation text
    pub documentation: String,
    /// Ordering key, 0 when unset
    pub sequence_key: u32,
}

/// Any top-level definition
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// Restricted primitive
    Simple(SimpleClassifier),
    /// Primitive content with supplementary attributes
    Complex(ComplexClassifier),
    /// Enumerated literals
    Enum(EnumClassifier),
    /// Reference to an external declaration
    External(ExternalClassifier),
    /// Constructed type
    Abie(AbieType),
}

impl Definition {
    /// Type name
    pub fn name(&self) -> &str {
        match self {
            Definition::Simple(d) => &d.name,
            Definition::Complex(d) => &d.name,
            Definition::Enum(d) => &d.name,
            Definition::External(d) => &d.name,
            Definition::Abie(d) => &d.name,
        }
    }
}

/// A top-level component of the document
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// Global element
    Element(ElementDecl),
    /// Type definition
    Type(Definition),
}

impl Component {
    /// Element or type name
    pub fn name(&self) -> &str {
        match self {
            Component::Element(e) => &e.name,
            Component::Type(d) => d.name(),
        }
    }

    /// Whether this is a global element
    pub fn is_element(&self) -> bool {
        matches!(self, Component::Element(_))
    }

    /// Ordering key, 0 when unset
    pub fn sequence_key(&self) -> u32 {
        match self {
            Component::Element(e) => e.sequence_key,
            Component::Type(_) => 0,
        }
    }
}

/// Compare two sequence keys: lower non-zero keys first, unset (0) last
pub fn compare_sequence(a: u32, b: u32) -> Ordering {
    match (a, b) {
        (0, 0) => Ordering::Equal,
        (0, _) => Ordering::Greater,
        (_, 0) => Ordering::Less,
        _ => a.cmp(&b),
    }
}

/// Canonical component order: elements before types, then sequence key,
/// then name
pub fn compare_components(a: &Component, b: &Component) -> Ordering {
    b.is_element()
        .cmp(&a.is_element())
        .then_with(|| compare_sequence(a.sequence_key(), b.sequence_key()))
        .then_with(|| a.name().cmp(b.name()))
}

// =============================================================================
// Schema Document
// =============================================================================

/// Definitions, declarations and references of one schema
#[derive(Debug, Clone, Default)]
pub struct SchemaDocument {
    components: Vec<Component>,
    namespaces: NamespaceMap,
    references: IndexMap<String, String>,
}

impl SchemaDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    fn existing(&self, component: &Component) -> Option<&Component> {
        self.components
            .iter()
            .find(|c| c.is_element() == component.is_element() && c.name() == component.name())
    }

    /// Add a component unless the same one is already present
    ///
    /// Returns whether it was added. A different component of the same kind
    /// and name fails with [`Error::ConflictingDefinition`].
    pub fn add(&mut self, component: Component) -> Result<bool> {
        match self.existing(&component) {
            Some(existing) if *existing == component => {
                tracing::trace!(name = component.name(), "component already defined");
                Ok(false)
            }
            Some(_) => {
                tracing::warn!(name = component.name(), "conflicting definition");
                Err(Error::ConflictingDefinition {
                    name: component.name().to_string(),
                })
            }
            None => {
                self.components.push(component);
                Ok(true)
            }
        }
    }

    /// Add a type definition
    pub fn add_definition(&mut self, definition: Definition) -> Result<bool> {
        self.add(Component::Type(definition))
    }

    /// Add a global element
    pub fn add_element(&mut self, element: ElementDecl) -> Result<bool> {
        self.add(Component::Element(element))
    }

    /// Declare a namespace token
    pub fn add_namespace(&mut self, token: &str, uri: &str) -> Result<()> {
        self.namespaces.add_prefix(token, uri)
    }

    /// Reference another schema document; the first location wins
    pub fn add_reference(&mut self, namespace: &str, location: &str) {
        self.references
            .entry(namespace.to_string())
            .or_insert_with(|| location.to_string());
    }

    /// Absorb another document, skipping components already present here
    pub fn absorb(&mut self, other: SchemaDocument) -> Result<()> {
        self.namespaces.merge(&other.namespaces)?;
        for (namespace, location) in other.references {
            self.references.entry(namespace).or_insert(location);
        }
        for component in other.components {
            self.add(component)?;
        }
        Ok(())
    }

    /// Sort components into canonical order
    pub fn sort(&mut self) {
        self.components.sort_by(compare_components);
    }

    /// Components in current order
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Type definition by name
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.components.iter().find_map(|c| match c {
            Component::Type(d) if d.name() == name => Some(d),
            _ => None,
        })
    }

    /// Global element by name
    pub fn element(&self, name: &str) -> Option<&ElementDecl> {
        self.components.iter().find_map(|c| match c {
            Component::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// Declared namespace tokens
    pub fn namespaces(&self) -> &NamespaceMap {
        &self.namespaces
    }

    /// Referenced schemas, namespace → location
    pub fn references(&self) -> impl Iterator<Item = (&str, &str)> {
        self.references.iter().map(|(n, l)| (n.as_str(), l.as_str()))
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the document is empty
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Dialect;
    use pretty_assertions::assert_eq;

    fn simple(name: &str) -> Definition {
        Definition::Simple(SimpleClassifier {
            name: name.to_string(),
            documentation: String::new(),
            primitive: PrimitiveType::new(Dialect::Xml, "string").unwrap(),
            facets: Vec::new(),
        })
    }

    fn element(name: &str, key: u32) -> ElementDecl {
        ElementDecl {
            name: name.to_string(),
            type_ref: TypeRef::new("tns", name),
            documentation: String::new(),
            sequence_key: key,
        }
    }

    #[test]
    fn test_compare_sequence() {
        assert_eq!(compare_sequence(1, 2), Ordering::Less);
        assert_eq!(compare_sequence(0, 2), Ordering::Greater);
        assert_eq!(compare_sequence(3, 0), Ordering::Less);
        assert_eq!(compare_sequence(0, 0), Ordering::Equal);
    }

    #[test]
    fn test_sort_elements_first() {
        let mut doc = SchemaDocument::new();
        doc.add_definition(simple("Code")).unwrap();
        doc.add_element(element("Unordered", 0)).unwrap();
        doc.add_definition(simple("Amount")).unwrap();
        doc.add_element(element("Second", 2)).unwrap();
        doc.add_element(element("First", 1)).unwrap();
        doc.sort();

        let names: Vec<&str> = doc.components().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["First", "Second", "Unordered", "Amount", "Code"]);
    }

    #[test]
    fn test_identical_definition_skipped() {
        let mut doc = SchemaDocument::new();
        assert!(doc.add_definition(simple("Code")).unwrap());
        assert!(!doc.add_definition(simple("Code")).unwrap());
        // elements and types live in separate symbol spaces
        assert!(doc.add_element(element("Code", 0)).unwrap());
        assert!(!doc.add_element(element("Code", 0)).unwrap());
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_different_definition_same_name_conflicts() {
        let mut doc = SchemaDocument::new();
        doc.add_definition(simple("Code")).unwrap();

        let integer = Definition::Simple(SimpleClassifier {
            name: "Code".to_string(),
            documentation: String::new(),
            primitive: PrimitiveType::new(Dialect::Xml, "integer").unwrap(),
            facets: Vec::new(),
        });
        let err = doc.add_definition(integer).unwrap_err();
        assert!(matches!(err, Error::ConflictingDefinition { ref name } if name == "Code"));
        assert_eq!(doc.len(), 1);

        doc.add_element(element("Root", 1)).unwrap();
        let retyped = ElementDecl {
            type_ref: TypeRef::new("tns", "Other"),
            ..element("Root", 1)
        };
        assert!(doc.add_element(retyped).is_err());
    }

    #[test]
    fn test_absorb() {
        let mut a = SchemaDocument::new();
        a.add_definition(simple("Code")).unwrap();
        a.add_namespace("tns", "urn:a").unwrap();

        let mut b = SchemaDocument::new();
        b.add_definition(simple("Code")).unwrap();
        b.add_definition(simple("Amount")).unwrap();
        b.add_namespace("cmn", "urn:common").unwrap();
        b.add_reference("urn:common", "cmn.xsd");

        a.absorb(b).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a.namespaces().get_namespace("cmn"), Some("urn:common"));
        assert_eq!(a.references().count(), 1);
    }

    #[test]
    fn test_absorb_conflicting_token_fails() {
        let mut a = SchemaDocument::new();
        a.add_namespace("tns", "urn:a").unwrap();
        let mut b = SchemaDocument::new();
        b.add_namespace("tns", "urn:b").unwrap();
        assert!(a.absorb(b).is_err());
    }

    #[test]
    fn test_particles_order() {
        let string = TypeRef::primitive("xs", "string");
        let abie = AbieType {
            name: "Order".to_string(),
            content: vec![
                SchemaAttribute::content("note", string.clone(), Cardinality::OPTIONAL),
                SchemaAttribute::content("id", string.clone(), Cardinality::ONE).with_sequence(1),
            ],
            associations: vec![SchemaAssociation::new(
                "line",
                TypeRef::new("tns", "OrderLine"),
                Cardinality::ANY,
            )
            .with_sequence(2)],
            ..Default::default()
        };
        let names: Vec<&str> = abie
            .particles()
            .iter()
            .map(|p| p.sort_key().1)
            .collect();
        assert_eq!(names, vec!["id", "line", "note"]);
    }
}
