//! Schema backends
//!
//! The compiler emits through the [`SchemaBackend`] contract. [`Schema`] is
//! the concrete backend for both supported dialects: definitions are
//! collected in a dialect-independent [`SchemaDocument`] and only
//! serialization, primitive translation and facet admission differ per
//! [`Dialect`].

pub mod document;
pub mod facets;
pub mod header;
pub mod json;
pub mod primitives;
pub mod xsd;

pub use document::{
    AbieType, ComplexClassifier, Component, Definition, ElementDecl, EnumClassifier,
    ExternalClassifier, SchemaDocument, SimpleClassifier,
};
pub use facets::{Facet, FacetToken};
pub use header::HeaderFields;
pub use primitives::PrimitiveType;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::names::validate_ncname;
use crate::namespaces::validate_namespace;

/// Concrete schema output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// XML Schema 1.0
    Xml,
    /// JSON Schema draft 2020-12
    Json,
}

impl Dialect {
    /// Token under which the dialect's primitives are referenced
    pub fn primitive_token(self) -> &'static str {
        match self {
            Dialect::Xml => xsd::PRIMITIVE_TOKEN,
            Dialect::Json => "",
        }
    }

    /// File extension of serialized documents
    pub fn extension(self) -> &'static str {
        match self {
            Dialect::Xml => "xsd",
            Dialect::Json => "json",
        }
    }

    /// Lower-case name
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Xml => "xml",
            Dialect::Json => "json",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Backend Contract
// =============================================================================

/// Operations every schema backend supports
pub trait SchemaBackend {
    /// Dialect of the backend
    fn dialect(&self) -> Dialect;

    /// Target namespace
    fn namespace(&self) -> &str;

    /// Token bound to the target namespace
    fn namespace_token(&self) -> &str;

    /// Document version
    fn version(&self) -> &str;

    // Every `add_*` below accepts a repeat of an identical definition and
    // fails with `Error::ConflictingDefinition` when the name is taken by a
    // different one.

    /// Define a restricted primitive
    fn add_simple_classifier(&mut self, classifier: SimpleClassifier) -> Result<()>;

    /// Define primitive content with supplementaries
    ///
    /// Returns the facets actually applied to the content; callers must use
    /// this list rather than the one they passed in.
    fn add_complex_classifier(&mut self, classifier: ComplexClassifier) -> Result<Vec<Facet>>;

    /// Define enumerated literals
    fn add_enum_classifier(&mut self, classifier: EnumClassifier) -> Result<()>;

    /// Define a reference to an external declaration
    fn add_external_classifier(&mut self, classifier: ExternalClassifier) -> Result<()>;

    /// Define a constructed type
    fn add_abie_type(&mut self, abie: AbieType) -> Result<()>;

    /// Declare a global element
    fn add_element(&mut self, element: ElementDecl) -> Result<()>;

    /// Bind a namespace token
    fn add_namespace(&mut self, token: &str, uri: &str) -> Result<()>;

    /// Reference another schema document
    fn add_schema_reference(&mut self, namespace: &str, location: &str);

    /// Absorb a schema of the same dialect
    fn merge(&mut self, other: Schema) -> Result<()>;

    /// Put components into canonical order
    fn sort(&mut self);

    /// Serialize with `header` as leading comment
    fn save(&self, out: &mut dyn Write, header: &str) -> Result<()>;
}

// =============================================================================
// Schema
// =============================================================================

/// Schema document in one dialect
#[derive(Debug, Clone)]
pub struct Schema {
    dialect: Dialect,
    namespace: String,
    token: String,
    version: String,
    document: SchemaDocument,
}

impl Schema {
    /// Create an empty schema; the token is bound to the namespace
    pub fn new(dialect: Dialect, namespace: &str, token: &str, version: &str) -> Result<Self> {
        validate_namespace(namespace)?;
        validate_ncname(token)?;
        let mut document = SchemaDocument::new();
        document.add_namespace(token, namespace)?;
        tracing::debug!(%dialect, namespace, token, "schema created");
        Ok(Self {
            dialect,
            namespace: namespace.to_string(),
            token: token.to_string(),
            version: version.to_string(),
            document,
        })
    }

    /// Create the backend configured for an interface type
    ///
    /// Fails with [`Error::MissingBackend`] naming `interface_type` when the
    /// configuration has no dialect for it.
    pub fn for_interface_type(
        config: &GeneratorConfig,
        interface_type: &str,
        namespace: &str,
        token: &str,
        version: &str,
    ) -> Result<Self> {
        let dialect = config.dialect_for(interface_type)?;
        Self::new(dialect, namespace, token, version)
    }

    /// Collected definitions
    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    /// Serialize to a string
    pub fn to_string_with_header(&self, header: &str) -> Result<String> {
        let mut buf = Vec::new();
        self.save(&mut buf, header)?;
        String::from_utf8(buf).map_err(|e| Error::Other(e.to_string()))
    }
}

impl SchemaBackend for Schema {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn namespace_token(&self) -> &str {
        &self.token
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn add_simple_classifier(&mut self, classifier: SimpleClassifier) -> Result<()> {
        tracing::debug!(name = %classifier.name, base = %classifier.primitive, "simple classifier");
        self.document.add_definition(Definition::Simple(classifier))?;
        Ok(())
    }

    fn add_complex_classifier(&mut self, mut classifier: ComplexClassifier) -> Result<Vec<Facet>> {
        classifier.facets =
            facets::retain_valid(classifier.facets, &classifier.primitive, &classifier.name);
        let applied = classifier.facets.clone();
        tracing::debug!(
            name = %classifier.name,
            facets = applied.len(),
            supplementaries = classifier.supplementaries.len(),
            "complex classifier"
        );
        self.document.add_definition(Definition::Complex(classifier))?;
        Ok(applied)
    }

    fn add_enum_classifier(&mut self, classifier: EnumClassifier) -> Result<()> {
        tracing::debug!(name = %classifier.name, items = classifier.items.len(), "enum classifier");
        self.document.add_definition(Definition::Enum(classifier))?;
        Ok(())
    }

    fn add_external_classifier(&mut self, classifier: ExternalClassifier) -> Result<()> {
        tracing::debug!(
            name = %classifier.name,
            namespace = %classifier.namespace,
            base = %classifier.base_type,
            "external classifier"
        );
        self.document.add_definition(Definition::External(classifier))?;
        Ok(())
    }

    fn add_abie_type(&mut self, abie: AbieType) -> Result<()> {
        tracing::debug!(name = %abie.name, "constructed type");
        self.document.add_definition(Definition::Abie(abie))?;
        Ok(())
    }

    fn add_element(&mut self, element: ElementDecl) -> Result<()> {
        tracing::debug!(name = %element.name, type_ref = %element.type_ref, "element");
        self.document.add_element(element)?;
        Ok(())
    }

    fn add_namespace(&mut self, token: &str, uri: &str) -> Result<()> {
        validate_namespace(uri)?;
        self.document.add_namespace(token, uri)
    }

    fn add_schema_reference(&mut self, namespace: &str, location: &str) {
        if namespace == self.namespace {
            return;
        }
        self.document.add_reference(namespace, location);
    }

    fn merge(&mut self, other: Schema) -> Result<()> {
        if other.dialect != self.dialect {
            return Err(Error::IncompatibleSchemaMerge {
                target_dialect: self.dialect.to_string(),
                source_dialect: other.dialect.to_string(),
            });
        }
        tracing::debug!(from = %other.namespace, into = %self.namespace, "merging schema");
        self.document.absorb(other.document)?;
        Ok(())
    }

    fn sort(&mut self) {
        self.document.sort();
    }

    fn save(&self, out: &mut dyn Write, header: &str) -> Result<()> {
        match self.dialect {
            Dialect::Xml => xsd::write_schema(self, out, header),
            Dialect::Json => json::write_schema(self, out, header),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_schema_validates() {
        assert!(Schema::new(Dialect::Xml, "urn:example:order", "tns", "1.0").is_ok());
        assert!(Schema::new(Dialect::Xml, "", "tns", "1.0").is_err());
        assert!(Schema::new(Dialect::Xml, "urn:example:order", "t:ns", "1.0").is_err());
    }

    #[test]
    fn test_merge_same_dialect() {
        let mut a = Schema::new(Dialect::Json, "urn:a", "a", "1.0").unwrap();
        let b = Schema::new(Dialect::Json, "urn:b", "b", "1.0").unwrap();
        a.merge(b).unwrap();
        assert_eq!(a.document().namespaces().get_namespace("b"), Some("urn:b"));
    }

    #[test]
    fn test_merge_rejects_other_dialect() {
        let mut a = Schema::new(Dialect::Xml, "urn:a", "a", "1.0").unwrap();
        let b = Schema::new(Dialect::Json, "urn:b", "b", "1.0").unwrap();
        let err = a.merge(b).unwrap_err();
        assert!(matches!(err, Error::IncompatibleSchemaMerge { .. }));
        assert!(err.to_string().contains("json"));
    }

    #[test]
    fn test_for_interface_type() {
        let config = GeneratorConfig::default();
        let schema = Schema::for_interface_type(&config, "rest", "urn:a", "tns", "1.0").unwrap();
        assert_eq!(schema.dialect(), Dialect::Json);

        let err = Schema::for_interface_type(&config, "GraphQL", "urn:a", "tns", "1.0").unwrap_err();
        assert!(matches!(err, Error::MissingBackend { ref key } if key == "GraphQL"));
    }

    #[test]
    fn test_schema_reference_to_self_ignored() {
        let mut schema = Schema::new(Dialect::Xml, "urn:a", "tns", "1.0").unwrap();
        schema.add_schema_reference("urn:a", "a.xsd");
        schema.add_schema_reference("urn:b", "b.xsd");
        assert_eq!(schema.document().references().count(), 1);
    }
}
