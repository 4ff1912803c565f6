//! Source model
//!
//! Read-only view of the class/classifier graph produced by the modeling
//! tool. The compiler walks this graph but never owns or mutates it.
//!
//! A model file is plain JSON:
//!
//! ```json
//! {
//!   "classifiers": [
//!     { "id": "string", "name": "string", "kind": "simple" },
//!     { "id": "amount", "name": "Amount", "kind": "complex", "base": "decimal",
//!       "metadata": [{ "name": "currencyCode", "kind": "supplementary", "classifier": "string" }] }
//!   ],
//!   "classes": [
//!     { "id": "order", "name": "Order", "package": { "name": "OrderService" },
//!       "attributes": [{ "name": "id", "classifier": "string" }] }
//!   ],
//!   "messages": [{ "operation": "CreateOrder", "role": "CreateOrder", "class": "order" }]
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::compiler::scope::{DocScope, SchemaScope};
use crate::error::{Error, Result};

/// Meta-kind of a classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClassifierKind {
    /// Restricted primitive
    Simple,
    /// Primitive content with supplementary attributes
    Complex,
    /// Enumerated literals
    Enumeration,
    /// Type defined in an external schema
    ExternalReference,
    /// Anything the modeling tool could not classify
    Unknown,
}

impl ClassifierKind {
    /// Name used in messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierKind::Simple => "simple",
            ClassifierKind::Complex => "complex",
            ClassifierKind::Enumeration => "enumeration",
            ClassifierKind::ExternalReference => "externalReference",
            ClassifierKind::Unknown => "unknown",
        }
    }
}

/// What a metadata descriptor declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataKind {
    /// A value constraint
    Facet,
    /// A meta-data attribute
    Supplementary,
    /// An enumeration literal or plain declaration
    Literal,
}

/// One facet, supplementary or literal declaration on a classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDescriptor {
    /// Declared name (facet name, attribute name or literal value)
    pub name: String,
    /// Declaration kind
    pub kind: MetadataKind,
    /// Classifier of a supplementary attribute
    #[serde(default)]
    pub classifier: Option<String>,
    /// Default value
    #[serde(default)]
    pub default_value: Option<String>,
    /// Fixed value, takes precedence over the default
    #[serde(default)]
    pub fixed_value: Option<String>,
    /// Documentation text
    #[serde(default)]
    pub documentation: String,
    /// Whether a supplementary attribute may be omitted
    #[serde(default)]
    pub optional: bool,
}

impl MetadataDescriptor {
    /// Fixed value if present, else the default value
    pub fn effective_value(&self) -> Option<&str> {
        self.fixed_value
            .as_deref()
            .or(self.default_value.as_deref())
    }

    /// Convenience constructor for a facet declaration
    pub fn facet(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MetadataKind::Facet,
            classifier: None,
            default_value: Some(value.into()),
            fixed_value: None,
            documentation: String::new(),
            optional: false,
        }
    }
}

/// A reusable type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierNode {
    /// Unique identity
    pub id: String,
    /// Model name
    pub name: String,
    /// Output name override
    #[serde(default)]
    pub alias: String,
    /// Meta-kind
    pub kind: ClassifierKind,
    /// Documentation text
    #[serde(default)]
    pub documentation: String,
    /// Base classifier (id or name) this one derives from
    #[serde(default)]
    pub base: Option<String>,
    /// Facet, supplementary and literal declarations
    #[serde(default)]
    pub metadata: Vec<MetadataDescriptor>,
    /// Replace this enumeration with the configured substitute
    #[serde(default)]
    pub suppress_enumeration: bool,
    /// Free-form tagged values
    #[serde(default)]
    pub tagged_values: IndexMap<String, String>,
    /// Declared schema scope
    #[serde(default)]
    pub scope: SchemaScope,
    /// Declared documentation scope
    #[serde(default)]
    pub doc_scope: DocScope,
}

impl ClassifierNode {
    /// Alias if set, else the model name
    pub fn display_name(&self) -> &str {
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }

    /// Tagged value by (case-insensitive) name
    pub fn tagged_value(&self, name: &str) -> Option<&str> {
        self.tagged_values
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Metadata entries of one kind
    pub fn metadata_of(&self, kind: MetadataKind) -> impl Iterator<Item = &MetadataDescriptor> {
        self.metadata.iter().filter(move |m| m.kind == kind)
    }
}

/// Owning package of a class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRef {
    /// Package name
    pub name: String,
    /// Stereotypes applied to the package
    #[serde(default)]
    pub stereotypes: Vec<String>,
}

impl PackageRef {
    /// Whether the package carries a stereotype (case-insensitive)
    pub fn has_stereotype(&self, stereotype: &str) -> bool {
        self.stereotypes
            .iter()
            .any(|s| s.eq_ignore_ascii_case(stereotype))
    }
}

/// A content attribute of a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAttribute {
    /// Attribute name
    pub name: String,
    /// Classifier id or name
    pub classifier: String,
    /// UML multiplicity such as `0..1`
    #[serde(default)]
    pub multiplicity: String,
    /// Default value
    #[serde(default)]
    pub default_value: Option<String>,
    /// Fixed value
    #[serde(default)]
    pub fixed_value: Option<String>,
    /// Facets restricting this attribute only
    #[serde(default)]
    pub facets: Vec<MetadataDescriptor>,
    /// Emit as an XML attribute instead of an element
    #[serde(default)]
    pub supplementary: bool,
    /// Ordering key, 0 when unset
    #[serde(default)]
    pub sequence: u32,
    /// Choice-group descriptor, `name[low..high]`
    #[serde(default)]
    pub choice: Option<String>,
    /// Branch of the choice group this attribute belongs to
    #[serde(default)]
    pub choice_sequence: u32,
    /// Documentation text
    #[serde(default)]
    pub documentation: String,
}

/// A navigable association to another class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAssociation {
    /// Role name, used as element name
    pub role: String,
    /// Target class id
    pub target: String,
    /// UML multiplicity
    #[serde(default)]
    pub multiplicity: String,
    /// Ordering key, 0 when unset
    #[serde(default)]
    pub sequence: u32,
    /// Choice-group descriptor
    #[serde(default)]
    pub choice: Option<String>,
    /// Branch of the choice group
    #[serde(default)]
    pub choice_sequence: u32,
    /// Documentation text
    #[serde(default)]
    pub documentation: String,
}

fn default_class_scope() -> SchemaScope {
    SchemaScope::Message
}

/// A modeled class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassNode {
    /// Unique identity
    pub id: String,
    /// Model name
    pub name: String,
    /// Output name override
    #[serde(default)]
    pub alias: String,
    /// Owning package
    #[serde(default)]
    pub package: PackageRef,
    /// Declared schema scope
    #[serde(default = "default_class_scope")]
    pub scope: SchemaScope,
    /// Documentation text
    #[serde(default)]
    pub documentation: String,
    /// Content attributes
    #[serde(default)]
    pub attributes: Vec<ClassAttribute>,
    /// Associations to other classes
    #[serde(default)]
    pub associations: Vec<ClassAssociation>,
}

impl ClassNode {
    /// Alias if set, else the model name
    pub fn display_name(&self) -> &str {
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }
}

/// A message the driver asks to be emitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSpec {
    /// Operation the message belongs to
    pub operation: String,
    /// Role name (request/response name)
    pub role: String,
    /// Root class id
    pub class: String,
    /// Root element name, defaults to the role
    #[serde(default)]
    pub element: Option<String>,
}

impl MessageSpec {
    /// Name of the root element
    pub fn element_name(&self) -> &str {
        self.element.as_deref().unwrap_or(&self.role)
    }
}

#[derive(Deserialize)]
struct ModelFile {
    #[serde(default)]
    classifiers: Vec<ClassifierNode>,
    #[serde(default)]
    classes: Vec<ClassNode>,
    #[serde(default)]
    messages: Vec<MessageSpec>,
}

/// Immutable, indexed class/classifier graph
#[derive(Debug, Clone, Default)]
pub struct Model {
    classifiers: IndexMap<String, ClassifierNode>,
    classes: IndexMap<String, ClassNode>,
    messages: Vec<MessageSpec>,
    classifier_names: HashMap<String, String>,
}

impl Model {
    /// Build a model from its parts
    pub fn new(
        classifiers: Vec<ClassifierNode>,
        classes: Vec<ClassNode>,
        messages: Vec<MessageSpec>,
    ) -> Self {
        let mut classifier_names = HashMap::new();
        for c in &classifiers {
            classifier_names
                .entry(c.name.to_lowercase())
                .or_insert_with(|| c.id.clone());
        }
        Self {
            classifiers: classifiers.into_iter().map(|c| (c.id.clone(), c)).collect(),
            classes: classes.into_iter().map(|c| (c.id.clone(), c)).collect(),
            messages,
            classifier_names,
        }
    }

    /// Parse a model from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(json)?;
        Ok(Self::new(file.classifiers, file.classes, file.messages))
    }

    /// Load a model from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Classifier by id, falling back to a case-insensitive name lookup
    pub fn classifier(&self, id_or_name: &str) -> Option<&ClassifierNode> {
        self.classifiers.get(id_or_name).or_else(|| {
            self.classifier_names
                .get(&id_or_name.to_lowercase())
                .and_then(|id| self.classifiers.get(id))
        })
    }

    /// Classifier by id or name, as an error when missing
    pub fn require_classifier(&self, id_or_name: &str) -> Result<&ClassifierNode> {
        self.classifier(id_or_name)
            .ok_or_else(|| Error::UnknownClassifier(id_or_name.to_string()))
    }

    /// Class by id
    pub fn class(&self, id: &str) -> Option<&ClassNode> {
        self.classes.get(id)
    }

    /// Class by id, as an error when missing
    pub fn require_class(&self, id: &str) -> Result<&ClassNode> {
        self.class(id).ok_or_else(|| Error::UnknownClass(id.to_string()))
    }

    /// All classifiers in declaration order
    pub fn classifiers(&self) -> impl Iterator<Item = &ClassifierNode> {
        self.classifiers.values()
    }

    /// All classes in declaration order
    pub fn classes(&self) -> impl Iterator<Item = &ClassNode> {
        self.classes.values()
    }

    /// Messages declared in the model file
    pub fn messages(&self) -> &[MessageSpec] {
        &self.messages
    }

    /// Messages grouped by operation, in declaration order
    pub fn operations(&self) -> IndexMap<&str, Vec<&MessageSpec>> {
        let mut ops: IndexMap<&str, Vec<&MessageSpec>> = IndexMap::new();
        for m in &self.messages {
            ops.entry(m.operation.as_str()).or_default().push(m);
        }
        ops
    }
}
