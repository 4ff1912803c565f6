//! Generator configuration
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (modelschema.toml)
//! - Environment variables (MODELSCHEMA__*)
//!
//! ## Example config file (modelschema.toml):
//! ```toml
//! [naming]
//! service_model_package = "ServiceModel"
//! profile_stereotype = "Profile"
//! basic_profile = "Basic"
//!
//! [classifiers]
//! enumeration_replacement = "String"
//!
//! [interface_types]
//! SOAP = "xml"
//! REST = "json"
//! ```

use config_crate::{Config, Environment, File};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::schema::header::DEFAULT_TEMPLATE;
use crate::schema::Dialect;

/// Main configuration of a generation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Qualified naming rules
    #[serde(default)]
    pub naming: NamingConfig,

    /// Classifier substitutions
    #[serde(default)]
    pub classifiers: ClassifierConfig,

    /// Documentation lookup
    #[serde(default)]
    pub documentation: DocumentationConfig,

    /// Tagged-value names of external references
    #[serde(default)]
    pub external_reference: ExternalReferenceConfig,

    /// Interface type → dialect
    #[serde(default = "default_interface_types")]
    pub interface_types: IndexMap<String, Dialect>,

    /// Document header
    #[serde(default)]
    pub header: HeaderConfig,
}

/// Names used by the qualified-name rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Package whose classes are never package-prefixed at message scope
    #[serde(default = "default_service_model_package")]
    pub service_model_package: String,

    /// Stereotype marking profile packages
    #[serde(default = "default_profile_stereotype")]
    pub profile_stereotype: String,

    /// The default profile, which never changes names
    #[serde(default = "default_basic_profile")]
    pub basic_profile: String,
}

/// Classifier substitutions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Classifier used in place of suppressed enumerations
    #[serde(default)]
    pub enumeration_replacement: Option<String>,

    /// Classifier used for fixed-value enumeration supplementaries
    #[serde(default = "default_string_classifier")]
    pub string_classifier: String,
}

/// Where documentation comes from when a node has none
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentationConfig {
    /// Tagged values consulted, in order
    #[serde(default = "default_documentation_tags")]
    pub tagged_values: Vec<String>,
}

/// Tagged-value names read from external-reference classifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalReferenceConfig {
    /// Namespace of the external schema
    #[serde(default = "default_ext_namespace")]
    pub namespace: String,

    /// Token to bind the namespace to
    #[serde(default = "default_ext_namespace_token")]
    pub namespace_token: String,

    /// Location of the external schema
    #[serde(default = "default_ext_schema_name")]
    pub schema_name: String,

    /// Referenced declaration
    #[serde(default = "default_ext_base_type")]
    pub base_type: String,

    /// Minimum occurrences
    #[serde(default = "default_ext_min_occurs")]
    pub min_occurs: String,

    /// Maximum occurrences
    #[serde(default = "default_ext_max_occurs")]
    pub max_occurs: String,
}

/// Header settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderConfig {
    /// Template with `@PLACEHOLDER@` fields
    #[serde(default = "default_header_template")]
    pub template: String,

    /// Author written into headers
    #[serde(default)]
    pub author: String,

    /// Access level written into headers
    #[serde(default = "default_access_level")]
    pub access_level: String,
}

// Default value functions
fn default_service_model_package() -> String {
    "ServiceModel".to_string()
}

fn default_profile_stereotype() -> String {
    "Profile".to_string()
}

fn default_basic_profile() -> String {
    "Basic".to_string()
}

fn default_string_classifier() -> String {
    "String".to_string()
}

fn default_documentation_tags() -> Vec<String> {
    vec!["documentation".to_string(), "description".to_string()]
}

fn default_ext_namespace() -> String {
    "namespace".to_string()
}

fn default_ext_namespace_token() -> String {
    "namespaceToken".to_string()
}

fn default_ext_schema_name() -> String {
    "schemaName".to_string()
}

fn default_ext_base_type() -> String {
    "baseType".to_string()
}

fn default_ext_min_occurs() -> String {
    "minOccurs".to_string()
}

fn default_ext_max_occurs() -> String {
    "maxOccurs".to_string()
}

fn default_interface_types() -> IndexMap<String, Dialect> {
    IndexMap::from([
        ("SOAP".to_string(), Dialect::Xml),
        ("REST".to_string(), Dialect::Json),
    ])
}

fn default_header_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

fn default_access_level() -> String {
    "public".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            naming: NamingConfig::default(),
            classifiers: ClassifierConfig::default(),
            documentation: DocumentationConfig::default(),
            external_reference: ExternalReferenceConfig::default(),
            interface_types: default_interface_types(),
            header: HeaderConfig::default(),
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            service_model_package: default_service_model_package(),
            profile_stereotype: default_profile_stereotype(),
            basic_profile: default_basic_profile(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enumeration_replacement: None,
            string_classifier: default_string_classifier(),
        }
    }
}

impl Default for DocumentationConfig {
    fn default() -> Self {
        Self {
            tagged_values: default_documentation_tags(),
        }
    }
}

impl Default for ExternalReferenceConfig {
    fn default() -> Self {
        Self {
            namespace: default_ext_namespace(),
            namespace_token: default_ext_namespace_token(),
            schema_name: default_ext_schema_name(),
            base_type: default_ext_base_type(),
            min_occurs: default_ext_min_occurs(),
            max_occurs: default_ext_max_occurs(),
        }
    }
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            template: default_header_template(),
            author: String::new(),
            access_level: default_access_level(),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        for location in ["modelschema.toml", ".modelschema.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // MODELSCHEMA__NAMING__BASIC_PROFILE=Standard
        builder = builder.add_source(
            Environment::with_prefix("MODELSCHEMA")
                .prefix_separator("__")
                .separator("__"),
        );

        let config: GeneratorConfig = builder.build()?.try_deserialize()?;
        tracing::debug!(
            interface_types = config.interface_types.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::Other(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Dialect configured for an interface type (case-insensitive)
    pub fn dialect_for(&self, interface_type: &str) -> Result<Dialect> {
        self.interface_types
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(interface_type))
            .map(|(_, dialect)| *dialect)
            .ok_or_else(|| Error::MissingBackend {
                key: interface_type.to_string(),
            })
    }
}
