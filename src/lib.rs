//! # modelschema
//!
//! Compiles a UML-style information model (classes, classifiers, messages)
//! into schema documents: XML Schema for SOAP-style interfaces and JSON
//! Schema for REST-style interfaces.
//!
//! ## Features
//!
//! - Classifier resolution into simple, complex, enumerated and external types
//! - Scope-sensitive qualified class names
//! - Facet translation and base-type substitution per dialect
//! - Choice groups with ordered alternatives
//! - A shared common schema for interface-wide definitions
//! - Non-fatal diagnostics with documented fallbacks
//!
//! ## Example
//!
//! ```rust,ignore
//! use modelschema::{GenerationSession, GeneratorConfig, Model};
//!
//! let model = Model::from_file("model.json")?;
//! let config = GeneratorConfig::load()?;
//!
//! let mut session = GenerationSession::new(&model, &config, "SOAP", "1.0")?;
//! let mut processor = session.processor("CreateOrder", "urn:example:order", "tns")?;
//! for message in model.messages() {
//!     processor.process_message(message)?;
//! }
//! let generated = processor.finish();
//! let xsd = generated.schema.to_string_with_header("")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod names;
pub mod namespaces;

// Input
pub mod config;
pub mod model;

// Output
pub mod schema;

// Compilation
pub mod compiler;

// Re-exports for convenience
pub use compiler::{
    ClassifierCache, ClassifierContext, GeneratedSchema, GenerationSession,
    QualifiedNameResolver, SchemaProcessor,
};
pub use config::GeneratorConfig;
pub use error::{Diagnostic, Diagnostics, Error, Result, Severity};
pub use model::Model;
pub use schema::{Dialect, Schema, SchemaBackend};

/// Version of the modelschema library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XML Schema namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// JSON Schema dialect emitted by the JSON backend
pub const JSON_SCHEMA_DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";
