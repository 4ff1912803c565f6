//! Schema compilation
//!
//! Turns classes and classifiers of a [`crate::Model`] into schema
//! definitions. Classifiers are resolved once per session through the
//! [`ClassifierCache`]; classes are named per scope by the
//! [`QualifiedNameResolver`] and emitted as constructed types by the
//! [`SchemaProcessor`].

pub mod attributes;
pub mod cache;
pub mod cardinality;
pub mod choice;
pub mod context;
pub mod documentation;
pub mod processor;
pub mod qualified;
pub mod resolver;
pub mod scope;

pub use attributes::{AttributeKind, EnumItem, SchemaAssociation, SchemaAttribute};
pub use cache::ClassifierCache;
pub use cardinality::Cardinality;
pub use choice::{assemble_choices, Choice, ChoiceGroup, ChoiceMember, GroupCardinality};
pub use context::{ClassifierContext, ContentCategory};
pub use documentation::DocContext;
pub use processor::{GeneratedSchema, GenerationSession, SchemaProcessor};
pub use qualified::QualifiedNameResolver;
pub use resolver::{get_facets, ClassifierResolver, ResolverTargets};
pub use scope::{DocScope, SchemaScope, ScopePair};
