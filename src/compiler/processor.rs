//! Generation sessions and per-operation schema processing
//!
//! A [`GenerationSession`] owns everything that is shared by the
//! capabilities generated in one run: the classifier cache, the optional
//! common schema and the common documentation context. Each operation is
//! then compiled by a [`SchemaProcessor`] borrowed from the session.
//!
//! ## Example
//!
//! ```no_run
//! use modelschema::{GenerationSession, GeneratorConfig, Model};
//!
//! let model = Model::from_file("order_model.json").unwrap();
//! let config = GeneratorConfig::default();
//! let mut session = GenerationSession::new(&model, &config, "SOAP", "1.0")
//!     .unwrap()
//!     .with_common_schema("urn:example:common", "cmn")
//!     .unwrap();
//!
//! let mut processor = session
//!     .processor("CreateOrder", "urn:example:order", "tns")
//!     .unwrap();
//! for message in model.messages() {
//!     processor.process_message(message).unwrap();
//! }
//! let generated = processor.finish();
//! println!("{}", generated.schema.to_string_with_header("").unwrap());
//! ```

use super::attributes::{SchemaAssociation, SchemaAttribute};
use super::cache::ClassifierCache;
use super::cardinality::Cardinality;
use super::choice::{assemble_choices, ChoiceGroup};
use super::context::ClassifierContext;
use super::documentation::DocContext;
use super::qualified::QualifiedNameResolver;
use super::resolver::{get_facets, widened, ClassifierResolver, ResolverTargets};
use super::scope::{DocScope, SchemaScope, ScopePair};
use crate::config::GeneratorConfig;
use crate::error::{Diagnostic, Diagnostics, Error, Result};
use crate::model::{ClassAttribute, ClassNode, MessageSpec, Model};
use crate::namespaces::TypeRef;
use crate::schema::primitives::{normalize_primitive_name, PrimitiveType};
use crate::schema::{AbieType, Dialect, ElementDecl, HeaderFields, Schema, SchemaBackend};

// =============================================================================
// Session
// =============================================================================

/// State shared by all capabilities generated in one run
pub struct GenerationSession<'m> {
    model: &'m Model,
    config: &'m GeneratorConfig,
    dialect: Dialect,
    version: String,
    cache: ClassifierCache,
    common: Option<Schema>,
    common_docs: DocContext,
}

impl<'m> GenerationSession<'m> {
    /// Start a session for an interface type
    ///
    /// Fails with [`Error::MissingBackend`] when the configuration has no
    /// dialect for `interface_type`.
    pub fn new(
        model: &'m Model,
        config: &'m GeneratorConfig,
        interface_type: &str,
        version: &str,
    ) -> Result<Self> {
        let dialect = config.dialect_for(interface_type)?;
        tracing::info!(interface_type, %dialect, version, "starting generation session");
        Ok(Self {
            model,
            config,
            dialect,
            version: version.to_string(),
            cache: ClassifierCache::new(),
            common: None,
            common_docs: DocContext::new(DocScope::Common),
        })
    }

    /// Emit Interface and Profile scoped definitions into a shared schema
    pub fn with_common_schema(mut self, namespace: &str, token: &str) -> Result<Self> {
        self.common = Some(Schema::new(self.dialect, namespace, token, &self.version)?);
        Ok(self)
    }

    /// Forget everything resolved so far; the common schema starts over empty
    pub fn reset(&mut self) -> Result<()> {
        self.cache.flush();
        self.common_docs = DocContext::new(DocScope::Common);
        if let Some(common) = self.common.take() {
            self.common = Some(Schema::new(
                self.dialect,
                common.namespace(),
                common.namespace_token(),
                &self.version,
            )?);
        }
        Ok(())
    }

    /// Output dialect
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Document version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Session cache
    pub fn cache(&self) -> &ClassifierCache {
        &self.cache
    }

    /// The shared schema, if the session has one
    pub fn common_schema(&self) -> Option<&Schema> {
        self.common.as_ref()
    }

    /// Documentation shared across capabilities
    pub fn common_docs(&self) -> &DocContext {
        &self.common_docs
    }

    /// Start compiling one operation into its own schema
    pub fn processor(
        &mut self,
        operation: &str,
        namespace: &str,
        token: &str,
    ) -> Result<SchemaProcessor<'_, 'm>> {
        SchemaProcessor::new(self, operation, namespace, token)
    }

    /// Qualified name of the root class of `message` in a schema bound to `token`
    pub fn qualified_class_name(&self, message: &MessageSpec, token: &str) -> Result<String> {
        let class = self.model.require_class(&message.class)?;
        let naming = QualifiedNameResolver::new(
            &self.config.naming,
            self.common.as_ref().map(|c| c.namespace_token()),
            token,
            &message.role,
        );
        Ok(naming.qualified_class_name(class, class.scope))
    }

    /// Render the configured header for a capability
    pub fn header(&self, service: &str, capability: &str, kind: &str) -> String {
        let header = &self.config.header;
        HeaderFields::new()
            .with_service(service)
            .with_capability(capability, kind)
            .with_author(header.author.as_str())
            .with_version(self.version.as_str())
            .with_access_level(header.access_level.as_str())
            .render(&header.template)
    }

    /// Sort and hand out the common schema
    pub fn finish_common(self) -> Option<Schema> {
        self.common.map(|mut schema| {
            schema.sort();
            schema
        })
    }
}

// =============================================================================
// Processor
// =============================================================================

/// Result of compiling one operation
#[derive(Debug)]
pub struct GeneratedSchema {
    /// Operation the schema belongs to
    pub operation: String,
    /// The sorted schema
    pub schema: Schema,
    /// Documentation local to the operation
    pub docs: DocContext,
    /// Data problems met while compiling
    pub diagnostics: Diagnostics,
}

/// Compiles the messages of one operation
pub struct SchemaProcessor<'s, 'm> {
    session: &'s mut GenerationSession<'m>,
    operation: String,
    schema: Schema,
    docs: DocContext,
    diagnostics: Diagnostics,
}

impl<'s, 'm> SchemaProcessor<'s, 'm> {
    fn new(
        session: &'s mut GenerationSession<'m>,
        operation: &str,
        namespace: &str,
        token: &str,
    ) -> Result<Self> {
        let mut schema = Schema::new(session.dialect, namespace, token, &session.version)?;
        if let Some(common) = &session.common {
            schema.add_namespace(common.namespace_token(), common.namespace())?;
            let location = format!("{}.{}", common.namespace_token(), session.dialect.extension());
            schema.add_schema_reference(common.namespace(), &location);
        }
        tracing::debug!(operation, namespace, "processing operation");
        Ok(Self {
            session,
            operation: operation.to_string(),
            schema,
            docs: DocContext::new(DocScope::Local),
            diagnostics: Diagnostics::new(),
        })
    }

    /// Operation being compiled
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Documentation local to the operation
    pub fn local_docs(&self) -> &DocContext {
        &self.docs
    }

    /// Data problems met so far
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Schema being built
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Emit the root class of `message` and its root element
    ///
    /// Returns the qualified reference of the root type.
    pub fn process_message(&mut self, message: &MessageSpec) -> Result<TypeRef> {
        let model = self.session.model;
        let class = model.require_class(&message.class)?;
        let type_ref = self.emit_class(class, class.scope, &message.role)?;

        let sequence_key = self
            .schema
            .document()
            .components()
            .iter()
            .filter(|c| c.is_element())
            .count() as u32
            + 1;
        let added = self.schema.add_element(ElementDecl {
            name: message.element_name().to_string(),
            type_ref: type_ref.clone(),
            documentation: class.documentation.clone(),
            sequence_key,
        });
        self.report_conflict(added, message.element_name())?;
        Ok(type_ref)
    }

    /// Sort the local schema and hand it out
    pub fn finish(mut self) -> GeneratedSchema {
        self.schema.sort();
        tracing::info!(
            operation = %self.operation,
            definitions = self.schema.document().len(),
            diagnostics = self.diagnostics.len(),
            "operation compiled"
        );
        GeneratedSchema {
            operation: self.operation,
            schema: self.schema,
            docs: self.docs,
            diagnostics: self.diagnostics,
        }
    }

    fn with_resolver<R>(
        &mut self,
        role: &str,
        f: impl FnOnce(&mut ClassifierResolver<'_>) -> R,
    ) -> R {
        let session = &mut *self.session;
        let targets = ResolverTargets {
            common: session.common.as_mut().map(|c| c as &mut dyn SchemaBackend),
            local: &mut self.schema,
            common_docs: &mut session.common_docs,
            local_docs: &mut self.docs,
        };
        let mut resolver = ClassifierResolver::new(
            session.model,
            session.config,
            &mut session.cache,
            targets,
            role,
            &mut self.diagnostics,
        );
        f(&mut resolver)
    }

    fn emit_class(&mut self, class: &'m ClassNode, scope: SchemaScope, role: &str) -> Result<TypeRef> {
        let model = self.session.model;
        let in_common = self.session.common.is_some() && scope.targets_common();
        let naming = QualifiedNameResolver::new(
            &self.session.config.naming,
            self.session.common.as_ref().map(|c| c.namespace_token()),
            self.schema.namespace_token(),
            role,
        );
        let type_ref = naming.qualified_type_ref(class, scope);

        let target_namespace = match (&self.session.common, in_common) {
            (Some(common), true) => common.namespace(),
            _ => self.schema.namespace(),
        };
        let key = format!("{}@{}/{}", class.id, target_namespace, type_ref.local_name);
        if self.session.cache.has_class_key(&key) {
            return Ok(type_ref);
        }
        // Recorded before the members so that cyclic associations terminate
        self.session
            .cache
            .add_qualified_class_name(key, type_ref.to_string())?;
        tracing::debug!(class = %class.name, qualified = %type_ref, %scope, "emitting class");

        // Members of a type in the common schema must be common themselves
        let shared = in_common.then_some(scope);
        let mut content = Vec::new();
        let mut supplementaries = Vec::new();
        for attribute in &class.attributes {
            match self.build_attribute(class, attribute, role, shared)? {
                Some(built) if built.is_supplementary() => supplementaries.push(built),
                Some(built) => content.push(built),
                None => {}
            }
        }

        let mut associations = Vec::new();
        for association in &class.associations {
            let subject = format!("{}.{}", class.name, association.role);
            let Some(target) = model.class(&association.target) else {
                self.diagnostics.push(
                    Diagnostic::from(&Error::UnknownClass(association.target.clone()))
                        .with_subject(subject)
                        .with_fallback("association skipped"),
                );
                continue;
            };
            let target_scope = match shared {
                Some(owner) if !target.scope.targets_common() => {
                    self.diagnostics.push(widened(target.scope, subject.as_str()));
                    target.scope.widened_to(owner)
                }
                _ => target.scope,
            };
            let target_ref = self.emit_class(target, target_scope, role)?;
            let cardinality = Cardinality::parse_multiplicity(&association.multiplicity)
                .with_subject(&subject)
                .into_value(&mut self.diagnostics);
            let choice = self.parse_choice(
                association.choice.as_deref(),
                association.choice_sequence,
                &subject,
            );
            associations.push(
                SchemaAssociation::new(association.role.as_str(), target_ref, cardinality)
                    .with_sequence(association.sequence)
                    .with_choice(choice)
                    .with_documentation(association.documentation.as_str()),
            );
        }

        let assembled = assemble_choices(content, associations)
            .with_subject(&class.name)
            .into_value(&mut self.diagnostics);

        let abie = AbieType {
            name: type_ref.local_name.clone(),
            documentation: class.documentation.clone(),
            content: assembled.content,
            supplementaries,
            associations: assembled.associations,
            choices: assembled.choices,
        };
        let name = abie.name.clone();
        let (added, docs) = match (self.session.common.as_mut(), in_common) {
            (Some(common), true) => (common.add_abie_type(abie), &mut self.session.common_docs),
            _ => (self.schema.add_abie_type(abie), &mut self.docs),
        };
        if added.is_ok() {
            docs.register(name.as_str(), &class.documentation);
        }
        self.report_conflict(added, &class.name)?;
        Ok(type_ref)
    }

    /// Turn a name clash in the target schema into a diagnostic
    ///
    /// The definition already present stays in place.
    fn report_conflict(&mut self, added: Result<()>, subject: &str) -> Result<()> {
        match added {
            Err(err @ Error::ConflictingDefinition { .. }) => {
                self.diagnostics.push(
                    Diagnostic::from(&err)
                        .with_subject(subject)
                        .with_fallback("first definition kept"),
                );
                Ok(())
            }
            other => other,
        }
    }

    fn build_attribute(
        &mut self,
        class: &ClassNode,
        attribute: &ClassAttribute,
        role: &str,
        shared: Option<SchemaScope>,
    ) -> Result<Option<SchemaAttribute>> {
        let model = self.session.model;
        let dialect = self.session.dialect;
        let subject = format!("{}.{}", class.name, attribute.name);

        let context = match model.classifier(&attribute.classifier) {
            Some(node) => {
                let schema_scope = match shared {
                    Some(owner) if !node.scope.targets_common() => {
                        self.diagnostics.push(widened(node.scope, subject.as_str()));
                        node.scope.widened_to(owner)
                    }
                    _ => node.scope,
                };
                let scope = ScopePair::new(schema_scope, node.doc_scope);
                match self.with_resolver(role, |r| r.resolve_cached(node, scope)) {
                    Ok(context) => context,
                    Err(err) if err.is_data_error() => {
                        self.diagnostics.push(
                            Diagnostic::from(&err)
                                .with_subject(subject)
                                .with_fallback("attribute skipped"),
                        );
                        return Ok(None);
                    }
                    Err(err) => return Err(err),
                }
            }
            None => match normalize_primitive_name(&attribute.classifier)
                .and_then(|name| PrimitiveType::new(dialect, name))
            {
                Some(primitive) => ClassifierContext::primitive(primitive, ScopePair::default()),
                None => {
                    self.diagnostics.push(
                        Diagnostic::from(&Error::UnknownClassifier(attribute.classifier.clone()))
                            .with_subject(subject)
                            .with_fallback("attribute skipped"),
                    );
                    return Ok(None);
                }
            },
        };
        if !context.is_resolved() {
            return Ok(None);
        }

        let cardinality = Cardinality::parse_multiplicity(&attribute.multiplicity)
            .with_subject(&subject)
            .into_value(&mut self.diagnostics);

        let inline = get_facets(&attribute.facets, dialect);
        let (type_ref, primitive, restriction) = match context.primitive {
            Some(primitive) if context.is_primitive => {
                let (primitive, facets) = primitive.apply_substitutions(&inline);
                let mut restriction = Vec::with_capacity(facets.len());
                for facet in facets {
                    if facet.is_valid(&primitive) {
                        restriction.push(facet);
                    } else {
                        self.diagnostics.push(
                            Diagnostic::warning(format!("facet {} does not apply to {}", facet, primitive))
                                .with_subject(subject.as_str()),
                        );
                    }
                }
                let type_ref = TypeRef::primitive(dialect.primitive_token(), primitive.base_type);
                (type_ref, Some(primitive), restriction)
            }
            _ => {
                if !inline.is_empty() {
                    self.diagnostics.push(
                        Diagnostic::warning("inline facets need a primitive classifier")
                            .with_subject(subject.as_str())
                            .with_fallback("facets ignored"),
                    );
                }
                (context.type_ref(), None, Vec::new())
            }
        };

        let built = if attribute.supplementary {
            SchemaAttribute::supplementary(attribute.name.as_str(), type_ref, cardinality.is_optional())
        } else {
            let choice =
                self.parse_choice(attribute.choice.as_deref(), attribute.choice_sequence, &subject);
            SchemaAttribute::content(attribute.name.as_str(), type_ref, cardinality).with_choice(choice)
        };
        Ok(Some(
            built
                .with_primitive(primitive)
                .with_values(attribute.default_value.clone(), attribute.fixed_value.clone())
                .with_sequence(attribute.sequence)
                .with_documentation(attribute.documentation.as_str())
                .with_restriction(restriction),
        ))
    }

    fn parse_choice(
        &mut self,
        descriptor: Option<&str>,
        sequence_id: u32,
        subject: &str,
    ) -> Option<ChoiceGroup> {
        let descriptor = descriptor.map(str::trim).filter(|d| !d.is_empty())?;
        Some(
            ChoiceGroup::parse(descriptor, sequence_id)
                .with_subject(subject)
                .into_value(&mut self.diagnostics),
        )
    }
}
