//! Classifier resolution
//!
//! [`ClassifierResolver::define_classifier`] turns one classifier node into a
//! schema definition and returns the [`ClassifierContext`] describing where
//! it landed. It never consults or fills the cache for its own result;
//! [`ClassifierResolver::resolve_cached`] is the memoizing entry point used
//! by the processor and by supplementary lookup.

use std::collections::HashSet;

use super::attributes::{EnumItem, SchemaAttribute};
use super::cache::ClassifierCache;
use super::cardinality::Cardinality;
use super::context::{ClassifierContext, ContentCategory};
use super::documentation::DocContext;
use super::scope::{DocScope, SchemaScope, ScopePair};
use crate::config::GeneratorConfig;
use crate::error::{Diagnostic, Diagnostics, Error, Result};
use crate::model::{ClassifierKind, ClassifierNode, MetadataDescriptor, MetadataKind, Model};
use crate::names::{to_pascal_case, with_prefix};
use crate::namespaces::TypeRef;
use crate::schema::primitives::{normalize_primitive_name, PrimitiveType, STRING};
use crate::schema::{
    ComplexClassifier, Dialect, EnumClassifier, ExternalClassifier, Facet, SchemaBackend,
    SimpleClassifier,
};

/// Build facets from facet metadata; a fixed value wins over the default
pub fn get_facets<'m>(
    metadata: impl IntoIterator<Item = &'m MetadataDescriptor>,
    dialect: Dialect,
) -> Vec<Facet> {
    metadata
        .into_iter()
        .filter(|m| m.kind == MetadataKind::Facet)
        .map(|m| Facet::new(dialect, m.name.as_str(), m.effective_value().unwrap_or("")))
        .collect()
}

/// Backends and documentation contexts a resolver emits into
pub struct ResolverTargets<'t> {
    /// Common schema, when the session has one
    pub common: Option<&'t mut dyn SchemaBackend>,
    /// Schema of the capability being generated
    pub local: &'t mut dyn SchemaBackend,
    /// Documentation shared across capabilities
    pub common_docs: &'t mut DocContext,
    /// Documentation of the capability being generated
    pub local_docs: &'t mut DocContext,
}

/// Resolves classifiers into schema definitions for one message role
pub struct ClassifierResolver<'a> {
    model: &'a Model,
    config: &'a GeneratorConfig,
    cache: &'a mut ClassifierCache,
    targets: ResolverTargets<'a>,
    role: &'a str,
    diagnostics: &'a mut Diagnostics,
    in_progress: HashSet<String>,
}

impl<'a> ClassifierResolver<'a> {
    /// Create a resolver
    pub fn new(
        model: &'a Model,
        config: &'a GeneratorConfig,
        cache: &'a mut ClassifierCache,
        targets: ResolverTargets<'a>,
        role: &'a str,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            model,
            config,
            cache,
            targets,
            role,
            diagnostics,
            in_progress: HashSet::new(),
        }
    }

    fn dialect(&self) -> Dialect {
        self.targets.local.dialect()
    }

    fn targets_common(&self, scope: ScopePair) -> bool {
        self.targets.common.is_some() && scope.schema.targets_common()
    }

    fn backend(&mut self, common: bool) -> &mut dyn SchemaBackend {
        match (common, self.targets.common.as_deref_mut()) {
            (true, Some(backend)) => backend,
            _ => &mut *self.targets.local,
        }
    }

    fn target_token(&self, common: bool) -> String {
        match (common, &self.targets.common) {
            (true, Some(backend)) => backend.namespace_token().to_string(),
            _ => self.targets.local.namespace_token().to_string(),
        }
    }

    fn docs(&mut self, scope: ScopePair) -> &mut DocContext {
        match scope.doc {
            DocScope::Local => &mut *self.targets.local_docs,
            DocScope::Common => &mut *self.targets.common_docs,
        }
    }

    /// Cache key of a classifier resolved under `scope`
    ///
    /// Definitions landing in the common schema are shared by every
    /// capability of the session; local ones are keyed by the local
    /// namespace. Message-scope enumerations are also keyed by role since
    /// their names carry the role prefix.
    pub fn classifier_key(&self, node: &ClassifierNode, scope: ScopePair) -> String {
        if self.targets_common(scope) {
            match scope.doc {
                DocScope::Common => format!("{}@common/{}", node.id, scope.doc),
                DocScope::Local => format!(
                    "{}@common/{}/{}",
                    node.id,
                    scope.doc,
                    self.targets.local.namespace()
                ),
            }
        } else {
            let mut key = format!(
                "{}@{}/{}/{}",
                node.id,
                self.targets.local.namespace(),
                scope.schema,
                scope.doc
            );
            if scope.schema == SchemaScope::Message && node.kind == ClassifierKind::Enumeration {
                key.push('/');
                key.push_str(self.role);
            }
            key
        }
    }

    /// Resolve through the session cache
    pub fn resolve_cached(
        &mut self,
        node: &ClassifierNode,
        scope: ScopePair,
    ) -> Result<ClassifierContext> {
        let key = self.classifier_key(node, scope);
        if let Some(context) = self.cache.get_classifier_context(&key) {
            tracing::trace!(key = %key, "classifier cache hit");
            return Ok(context.clone());
        }
        if !self.in_progress.insert(key.clone()) {
            return Err(Error::CyclicClassifier {
                classifier: node.name.clone(),
            });
        }

        let resolved = self.define_classifier(node, scope);
        self.in_progress.remove(&key);
        let context = resolved?;

        self.cache.add_classifier_context(key, context.clone())?;
        Ok(context)
    }

    /// Emit the definition of `node` and describe where it landed
    pub fn define_classifier(
        &mut self,
        node: &ClassifierNode,
        scope: ScopePair,
    ) -> Result<ClassifierContext> {
        tracing::debug!(
            classifier = %node.name,
            kind = node.kind.as_str(),
            scope = %scope.schema,
            "defining classifier"
        );

        match node.kind {
            ClassifierKind::Unknown => {
                let err = Error::UnsupportedClassifierKind {
                    classifier: node.name.clone(),
                    kind: node.kind.as_str().to_string(),
                };
                self.diagnostics.push(
                    Diagnostic::from(&err)
                        .with_subject(node.name.as_str())
                        .with_fallback("no definition"),
                );
                return Ok(ClassifierContext::unknown(node.display_name(), scope));
            }
            ClassifierKind::ExternalReference => return self.define_external(node, scope),
            ClassifierKind::Enumeration if node.suppress_enumeration => {
                return self.define_replacement(node, scope)
            }
            _ => {}
        }

        let dialect = self.dialect();
        let primitive = self
            .primitive_of(node)
            .and_then(|name| PrimitiveType::new(dialect, name))
            .ok_or_else(|| Error::UnresolvedPrimitive {
                classifier: node.name.clone(),
            })?;

        if node.kind == ClassifierKind::Enumeration {
            return self.define_enum(node, scope, primitive);
        }

        let facets = get_facets(&node.metadata, dialect);
        let supplementaries = self.get_supplementaries(node, scope)?;

        if normalize_primitive_name(&node.name).is_some()
            && facets.is_empty()
            && supplementaries.is_empty()
        {
            tracing::trace!(classifier = %node.name, "bare primitive, nothing emitted");
            return Ok(ClassifierContext::primitive(primitive, scope));
        }

        let (primitive, facets) = primitive.apply_substitutions(&facets);
        let common = self.targets_common(scope);
        let name = to_pascal_case(node.display_name());
        let documentation = self.documentation_of(node);

        if node.kind == ClassifierKind::Complex || !supplementaries.is_empty() {
            if node.kind == ClassifierKind::Simple {
                self.diagnostics.push(
                    Diagnostic::warning("simple classifier declares supplementary attributes")
                        .with_subject(node.name.as_str())
                        .with_fallback("complex content"),
                );
            }
            let requested = facets.clone();
            let applied = self.backend(common).add_complex_classifier(ComplexClassifier {
                name: name.clone(),
                documentation: documentation.clone(),
                primitive: primitive.clone(),
                facets,
                supplementaries,
            })?;
            self.docs(scope).register(name.as_str(), &documentation);
            for facet in requested.iter().filter(|f| !applied.contains(f)) {
                self.diagnostics.push(
                    Diagnostic::warning(format!("facet {} does not apply to {}", facet, primitive))
                        .with_subject(node.name.as_str()),
                );
            }
            return Ok(self.context(ContentCategory::Complex, name, scope, common, Some(primitive)));
        }

        let facets = self.applicable_facets(node, facets, &primitive);
        self.backend(common).add_simple_classifier(SimpleClassifier {
            name: name.clone(),
            documentation: documentation.clone(),
            primitive: primitive.clone(),
            facets,
        })?;
        self.docs(scope).register(name.as_str(), &documentation);
        Ok(self.context(ContentCategory::Simple, name, scope, common, Some(primitive)))
    }

    fn define_replacement(
        &mut self,
        node: &ClassifierNode,
        scope: ScopePair,
    ) -> Result<ClassifierContext> {
        let missing = || Error::MissingReplacementClassifier {
            classifier: node.name.clone(),
        };
        let model = self.model;
        let replacement = self
            .config
            .classifiers
            .enumeration_replacement
            .as_deref()
            .and_then(|name| model.classifier(name))
            .ok_or_else(missing)?;
        if replacement.kind == ClassifierKind::Enumeration && replacement.suppress_enumeration {
            return Err(missing());
        }

        tracing::debug!(
            classifier = %node.name,
            replacement = %replacement.name,
            "enumeration suppressed"
        );
        self.resolve_cached(replacement, scope)
    }

    fn define_enum(
        &mut self,
        node: &ClassifierNode,
        scope: ScopePair,
        primitive: PrimitiveType,
    ) -> Result<ClassifierContext> {
        let supplementaries = self.get_supplementaries(node, scope)?;
        let common = self.targets_common(scope);
        let mut name = to_pascal_case(node.display_name());
        if !common && scope.schema == SchemaScope::Message {
            name = with_prefix(&to_pascal_case(self.role), &name);
        }

        let items: Vec<EnumItem> = node
            .metadata
            .iter()
            .filter(|m| m.kind != MetadataKind::Supplementary)
            .map(|m| EnumItem::new(m.name.as_str(), m.documentation.as_str()))
            .collect();
        if items.is_empty() {
            self.diagnostics.push(
                Diagnostic::warning("enumeration declares no literals")
                    .with_subject(node.name.as_str()),
            );
        }

        let documentation = self.documentation_of(node);
        self.backend(common).add_enum_classifier(EnumClassifier {
            name: name.clone(),
            documentation: documentation.clone(),
            primitive: primitive.clone(),
            items: items.clone(),
            supplementaries,
        })?;

        let docs = self.docs(scope);
        docs.register(name.as_str(), &documentation);
        for item in &items {
            docs.register(format!("{}.{}", name, item.value), &item.documentation);
        }
        Ok(self.context(ContentCategory::Enum, name, scope, common, Some(primitive)))
    }

    fn define_external(
        &mut self,
        node: &ClassifierNode,
        scope: ScopePair,
    ) -> Result<ClassifierContext> {
        let config = self.config;
        let tags = &config.external_reference;
        let tag = |name: &str| node.tagged_value(name).unwrap_or("").trim().to_string();

        let namespace = tag(&tags.namespace);
        if namespace.is_empty() {
            self.diagnostics.push(
                Diagnostic::error("external reference has no namespace")
                    .with_subject(node.name.as_str())
                    .with_fallback("no definition"),
            );
            return Ok(ClassifierContext::unknown(node.display_name(), scope));
        }

        let mut namespace_token = tag(&tags.namespace_token);
        if namespace_token.is_empty() {
            namespace_token = "ext".to_string();
            self.diagnostics.push(
                Diagnostic::warning("external reference has no namespace token")
                    .with_subject(node.name.as_str())
                    .with_fallback("ext"),
            );
        }
        let schema_name = tag(&tags.schema_name);
        let mut base_type = tag(&tags.base_type);
        if base_type.is_empty() {
            base_type = node.display_name().to_string();
        }
        let cardinality = Cardinality::parse_occurs(&tag(&tags.min_occurs), &tag(&tags.max_occurs))
            .with_subject(node.name.as_str())
            .into_value(self.diagnostics);

        let common = self.targets_common(scope);
        let name = to_pascal_case(node.display_name());
        let documentation = self.documentation_of(node);

        let backend = self.backend(common);
        backend.add_namespace(&namespace_token, &namespace)?;
        backend.add_schema_reference(&namespace, &schema_name);
        backend.add_external_classifier(ExternalClassifier {
            name: name.clone(),
            documentation: documentation.clone(),
            namespace,
            namespace_token,
            schema_name,
            base_type,
            cardinality,
        })?;
        self.docs(scope).register(name.as_str(), &documentation);
        Ok(self.context(ContentCategory::Complex, name, scope, common, None))
    }

    /// Supplementary attributes declared on `node`, resolved for `scope`
    ///
    /// An enumeration-typed supplementary with a fixed value is typed with
    /// the configured string classifier instead, as the value is no longer
    /// a choice. When `node` lands in the common schema, narrower
    /// supplementary classifiers are widened to `scope` so the common
    /// schema never refers to a local one.
    pub fn get_supplementaries(
        &mut self,
        node: &ClassifierNode,
        scope: ScopePair,
    ) -> Result<Vec<SchemaAttribute>> {
        let model = self.model;
        let config = self.config;
        let dialect = self.dialect();
        let shared = self.targets_common(scope);
        let mut supplementaries = Vec::new();

        for m in node.metadata_of(MetadataKind::Supplementary) {
            let declared = m
                .classifier
                .as_deref()
                .unwrap_or(&config.classifiers.string_classifier);
            let fixed_enum = m.fixed_value.is_some()
                && matches!(model.classifier(declared), Some(c) if c.kind == ClassifierKind::Enumeration);
            let classifier = if fixed_enum {
                config.classifiers.string_classifier.as_str()
            } else {
                declared
            };

            let resolved = match model.classifier(classifier) {
                Some(target) => {
                    let mut member_scope = target.scope;
                    if shared && !target.scope.targets_common() {
                        member_scope = target.scope.widened_to(scope.schema);
                        self.diagnostics.push(widened(
                            target.scope,
                            format!("{}.{}", node.name, m.name),
                        ));
                    }
                    let context = self
                        .resolve_cached(target, ScopePair::new(member_scope, target.doc_scope))?;
                    if !context.is_resolved() {
                        continue;
                    }
                    let primitive = if context.is_primitive {
                        context.primitive.clone()
                    } else {
                        None
                    };
                    (context.type_ref(), primitive)
                }
                None => {
                    let fallback = if fixed_enum { STRING } else { classifier };
                    match normalize_primitive_name(fallback).and_then(|p| PrimitiveType::new(dialect, p)) {
                        Some(primitive) => (
                            TypeRef::primitive(dialect.primitive_token(), primitive.base_type),
                            Some(primitive),
                        ),
                        None => {
                            self.diagnostics.push(
                                Diagnostic::from(&Error::UnknownClassifier(classifier.to_string()))
                                    .with_subject(format!("{}.{}", node.name, m.name))
                                    .with_fallback("attribute skipped"),
                            );
                            continue;
                        }
                    }
                }
            };

            let (type_ref, primitive) = resolved;
            supplementaries.push(
                SchemaAttribute::supplementary(m.name.as_str(), type_ref, m.optional)
                    .with_primitive(primitive)
                    .with_values(m.default_value.clone(), m.fixed_value.clone())
                    .with_documentation(m.documentation.as_str()),
            );
        }

        Ok(supplementaries)
    }

    /// Walk the base chain to a normalized primitive name
    fn primitive_of(&self, node: &ClassifierNode) -> Option<&'static str> {
        let mut visited = HashSet::new();
        let mut current = node;
        loop {
            if let Some(primitive) = normalize_primitive_name(&current.name) {
                return Some(primitive);
            }
            if !visited.insert(current.id.clone()) {
                tracing::warn!(classifier = %node.name, "base chain is cyclic");
                return None;
            }
            let base = current.base.as_deref()?;
            match self.model.classifier(base) {
                Some(next) => current = next,
                None => return normalize_primitive_name(base),
            }
        }
    }

    fn applicable_facets(
        &mut self,
        node: &ClassifierNode,
        facets: Vec<Facet>,
        primitive: &PrimitiveType,
    ) -> Vec<Facet> {
        let (valid, dropped): (Vec<Facet>, Vec<Facet>) =
            facets.into_iter().partition(|f| f.is_valid(primitive));
        for facet in dropped {
            self.diagnostics.push(
                Diagnostic::warning(format!("facet {} does not apply to {}", facet, primitive))
                    .with_subject(node.name.as_str()),
            );
        }
        valid
    }

    fn documentation_of(&self, node: &ClassifierNode) -> String {
        if !node.documentation.trim().is_empty() {
            return node.documentation.clone();
        }
        self.config
            .documentation
            .tagged_values
            .iter()
            .filter_map(|tag| node.tagged_value(tag))
            .find(|text| !text.trim().is_empty())
            .unwrap_or("")
            .to_string()
    }

    fn context(
        &self,
        category: ContentCategory,
        name: String,
        scope: ScopePair,
        common: bool,
        primitive: Option<PrimitiveType>,
    ) -> ClassifierContext {
        ClassifierContext {
            category,
            name,
            scope,
            in_common_schema: common,
            namespace_token: self.target_token(common),
            primitive,
            is_primitive: false,
        }
    }
}

/// Warning for a member moved into the common schema with its owner
pub(crate) fn widened(scope: SchemaScope, subject: impl Into<String>) -> Diagnostic {
    Diagnostic::warning(format!("{} scoped type used by a shared type", scope))
        .with_subject(subject)
        .with_fallback("defined in the common schema")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::cardinality::Cardinality;
    use crate::schema::{AbieType, Definition, ElementDecl, Schema};
    use indexmap::IndexMap;
    use std::io::Write;

    /// Delegates to a real schema and records every emission
    struct SpyBackend {
        inner: Schema,
        calls: Vec<&'static str>,
    }

    impl SpyBackend {
        fn new(namespace: &str, token: &str) -> Self {
            Self {
                inner: Schema::new(Dialect::Xml, namespace, token, "1.0").unwrap(),
                calls: Vec::new(),
            }
        }
    }

    impl SchemaBackend for SpyBackend {
        fn dialect(&self) -> Dialect {
            self.inner.dialect()
        }
        fn namespace(&self) -> &str {
            self.inner.namespace()
        }
        fn namespace_token(&self) -> &str {
            self.inner.namespace_token()
        }
        fn version(&self) -> &str {
            self.inner.version()
        }
        fn add_simple_classifier(&mut self, classifier: SimpleClassifier) -> Result<()> {
            self.calls.push("simple");
            self.inner.add_simple_classifier(classifier)
        }
        fn add_complex_classifier(&mut self, classifier: ComplexClassifier) -> Result<Vec<Facet>> {
            self.calls.push("complex");
            self.inner.add_complex_classifier(classifier)
        }
        fn add_enum_classifier(&mut self, classifier: EnumClassifier) -> Result<()> {
            self.calls.push("enum");
            self.inner.add_enum_classifier(classifier)
        }
        fn add_external_classifier(&mut self, classifier: ExternalClassifier) -> Result<()> {
            self.calls.push("external");
            self.inner.add_external_classifier(classifier)
        }
        fn add_abie_type(&mut self, abie: AbieType) -> Result<()> {
            self.calls.push("abie");
            self.inner.add_abie_type(abie)
        }
        fn add_element(&mut self, element: ElementDecl) -> Result<()> {
            self.calls.push("element");
            self.inner.add_element(element)
        }
        fn add_namespace(&mut self, token: &str, uri: &str) -> Result<()> {
            self.inner.add_namespace(token, uri)
        }
        fn add_schema_reference(&mut self, namespace: &str, location: &str) {
            self.inner.add_schema_reference(namespace, location)
        }
        fn merge(&mut self, other: Schema) -> Result<()> {
            self.inner.merge(other)
        }
        fn sort(&mut self) {
            self.inner.sort()
        }
        fn save(&self, out: &mut dyn Write, header: &str) -> Result<()> {
            self.inner.save(out, header)
        }
    }

    struct Harness {
        model: Model,
        config: GeneratorConfig,
        cache: ClassifierCache,
        common: Option<SpyBackend>,
        local: SpyBackend,
        common_docs: DocContext,
        local_docs: DocContext,
        diagnostics: Diagnostics,
        role: &'static str,
    }

    impl Harness {
        fn new(classifiers: Vec<ClassifierNode>, with_common: bool) -> Self {
            Self {
                model: Model::new(classifiers, Vec::new(), Vec::new()),
                config: GeneratorConfig::default(),
                cache: ClassifierCache::new(),
                common: with_common.then(|| SpyBackend::new("urn:test:common", "cmn")),
                local: SpyBackend::new("urn:test:order", "tns"),
                common_docs: DocContext::new(DocScope::Common),
                local_docs: DocContext::new(DocScope::Local),
                diagnostics: Diagnostics::new(),
                role: "CreateOrder",
            }
        }

        fn run<R>(
            &mut self,
            id: &str,
            scope: ScopePair,
            f: impl FnOnce(&mut ClassifierResolver<'_>, &ClassifierNode, ScopePair) -> R,
        ) -> R {
            let node = self.model.classifier(id).unwrap();
            let targets = ResolverTargets {
                common: self.common.as_mut().map(|c| c as &mut dyn SchemaBackend),
                local: &mut self.local,
                common_docs: &mut self.common_docs,
                local_docs: &mut self.local_docs,
            };
            let mut resolver = ClassifierResolver::new(
                &self.model,
                &self.config,
                &mut self.cache,
                targets,
                self.role,
                &mut self.diagnostics,
            );
            f(&mut resolver, node, scope)
        }

        fn resolve(&mut self, id: &str, scope: ScopePair) -> Result<ClassifierContext> {
            self.run(id, scope, |r, node, scope| r.resolve_cached(node, scope))
        }

        fn common_definition(&self, name: &str) -> Option<&Definition> {
            self.common.as_ref()?.inner.document().definition(name)
        }

        fn local_definition(&self, name: &str) -> Option<&Definition> {
            self.local.inner.document().definition(name)
        }
    }

    fn classifier(id: &str, name: &str, kind: ClassifierKind, base: Option<&str>) -> ClassifierNode {
        ClassifierNode {
            id: id.to_string(),
            name: name.to_string(),
            alias: String::new(),
            kind,
            documentation: String::new(),
            base: base.map(str::to_string),
            metadata: Vec::new(),
            suppress_enumeration: false,
            tagged_values: IndexMap::new(),
            scope: SchemaScope::Interface,
            doc_scope: DocScope::Common,
        }
    }

    fn literal(name: &str) -> MetadataDescriptor {
        MetadataDescriptor {
            name: name.to_string(),
            kind: MetadataKind::Literal,
            classifier: None,
            default_value: None,
            fixed_value: None,
            documentation: format!("{} literal", name),
            optional: false,
        }
    }

    fn supplementary(name: &str, classifier: &str, fixed: Option<&str>) -> MetadataDescriptor {
        MetadataDescriptor {
            name: name.to_string(),
            kind: MetadataKind::Supplementary,
            classifier: Some(classifier.to_string()),
            default_value: None,
            fixed_value: fixed.map(str::to_string),
            documentation: String::new(),
            optional: true,
        }
    }

    fn interface() -> ScopePair {
        ScopePair::new(SchemaScope::Interface, DocScope::Common)
    }

    fn message() -> ScopePair {
        ScopePair::new(SchemaScope::Message, DocScope::Local)
    }

    #[test]
    fn test_get_facets_fixed_value_wins() {
        let mut facet = MetadataDescriptor::facet("maxLength", "10");
        facet.fixed_value = Some("35".to_string());
        let facets = get_facets(&[facet, literal("A")], Dialect::Xml);
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].value(), "35");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut amount = classifier("c-amount", "Amount", ClassifierKind::Simple, Some("decimal"));
        amount.metadata.push(MetadataDescriptor::facet("totalDigits", "10"));
        let mut h = Harness::new(vec![amount], true);

        let first = h.resolve("c-amount", interface()).unwrap();
        let second = h.resolve("c-amount", interface()).unwrap();

        assert_eq!(first, second);
        assert_eq!(h.common.as_ref().unwrap().calls, vec!["simple"]);
        assert!(h.local.calls.is_empty());
        assert_eq!(h.cache.classifier_count(), 1);
        assert_eq!(first.type_ref().to_string(), "cmn:Amount");
        assert!(first.in_common_schema);
    }

    #[test]
    fn test_define_does_not_cache() {
        let amount = classifier("c-amount", "Amount", ClassifierKind::Simple, Some("decimal"));
        let mut h = Harness::new(vec![amount], false);

        let ctx = h
            .run("c-amount", interface(), |r, node, scope| r.define_classifier(node, scope))
            .unwrap();
        assert_eq!(ctx.category, ContentCategory::Simple);
        assert_eq!(h.cache.classifier_count(), 0);
        // Without a common schema everything lands locally
        assert_eq!(ctx.namespace_token, "tns");
        assert!(h.local_definition("Amount").is_some());
    }

    #[test]
    fn test_bare_primitive_not_emitted() {
        let string = classifier("c-string", "String", ClassifierKind::Simple, None);
        let mut h = Harness::new(vec![string], true);

        let ctx = h.resolve("c-string", interface()).unwrap();
        assert!(ctx.is_primitive);
        assert_eq!(ctx.type_ref().to_string(), "xs:string");
        assert!(h.common.as_ref().unwrap().calls.is_empty());
        assert!(h.local.calls.is_empty());
    }

    #[test]
    fn test_fraction_digits_zero_substitutes_integer() {
        let mut quantity = classifier("c-qty", "Quantity", ClassifierKind::Simple, Some("decimal"));
        quantity.metadata.push(MetadataDescriptor::facet("fractionDigits", "0"));
        quantity.metadata.push(MetadataDescriptor::facet("totalDigits", "8"));
        let mut h = Harness::new(vec![quantity], true);

        let ctx = h.resolve("c-qty", interface()).unwrap();
        assert_eq!(ctx.primitive.as_ref().map(|p| p.name), Some("integer"));
        match h.common_definition("Quantity") {
            Some(Definition::Simple(def)) => {
                assert_eq!(def.primitive.name, "integer");
                assert_eq!(def.facets.len(), 1);
                assert_eq!(def.facets[0].name(), "totalDigits");
            }
            other => panic!("unexpected definition {:?}", other),
        }
    }

    #[test]
    fn test_inapplicable_facet_dropped_with_warning() {
        let mut flag = classifier("c-flag", "Flag", ClassifierKind::Simple, Some("boolean"));
        flag.metadata.push(MetadataDescriptor::facet("maxLength", "5"));
        let mut h = Harness::new(vec![flag], true);

        h.resolve("c-flag", interface()).unwrap();
        match h.common_definition("Flag") {
            Some(Definition::Simple(def)) => assert!(def.facets.is_empty()),
            other => panic!("unexpected definition {:?}", other),
        }
        assert_eq!(h.diagnostics.len(), 1);
        assert!(!h.diagnostics.has_errors());
    }

    #[test]
    fn test_complex_with_supplementary() {
        let string = classifier("c-string", "String", ClassifierKind::Simple, None);
        let mut amount = classifier("c-amount", "Amount", ClassifierKind::Complex, Some("decimal"));
        amount.metadata.push(supplementary("currencyID", "String", None));
        let mut h = Harness::new(vec![string, amount], true);

        let ctx = h.resolve("c-amount", interface()).unwrap();
        assert_eq!(ctx.category, ContentCategory::Complex);
        match h.common_definition("Amount") {
            Some(Definition::Complex(def)) => {
                assert_eq!(def.supplementaries.len(), 1);
                let attr = &def.supplementaries[0];
                assert_eq!(attr.name, "currencyID");
                assert_eq!(attr.type_ref.to_string(), "xs:string");
                assert_eq!(attr.cardinality, Cardinality::OPTIONAL);
            }
            other => panic!("unexpected definition {:?}", other),
        }
        // The supplementary classifier is cached as well
        assert_eq!(h.cache.classifier_count(), 2);
    }

    #[test]
    fn test_fixed_enum_supplementary_typed_as_string() {
        let mut unit = classifier("c-unit", "UnitCode", ClassifierKind::Enumeration, Some("string"));
        unit.metadata.push(literal("KGM"));
        let mut measure = classifier("c-measure", "Measure", ClassifierKind::Complex, Some("decimal"));
        measure.metadata.push(supplementary("unitCode", "UnitCode", Some("KGM")));
        let mut h = Harness::new(vec![unit, measure], true);

        h.resolve("c-measure", interface()).unwrap();
        match h.common_definition("Measure") {
            Some(Definition::Complex(def)) => {
                assert_eq!(def.supplementaries[0].type_ref.to_string(), "xs:string");
                assert_eq!(def.supplementaries[0].fixed_value.as_deref(), Some("KGM"));
            }
            other => panic!("unexpected definition {:?}", other),
        }
        assert!(!h.common.as_ref().unwrap().calls.contains(&"enum"));
    }

    #[test]
    fn test_enum_at_message_scope_is_role_prefixed() {
        let mut status = classifier("c-status", "Status", ClassifierKind::Enumeration, Some("string"));
        status.metadata.push(literal("Open"));
        status.metadata.push(literal("Closed"));
        let mut h = Harness::new(vec![status], true);

        let ctx = h.resolve("c-status", message()).unwrap();
        assert_eq!(ctx.category, ContentCategory::Enum);
        assert_eq!(ctx.type_ref().to_string(), "tns:CreateOrderStatus");
        match h.local_definition("CreateOrderStatus") {
            Some(Definition::Enum(def)) => {
                let values: Vec<&str> = def.items.iter().map(|i| i.value.as_str()).collect();
                assert_eq!(values, vec!["Open", "Closed"]);
            }
            other => panic!("unexpected definition {:?}", other),
        }
        assert_eq!(h.local_docs.get("CreateOrderStatus.Open"), Some("Open literal"));
    }

    #[test]
    fn test_enum_in_common_keeps_name() {
        let mut status = classifier("c-status", "Status", ClassifierKind::Enumeration, Some("string"));
        status.metadata.push(literal("Open"));
        let mut h = Harness::new(vec![status], true);

        let ctx = h.resolve("c-status", interface()).unwrap();
        assert_eq!(ctx.type_ref().to_string(), "cmn:Status");
        assert!(h.common_definition("Status").is_some());
    }

    #[test]
    fn test_suppressed_enum_without_replacement_fails() {
        let mut status = classifier("c-status", "Status", ClassifierKind::Enumeration, Some("string"));
        status.suppress_enumeration = true;
        let mut h = Harness::new(vec![status], true);

        let err = h.resolve("c-status", interface()).unwrap_err();
        assert!(matches!(err, Error::MissingReplacementClassifier { .. }));
        assert_eq!(h.cache.classifier_count(), 0);
    }

    #[test]
    fn test_suppressed_enum_uses_replacement() {
        let mut status = classifier("c-status", "Status", ClassifierKind::Enumeration, Some("string"));
        status.suppress_enumeration = true;
        let mut text = classifier("c-text", "Text", ClassifierKind::Simple, Some("string"));
        text.metadata.push(MetadataDescriptor::facet("maxLength", "35"));
        let mut h = Harness::new(vec![status, text], true);
        h.config.classifiers.enumeration_replacement = Some("Text".to_string());

        let ctx = h.resolve("c-status", interface()).unwrap();
        assert_eq!(ctx.name, "Text");
        assert_eq!(ctx.category, ContentCategory::Simple);
        assert!(h.common_definition("Status").is_none());
    }

    #[test]
    fn test_unknown_kind_reports_and_continues() {
        let blob = classifier("c-blob", "Blob", ClassifierKind::Unknown, None);
        let mut h = Harness::new(vec![blob], true);

        let ctx = h.resolve("c-blob", interface()).unwrap();
        assert!(!ctx.is_resolved());
        assert!(h.diagnostics.has_errors());
        assert!(h.common.as_ref().unwrap().calls.is_empty());
    }

    #[test]
    fn test_unresolved_primitive() {
        let blob = classifier("c-blob", "Blob", ClassifierKind::Simple, None);
        let mut h = Harness::new(vec![blob], false);

        let err = h.resolve("c-blob", interface()).unwrap_err();
        assert!(matches!(err, Error::UnresolvedPrimitive { ref classifier } if classifier == "Blob"));
    }

    #[test]
    fn test_cyclic_base_chain_is_unresolved() {
        let a = classifier("c-a", "A", ClassifierKind::Simple, Some("c-b"));
        let b = classifier("c-b", "B", ClassifierKind::Simple, Some("c-a"));
        let mut h = Harness::new(vec![a, b], false);

        assert!(matches!(
            h.resolve("c-a", interface()),
            Err(Error::UnresolvedPrimitive { .. })
        ));
    }

    #[test]
    fn test_external_reference() {
        let mut party = classifier("c-party", "PartyRef", ClassifierKind::ExternalReference, None);
        for (k, v) in [
            ("namespace", "urn:ext:party"),
            ("namespaceToken", "pty"),
            ("schemaName", "party.xsd"),
            ("baseType", "Party"),
            ("maxOccurs", "*"),
        ] {
            party.tagged_values.insert(k.to_string(), v.to_string());
        }
        let mut h = Harness::new(vec![party], false);

        let ctx = h.resolve("c-party", interface()).unwrap();
        assert_eq!(ctx.category, ContentCategory::Complex);
        let doc = h.local.inner.document();
        assert_eq!(doc.namespaces().get_namespace("pty"), Some("urn:ext:party"));
        assert!(doc.references().any(|(ns, loc)| ns == "urn:ext:party" && loc == "party.xsd"));
        match doc.definition("PartyRef") {
            Some(Definition::External(def)) => {
                assert_eq!(def.base_ref().to_string(), "pty:Party");
                assert_eq!(def.cardinality, Cardinality::new(1, 0));
            }
            other => panic!("unexpected definition {:?}", other),
        }
    }

    #[test]
    fn test_external_reference_without_namespace() {
        let party = classifier("c-party", "PartyRef", ClassifierKind::ExternalReference, None);
        let mut h = Harness::new(vec![party], false);

        let ctx = h.resolve("c-party", interface()).unwrap();
        assert!(!ctx.is_resolved());
        assert!(h.diagnostics.has_errors());
        assert!(h.local.calls.is_empty());
    }

    #[test]
    fn test_documentation_falls_back_to_tagged_value() {
        let mut amount = classifier("c-amount", "Amount", ClassifierKind::Simple, Some("decimal"));
        amount
            .tagged_values
            .insert("Description".to_string(), "A monetary amount".to_string());
        let mut h = Harness::new(vec![amount], true);

        h.resolve("c-amount", interface()).unwrap();
        assert_eq!(h.common_docs.get("Amount"), Some("A monetary amount"));
    }

    #[test]
    fn test_message_scope_enum_keys_include_role() {
        let amount = classifier("c-amount", "Amount", ClassifierKind::Simple, Some("decimal"));
        let status = classifier("c-status", "Status", ClassifierKind::Enumeration, Some("string"));
        let h = &mut Harness::new(vec![amount, status], true);

        let key = h.run("c-status", message(), |r, node, scope| r.classifier_key(node, scope));
        assert_eq!(key, "c-status@urn:test:order/message/local/CreateOrder");
        let key = h.run("c-amount", message(), |r, node, scope| r.classifier_key(node, scope));
        assert_eq!(key, "c-amount@urn:test:order/message/local");
        let key = h.run("c-amount", interface(), |r, node, scope| r.classifier_key(node, scope));
        assert_eq!(key, "c-amount@common/common");
    }

    #[test]
    fn test_message_scope_simple_shared_by_roles() {
        let mut amount = classifier("c-amount", "Amount", ClassifierKind::Simple, Some("decimal"));
        amount.metadata.push(MetadataDescriptor::facet("totalDigits", "10"));
        let mut h = Harness::new(vec![amount], true);

        let request = h.resolve("c-amount", message()).unwrap();
        h.role = "CreateOrderResult";
        let response = h.resolve("c-amount", message()).unwrap();

        assert_eq!(request, response);
        assert_eq!(request.type_ref().to_string(), "tns:Amount");
        assert_eq!(h.local.calls, vec!["simple"]);
        assert_eq!(h.cache.classifier_count(), 1);
    }

    #[test]
    fn test_date_type_substitutes_g_year() {
        let mut year = classifier("c-year", "Year", ClassifierKind::Simple, Some("date"));
        year.metadata.push(MetadataDescriptor::facet("dateType", "gYear"));
        let mut h = Harness::new(vec![year], true);

        let ctx = h.resolve("c-year", interface()).unwrap();
        assert_eq!(ctx.primitive.as_ref().map(|p| p.name), Some("gYear"));
        match h.common_definition("Year") {
            Some(Definition::Simple(def)) => {
                assert_eq!(def.primitive.name, "gYear");
                assert_eq!(def.primitive.base_type, "gYear");
                assert!(def.facets.is_empty());
            }
            other => panic!("unexpected definition {:?}", other),
        }
        assert!(h.diagnostics.is_empty());
    }

    #[test]
    fn test_same_name_different_definition_conflicts() {
        let mut short = classifier("c-code1", "Code", ClassifierKind::Simple, Some("string"));
        short.metadata.push(MetadataDescriptor::facet("maxLength", "3"));
        short.documentation = "Three letter code".to_string();
        let mut number = classifier("c-code2", "Code", ClassifierKind::Simple, Some("integer"));
        number.metadata.push(MetadataDescriptor::facet("maxInclusive", "99"));
        number.documentation = "Numeric code".to_string();
        let mut h = Harness::new(vec![short, number], true);

        let first = h.resolve("c-code1", interface()).unwrap();
        assert_eq!(first.type_ref().to_string(), "cmn:Code");

        let err = h.resolve("c-code2", interface()).unwrap_err();
        assert!(matches!(err, Error::ConflictingDefinition { ref name } if name == "Code"));
        assert!(err.is_data_error());
        // Nothing points at the definition that was refused
        assert_eq!(h.cache.classifier_count(), 1);
        match h.common_definition("Code") {
            Some(Definition::Simple(def)) => assert_eq!(def.primitive.name, "string"),
            other => panic!("unexpected definition {:?}", other),
        }
        assert_eq!(h.common_docs.get("Code"), Some("Three letter code"));
    }

    #[test]
    fn test_same_definition_under_two_keys_is_accepted() {
        let mut code = classifier("c-code", "Code", ClassifierKind::Simple, Some("string"));
        code.metadata.push(MetadataDescriptor::facet("maxLength", "3"));
        code.doc_scope = DocScope::Local;
        let mut h = Harness::new(vec![code], true);

        let scope = ScopePair::new(SchemaScope::Interface, DocScope::Local);
        h.resolve("c-code", scope).unwrap();
        h.local = SpyBackend::new("urn:test:other", "tns");
        // Another operation re-emits the identical common definition
        let ctx = h.resolve("c-code", scope).unwrap();

        assert_eq!(ctx.type_ref().to_string(), "cmn:Code");
        assert_eq!(h.cache.classifier_count(), 2);
        assert_eq!(h.common.as_ref().unwrap().inner.document().len(), 1);
    }

    #[test]
    fn test_shared_type_widens_local_supplementary() {
        let mut unit = classifier("c-unit", "UnitCode", ClassifierKind::Simple, Some("string"));
        unit.metadata.push(MetadataDescriptor::facet("maxLength", "3"));
        unit.scope = SchemaScope::Operation;
        let mut measure = classifier("c-measure", "Measure", ClassifierKind::Complex, Some("decimal"));
        measure.metadata.push(supplementary("unitCode", "UnitCode", None));
        let mut h = Harness::new(vec![unit, measure], true);

        h.resolve("c-measure", interface()).unwrap();
        match h.common_definition("Measure") {
            Some(Definition::Complex(def)) => {
                assert_eq!(def.supplementaries[0].type_ref.to_string(), "cmn:UnitCode");
            }
            other => panic!("unexpected definition {:?}", other),
        }
        assert!(h.common_definition("UnitCode").is_some());
        assert!(h.local.calls.is_empty());
        assert_eq!(h.diagnostics.len(), 1);
        assert!(!h.diagnostics.has_errors());
    }
}
