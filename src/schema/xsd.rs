//! XML Schema dialect
//!
//! Primitive translation, facet admission and serialization of a
//! [`Schema`] as an XSD 1.0 document.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

use super::document::{
    AbieType, ComplexClassifier, Component, Definition, ElementDecl, EnumClassifier,
    ExternalClassifier, Particle, SimpleClassifier,
};
use super::facets::{Facet, FacetToken};
use super::primitives::{self, PrimitiveFamily, PrimitiveType};
use super::{Schema, SchemaBackend};
use crate::compiler::attributes::{SchemaAssociation, SchemaAttribute};
use crate::compiler::cardinality::Cardinality;
use crate::compiler::choice::{Choice, ChoiceMember};
use crate::error::Result;
use crate::XSD_NAMESPACE;

/// Token the XSD namespace is bound to
pub const PRIMITIVE_TOKEN: &str = "xs";

/// Suffix of the simple type holding the restricted content of a complex
/// classifier
pub const CONTENT_SUFFIX: &str = "Content";

// =============================================================================
// Primitive And Facet Tables
// =============================================================================

/// XSD built-in type for a normalized primitive name
pub fn primitive_base_type(normalized: &str) -> Option<&'static str> {
    let base = match normalized {
        primitives::STRING => "string",
        primitives::TOKEN => "token",
        primitives::BOOLEAN => "boolean",
        primitives::DECIMAL => "decimal",
        primitives::INTEGER => "integer",
        primitives::FLOAT => "float",
        primitives::DOUBLE => "double",
        primitives::DATE => "date",
        primitives::DATE_TIME => "dateTime",
        primitives::TIME => "time",
        primitives::DURATION => "duration",
        primitives::G_YEAR => "gYear",
        primitives::G_YEAR_MONTH => "gYearMonth",
        primitives::G_MONTH => "gMonth",
        primitives::G_MONTH_DAY => "gMonthDay",
        primitives::G_DAY => "gDay",
        primitives::BINARY => "base64Binary",
        primitives::HEX_BINARY => "hexBinary",
        primitives::URI => "anyURI",
        _ => return None,
    };
    Some(base)
}

/// Whether XSD allows `token` on a primitive of `family`
pub fn admits_facet(token: FacetToken, family: PrimitiveFamily) -> bool {
    use FacetToken::*;
    match token {
        Pattern | WhiteSpace => true,
        Enumeration => family != PrimitiveFamily::Boolean,
        Length | MinLength | MaxLength => matches!(
            family,
            PrimitiveFamily::String | PrimitiveFamily::Binary | PrimitiveFamily::Uri
        ),
        MinInclusive | MaxInclusive | MinExclusive | MaxExclusive => {
            family.is_numeric() || family == PrimitiveFamily::DateTime
        }
        TotalDigits | FractionDigits => {
            matches!(family, PrimitiveFamily::Decimal | PrimitiveFamily::Integer)
        }
        DateType => family == PrimitiveFamily::DateTime,
    }
}

/// Element name of a facet, without prefix
pub fn facet_keyword(token: FacetToken) -> &'static str {
    match token {
        FacetToken::Length => "length",
        FacetToken::MinLength => "minLength",
        FacetToken::MaxLength => "maxLength",
        FacetToken::Pattern => "pattern",
        FacetToken::Enumeration => "enumeration",
        FacetToken::WhiteSpace => "whiteSpace",
        FacetToken::MinInclusive => "minInclusive",
        FacetToken::MaxInclusive => "maxInclusive",
        FacetToken::MinExclusive => "minExclusive",
        FacetToken::MaxExclusive => "maxExclusive",
        FacetToken::TotalDigits => "totalDigits",
        FacetToken::FractionDigits => "fractionDigits",
        FacetToken::DateType => "dateType",
    }
}

fn xs(local: &str) -> String {
    format!("{}:{}", PRIMITIVE_TOKEN, local)
}

// =============================================================================
// Writer
// =============================================================================

#[derive(Default)]
struct Attrs(Vec<(String, String)>);

impl Attrs {
    fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.push((key.to_string(), value.into()));
        self
    }

    fn with_opt(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    fn occurs(mut self, cardinality: Cardinality) -> Self {
        if cardinality.min != 1 {
            self = self.with("minOccurs", cardinality.min.to_string());
        }
        if cardinality.max != 1 {
            self = self.with("maxOccurs", cardinality.max_occurs());
        }
        self
    }

    fn tag(self, name: &str) -> BytesStart<'static> {
        let mut tag = BytesStart::new(name.to_string());
        for (key, value) in &self.0 {
            tag.push_attribute((key.as_str(), value.as_str()));
        }
        tag
    }
}

struct XsdWriter<'w> {
    writer: Writer<&'w mut dyn Write>,
    target_token: String,
}

impl<'w> XsdWriter<'w> {
    fn open(&mut self, name: &str, attrs: Attrs) -> Result<()> {
        self.writer.write_event(Event::Start(attrs.tag(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: Attrs) -> Result<()> {
        self.writer.write_event(Event::Empty(attrs.tag(name)))?;
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name.to_string())))?;
        Ok(())
    }

    /// `<xs:annotation>` block, skipped for empty text
    fn annotation(&mut self, documentation: &str) -> Result<()> {
        if documentation.trim().is_empty() {
            return Ok(());
        }
        self.open("xs:annotation", Attrs::default())?;
        self.open("xs:documentation", Attrs::default())?;
        self.writer
            .write_event(Event::Text(BytesText::new(documentation.trim())))?;
        self.close("xs:documentation")?;
        self.close("xs:annotation")
    }

    /// Element that only carries documentation when it has some
    fn leaf(&mut self, name: &str, attrs: Attrs, documentation: &str) -> Result<()> {
        if documentation.trim().is_empty() {
            self.empty(name, attrs)
        } else {
            self.open(name, attrs)?;
            self.annotation(documentation)?;
            self.close(name)
        }
    }

    fn local_ref(&self, name: &str) -> String {
        format!("{}:{}", self.target_token, name)
    }

    fn facets(&mut self, facets: &[Facet]) -> Result<()> {
        for facet in facets {
            match facet.token() {
                None | Some(FacetToken::DateType) => continue,
                Some(token) => {
                    let name = xs(facet_keyword(token));
                    self.empty(&name, Attrs::default().with("value", facet.value()))?;
                }
            }
        }
        Ok(())
    }

    fn restriction(&mut self, primitive: &PrimitiveType, facets: &[Facet]) -> Result<()> {
        let base = Attrs::default().with("base", xs(primitive.base_type));
        if facets.iter().all(|f| f.keyword().is_none() || f.token() == Some(FacetToken::DateType)) {
            return self.empty("xs:restriction", base);
        }
        self.open("xs:restriction", base)?;
        self.facets(facets)?;
        self.close("xs:restriction")
    }

    fn supplementaries(&mut self, attributes: &[SchemaAttribute]) -> Result<()> {
        for attribute in attributes {
            let attrs = Attrs::default()
                .with("name", attribute.name.as_str())
                .with("type", attribute.type_ref.to_string())
                .with("use", if attribute.is_optional() { "optional" } else { "required" })
                .with_opt("default", attribute.default_value.as_deref())
                .with_opt("fixed", attribute.fixed_value.as_deref());
            self.leaf("xs:attribute", attrs, &attribute.documentation)?;
        }
        Ok(())
    }

    /// Complex type with simple content extending `base`
    fn simple_content(
        &mut self,
        name: &str,
        documentation: &str,
        base: String,
        supplementaries: &[SchemaAttribute],
    ) -> Result<()> {
        self.open("xs:complexType", Attrs::default().with("name", name))?;
        self.annotation(documentation)?;
        self.open("xs:simpleContent", Attrs::default())?;
        let base = Attrs::default().with("base", base);
        if supplementaries.is_empty() {
            self.empty("xs:extension", base)?;
        } else {
            self.open("xs:extension", base)?;
            self.supplementaries(supplementaries)?;
            self.close("xs:extension")?;
        }
        self.close("xs:simpleContent")?;
        self.close("xs:complexType")
    }

    fn element(&mut self, element: &ElementDecl) -> Result<()> {
        let attrs = Attrs::default()
            .with("name", element.name.as_str())
            .with("type", element.type_ref.to_string());
        self.leaf("xs:element", attrs, &element.documentation)
    }

    fn simple(&mut self, classifier: &SimpleClassifier) -> Result<()> {
        self.open("xs:simpleType", Attrs::default().with("name", classifier.name.as_str()))?;
        self.annotation(&classifier.documentation)?;
        self.restriction(&classifier.primitive, &classifier.facets)?;
        self.close("xs:simpleType")
    }

    fn complex(&mut self, classifier: &ComplexClassifier) -> Result<()> {
        let base = if classifier.facets.is_empty() {
            xs(classifier.primitive.base_type)
        } else {
            let content = format!("{}{}", classifier.name, CONTENT_SUFFIX);
            self.open("xs:simpleType", Attrs::default().with("name", content.as_str()))?;
            self.restriction(&classifier.primitive, &classifier.facets)?;
            self.close("xs:simpleType")?;
            self.local_ref(&content)
        };
        self.simple_content(
            &classifier.name,
            &classifier.documentation,
            base,
            &classifier.supplementaries,
        )
    }

    fn enumeration_items(&mut self, classifier: &EnumClassifier) -> Result<()> {
        let base = Attrs::default().with("base", xs(classifier.primitive.base_type));
        if classifier.items.is_empty() {
            return self.empty("xs:restriction", base);
        }
        self.open("xs:restriction", base)?;
        for item in &classifier.items {
            let attrs = Attrs::default().with("value", item.value.as_str());
            self.leaf("xs:enumeration", attrs, &item.documentation)?;
        }
        self.close("xs:restriction")
    }

    fn enumeration(&mut self, classifier: &EnumClassifier) -> Result<()> {
        if classifier.supplementaries.is_empty() {
            self.open("xs:simpleType", Attrs::default().with("name", classifier.name.as_str()))?;
            self.annotation(&classifier.documentation)?;
            self.enumeration_items(classifier)?;
            return self.close("xs:simpleType");
        }

        let content = format!("{}{}", classifier.name, CONTENT_SUFFIX);
        self.open("xs:simpleType", Attrs::default().with("name", content.as_str()))?;
        self.enumeration_items(classifier)?;
        self.close("xs:simpleType")?;
        let base = self.local_ref(&content);
        self.simple_content(
            &classifier.name,
            &classifier.documentation,
            base,
            &classifier.supplementaries,
        )
    }

    fn external(&mut self, classifier: &ExternalClassifier) -> Result<()> {
        self.open("xs:complexType", Attrs::default().with("name", classifier.name.as_str()))?;
        self.annotation(&classifier.documentation)?;
        self.open("xs:sequence", Attrs::default())?;
        let attrs = Attrs::default()
            .with("ref", classifier.base_ref().to_string())
            .occurs(classifier.cardinality);
        self.empty("xs:element", attrs)?;
        self.close("xs:sequence")?;
        self.close("xs:complexType")
    }

    fn content_attribute(&mut self, attribute: &SchemaAttribute) -> Result<()> {
        let mut attrs = Attrs::default().with("name", attribute.name.as_str());
        let inline = attribute.restriction.iter().any(|f| f.keyword().is_some())
            && attribute.primitive.is_some();
        if !inline {
            attrs = attrs.with("type", attribute.type_ref.to_string());
        }
        let attrs = attrs
            .occurs(attribute.cardinality)
            .with_opt("default", attribute.default_value.as_deref())
            .with_opt("fixed", attribute.fixed_value.as_deref());

        match (&attribute.primitive, inline) {
            (Some(primitive), true) => {
                self.open("xs:element", attrs)?;
                self.annotation(&attribute.documentation)?;
                self.open("xs:simpleType", Attrs::default())?;
                self.restriction(primitive, &attribute.restriction)?;
                self.close("xs:simpleType")?;
                self.close("xs:element")
            }
            _ => self.leaf("xs:element", attrs, &attribute.documentation),
        }
    }

    fn association(&mut self, association: &SchemaAssociation) -> Result<()> {
        let attrs = Attrs::default()
            .with("name", association.name.as_str())
            .with("type", association.type_ref.to_string())
            .occurs(association.cardinality);
        self.leaf("xs:element", attrs, &association.documentation)
    }

    fn choice_member(&mut self, member: &ChoiceMember) -> Result<()> {
        match member {
            ChoiceMember::Attribute(a) => self.content_attribute(a),
            ChoiceMember::Association(a) => self.association(a),
        }
    }

    fn choice(&mut self, choice: &Choice) -> Result<()> {
        let attrs = Attrs::default().occurs(choice.cardinality().effective());
        self.open("xs:choice", attrs)?;
        for (_, members) in choice.branches() {
            if let [single] = members.as_slice() {
                self.choice_member(single)?;
                continue;
            }
            self.open("xs:sequence", Attrs::default())?;
            for member in members {
                self.choice_member(member)?;
            }
            self.close("xs:sequence")?;
        }
        self.close("xs:choice")
    }

    fn abie(&mut self, abie: &AbieType) -> Result<()> {
        self.open("xs:complexType", Attrs::default().with("name", abie.name.as_str()))?;
        self.annotation(&abie.documentation)?;
        let particles = abie.particles();
        if particles.is_empty() {
            self.empty("xs:sequence", Attrs::default())?;
        } else {
            self.open("xs:sequence", Attrs::default())?;
            for particle in particles {
                match particle {
                    Particle::Attribute(a) => self.content_attribute(a)?,
                    Particle::Association(a) => self.association(a)?,
                    Particle::Choice(c) => self.choice(c)?,
                }
            }
            self.close("xs:sequence")?;
        }
        self.supplementaries(&abie.supplementaries)?;
        self.close("xs:complexType")
    }

    fn component(&mut self, component: &Component) -> Result<()> {
        match component {
            Component::Element(e) => self.element(e),
            Component::Type(Definition::Simple(d)) => self.simple(d),
            Component::Type(Definition::Complex(d)) => self.complex(d),
            Component::Type(Definition::Enum(d)) => self.enumeration(d),
            Component::Type(Definition::External(d)) => self.external(d),
            Component::Type(Definition::Abie(d)) => self.abie(d),
        }
    }
}

/// Comments may not contain `--`
fn comment_text(header: &str) -> String {
    let mut text = header.trim().to_string();
    while text.contains("--") {
        text = text.replace("--", "- -");
    }
    format!(" {} ", text)
}

/// Serialize `schema` as an XSD document
pub fn write_schema(schema: &Schema, out: &mut dyn Write, header: &str) -> Result<()> {
    let mut xsd = XsdWriter {
        writer: Writer::new_with_indent(out, b' ', 2),
        target_token: schema.namespace_token().to_string(),
    };

    xsd.writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    if !header.trim().is_empty() {
        let comment = comment_text(header);
        xsd.writer
            .write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?;
    }

    let document = schema.document();
    let mut root = Attrs::default().with("xmlns:xs", XSD_NAMESPACE);
    for (token, uri) in document.namespaces().iter() {
        if token != PRIMITIVE_TOKEN {
            root = root.with(&format!("xmlns:{}", token), uri);
        }
    }
    let root = root
        .with("targetNamespace", schema.namespace())
        .with("elementFormDefault", "qualified")
        .with("attributeFormDefault", "unqualified")
        .with("version", schema.version());
    xsd.open("xs:schema", root)?;

    for (namespace, location) in document.references() {
        let attrs = Attrs::default()
            .with("namespace", namespace)
            .with("schemaLocation", location);
        xsd.empty("xs:import", attrs)?;
    }
    for component in document.components() {
        xsd.component(component)?;
    }

    xsd.close("xs:schema")?;
    xsd.writer.get_mut().write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::attributes::EnumItem;
    use crate::namespaces::TypeRef;
    use crate::schema::Dialect;

    fn prim(name: &str) -> PrimitiveType {
        PrimitiveType::new(Dialect::Xml, name).unwrap()
    }

    fn render(schema: &Schema) -> String {
        schema.to_string_with_header("Generated -- test").unwrap()
    }

    #[test]
    fn test_primitive_table() {
        assert_eq!(primitive_base_type("uri"), Some("anyURI"));
        assert_eq!(primitive_base_type("gMonthDay"), Some("gMonthDay"));
        assert_eq!(primitive_base_type("Amount"), None);
    }

    #[test]
    fn test_facet_admission() {
        assert!(admits_facet(FacetToken::MaxLength, PrimitiveFamily::String));
        assert!(!admits_facet(FacetToken::MaxLength, PrimitiveFamily::Decimal));
        assert!(admits_facet(FacetToken::MinInclusive, PrimitiveFamily::DateTime));
        assert!(!admits_facet(FacetToken::Enumeration, PrimitiveFamily::Boolean));
    }

    #[test]
    fn test_comment_sanitized() {
        assert_eq!(comment_text("a -- b"), " a - - b ");
        assert_eq!(comment_text("a --- b"), " a - - - b ");
    }

    #[test]
    fn test_write_simple_and_element() {
        let mut schema = Schema::new(Dialect::Xml, "urn:example:order", "tns", "1.0").unwrap();
        schema.add_simple_classifier(SimpleClassifier {
            name: "Code".to_string(),
            documentation: "A short code".to_string(),
            primitive: prim("string"),
            facets: vec![Facet::new(Dialect::Xml, "maxLength", "3")],
        }).unwrap();
        schema.add_element(ElementDecl {
            name: "Order".to_string(),
            type_ref: TypeRef::new("tns", "Code"),
            documentation: String::new(),
            sequence_key: 1,
        }).unwrap();
        schema.sort();
        let xml = render(&schema);

        let doc = roxmltree::Document::parse(&xml).unwrap();
        let root = doc.root_element();
        assert_eq!(root.attribute("targetNamespace"), Some("urn:example:order"));

        let children: Vec<_> = root.children().filter(|n| n.is_element()).collect();
        assert_eq!(children[0].tag_name().name(), "element");
        assert_eq!(children[0].attribute("type"), Some("tns:Code"));
        assert_eq!(children[1].tag_name().name(), "simpleType");

        let max_length = doc
            .descendants()
            .find(|n| n.tag_name().name() == "maxLength")
            .unwrap();
        assert_eq!(max_length.attribute("value"), Some("3"));
        assert!(xml.contains("Generated - - test"));
    }

    #[test]
    fn test_complex_with_facets_gets_content_type() {
        let mut schema = Schema::new(Dialect::Xml, "urn:example:order", "tns", "1.0").unwrap();
        let applied = schema.add_complex_classifier(ComplexClassifier {
            name: "Amount".to_string(),
            documentation: String::new(),
            primitive: prim("decimal"),
            facets: vec![
                Facet::new(Dialect::Xml, "totalDigits", "18"),
                Facet::new(Dialect::Xml, "maxLength", "3"),
            ],
            supplementaries: vec![SchemaAttribute::supplementary(
                "currencyCode",
                TypeRef::primitive("xs", "string"),
                false,
            )],
        }).unwrap();
        assert_eq!(applied.len(), 1);

        let xml = render(&schema);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let content = doc
            .descendants()
            .find(|n| n.attribute("name") == Some("AmountContent"))
            .unwrap();
        assert_eq!(content.tag_name().name(), "simpleType");
        let extension = doc
            .descendants()
            .find(|n| n.tag_name().name() == "extension")
            .unwrap();
        assert_eq!(extension.attribute("base"), Some("tns:AmountContent"));
        let attribute = doc
            .descendants()
            .find(|n| n.tag_name().name() == "attribute")
            .unwrap();
        assert_eq!(attribute.attribute("use"), Some("required"));
        assert!(!xml.contains("maxLength"));
    }

    #[test]
    fn test_enum_and_external() {
        let mut schema = Schema::new(Dialect::Xml, "urn:example:order", "tns", "1.0").unwrap();
        schema.add_enum_classifier(EnumClassifier {
            name: "Status".to_string(),
            documentation: String::new(),
            primitive: prim("string"),
            items: vec![EnumItem::new("Open", "Not yet shipped"), EnumItem::new("Closed", "")],
            supplementaries: Vec::new(),
        }).unwrap();
        schema.add_namespace("ext", "urn:example:ext").unwrap();
        schema.add_schema_reference("urn:example:ext", "ext.xsd");
        schema.add_external_classifier(ExternalClassifier {
            name: "Address".to_string(),
            documentation: String::new(),
            namespace: "urn:example:ext".to_string(),
            namespace_token: "ext".to_string(),
            schema_name: "ext.xsd".to_string(),
            base_type: "PostalAddress".to_string(),
            cardinality: Cardinality::new(0, 0),
        }).unwrap();

        let xml = render(&schema);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let values: Vec<&str> = doc
            .descendants()
            .filter(|n| n.tag_name().name() == "enumeration")
            .filter_map(|n| n.attribute("value"))
            .collect();
        assert_eq!(values, vec!["Open", "Closed"]);

        let import = doc
            .descendants()
            .find(|n| n.tag_name().name() == "import")
            .unwrap();
        assert_eq!(import.attribute("schemaLocation"), Some("ext.xsd"));

        let reference = doc
            .descendants()
            .find(|n| n.attribute("ref").is_some())
            .unwrap();
        assert_eq!(reference.attribute("ref"), Some("ext:PostalAddress"));
        assert_eq!(reference.attribute("minOccurs"), Some("0"));
        assert_eq!(reference.attribute("maxOccurs"), Some("unbounded"));
    }
}
