//! JSON Schema dialect
//!
//! Primitive translation, facet admission and serialization of a
//! [`Schema`] as a draft 2020-12 document. Definitions go under `$defs`,
//! global elements become top-level properties.

use rust_decimal::Decimal;
use serde_json::{json, Map, Number, Value};
use std::io::Write;

use super::document::{
    AbieType, ComplexClassifier, Component, Definition, EnumClassifier, ExternalClassifier,
    Particle, SimpleClassifier,
};
use super::facets::{Facet, FacetToken};
use super::primitives::{self, PrimitiveFamily, PrimitiveType};
use super::{Schema, SchemaBackend};
use crate::compiler::attributes::{SchemaAssociation, SchemaAttribute};
use crate::compiler::cardinality::Cardinality;
use crate::compiler::choice::{Choice, ChoiceMember};
use crate::error::Result;
use crate::namespaces::TypeRef;
use crate::JSON_SCHEMA_DRAFT;

/// Property holding the content of complex and enumerated classifiers
pub const VALUE_PROPERTY: &str = "value";

// =============================================================================
// Primitive And Facet Tables
// =============================================================================

/// JSON type and format for a normalized primitive name
pub fn primitive_base_type(normalized: &str) -> Option<(&'static str, Option<&'static str>)> {
    let translated = match normalized {
        primitives::STRING | primitives::TOKEN => ("string", None),
        primitives::BOOLEAN => ("boolean", None),
        primitives::DECIMAL | primitives::FLOAT | primitives::DOUBLE => ("number", None),
        primitives::INTEGER => ("integer", None),
        primitives::DATE => ("string", Some("date")),
        primitives::DATE_TIME => ("string", Some("date-time")),
        primitives::TIME => ("string", Some("time")),
        primitives::DURATION => ("string", Some("duration")),
        primitives::G_YEAR
        | primitives::G_YEAR_MONTH
        | primitives::G_MONTH
        | primitives::G_MONTH_DAY
        | primitives::G_DAY
        | primitives::HEX_BINARY => ("string", None),
        primitives::BINARY => ("string", None),
        primitives::URI => ("string", Some("uri")),
        _ => return None,
    };
    Some(translated)
}

/// Pattern standing in for primitives JSON Schema has no format for
fn implied_pattern(normalized: &str) -> Option<&'static str> {
    match normalized {
        primitives::G_YEAR => Some(r"^-?[0-9]{4}$"),
        primitives::G_YEAR_MONTH => Some(r"^-?[0-9]{4}-(0[1-9]|1[0-2])$"),
        primitives::G_MONTH => Some(r"^--(0[1-9]|1[0-2])$"),
        primitives::G_MONTH_DAY => Some(r"^--(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$"),
        primitives::G_DAY => Some(r"^---(0[1-9]|[12][0-9]|3[01])$"),
        primitives::HEX_BINARY => Some(r"^([0-9a-fA-F]{2})*$"),
        _ => None,
    }
}

/// Whether JSON Schema can express `token` on a primitive of `family`
pub fn admits_facet(token: FacetToken, family: PrimitiveFamily) -> bool {
    use FacetToken::*;
    let stringly = !family.is_numeric() && family != PrimitiveFamily::Boolean;
    match token {
        Length | MinLength | MaxLength | Pattern => stringly,
        Enumeration => family != PrimitiveFamily::Boolean,
        MinInclusive | MaxInclusive | MinExclusive | MaxExclusive => family.is_numeric(),
        FractionDigits => family == PrimitiveFamily::Decimal,
        DateType => family == PrimitiveFamily::DateTime,
        TotalDigits | WhiteSpace => false,
    }
}

/// Keyword a facet is written as; `length` expands to two keywords
pub fn facet_keyword(token: FacetToken) -> Option<&'static str> {
    match token {
        FacetToken::MinLength => Some("minLength"),
        FacetToken::MaxLength => Some("maxLength"),
        FacetToken::Pattern => Some("pattern"),
        FacetToken::Enumeration => Some("enum"),
        FacetToken::MinInclusive => Some("minimum"),
        FacetToken::MaxInclusive => Some("maximum"),
        FacetToken::MinExclusive => Some("exclusiveMinimum"),
        FacetToken::MaxExclusive => Some("exclusiveMaximum"),
        FacetToken::FractionDigits => Some("multipleOf"),
        FacetToken::Length
        | FacetToken::TotalDigits
        | FacetToken::WhiteSpace
        | FacetToken::DateType => None,
    }
}

fn number(value: &str) -> Value {
    serde_json::from_str::<Number>(value.trim())
        .map(Value::Number)
        .unwrap_or_else(|_| Value::String(value.to_string()))
}

fn count(value: &str) -> Value {
    value
        .trim()
        .parse::<u64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(value.to_string()))
}

/// `multipleOf` step for a number of fraction digits
fn fraction_step(digits: &str) -> Value {
    match digits.trim().parse::<u32>() {
        Ok(n) => number(&Decimal::new(1, n.min(28)).to_string()),
        Err(_) => Value::String(digits.to_string()),
    }
}

/// Schema object for a primitive with its facets applied
pub fn primitive_schema(primitive: &PrimitiveType, facets: &[Facet]) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), json!(primitive.base_type));
    if let Some(format) = primitive.format {
        schema.insert("format".into(), json!(format));
    }
    if let Some(pattern) = implied_pattern(primitive.name) {
        schema.insert("pattern".into(), json!(pattern));
    }
    if primitive.name == primitives::BINARY {
        schema.insert("contentEncoding".into(), json!("base64"));
    }

    let mut literals = Vec::new();
    for facet in facets {
        let Some(token) = facet.token() else { continue };
        match token {
            FacetToken::Length => {
                schema.insert("minLength".into(), count(facet.value()));
                schema.insert("maxLength".into(), count(facet.value()));
            }
            FacetToken::Enumeration => literals.push(json!(facet.value())),
            FacetToken::FractionDigits => {
                schema.insert("multipleOf".into(), fraction_step(facet.value()));
            }
            t if t.takes_count() => {
                if let Some(keyword) = facet_keyword(t) {
                    schema.insert(keyword.into(), count(facet.value()));
                }
            }
            t if t.is_bound() => {
                if let Some(keyword) = facet_keyword(t) {
                    schema.insert(keyword.into(), number(facet.value()));
                }
            }
            FacetToken::Pattern => {
                schema.insert("pattern".into(), json!(facet.value()));
            }
            _ => {}
        }
    }
    if !literals.is_empty() {
        schema.insert("enum".into(), Value::Array(literals));
    }
    schema
}

fn with_description(mut schema: Map<String, Value>, documentation: &str) -> Map<String, Value> {
    let documentation = documentation.trim();
    if !documentation.is_empty() {
        schema.insert("description".into(), json!(documentation));
    }
    schema
}

/// Wrap an item schema into an array when more than one occurrence is allowed
fn with_cardinality(item: Map<String, Value>, cardinality: Cardinality) -> Map<String, Value> {
    if !cardinality.is_repeated() {
        return item;
    }
    let mut array = Map::new();
    array.insert("type".into(), json!("array"));
    array.insert("items".into(), Value::Object(item));
    if cardinality.min > 0 {
        array.insert("minItems".into(), json!(cardinality.min));
    }
    if !cardinality.is_unbounded() {
        array.insert("maxItems".into(), json!(cardinality.max));
    }
    array
}

// =============================================================================
// Writer
// =============================================================================

struct JsonWriter<'s> {
    schema: &'s Schema,
}

impl<'s> JsonWriter<'s> {
    fn reference(&self, type_ref: &TypeRef) -> Map<String, Value> {
        let document = self.schema.document();
        let pointer = format!("#/$defs/{}", type_ref.local_name);
        let target = if type_ref.prefix.is_empty() || type_ref.prefix == self.schema.namespace_token() {
            pointer
        } else {
            let location = document
                .namespaces()
                .get_namespace(&type_ref.prefix)
                .map(|ns| {
                    document
                        .references()
                        .find(|(n, _)| *n == ns)
                        .map(|(_, l)| l)
                        .unwrap_or(ns)
                })
                .unwrap_or(type_ref.prefix.as_str());
            format!("{}{}", location, pointer)
        };
        let mut schema = Map::new();
        schema.insert("$ref".into(), json!(target));
        schema
    }

    fn attribute(&self, attribute: &SchemaAttribute) -> Map<String, Value> {
        let mut item = match &attribute.primitive {
            Some(primitive) => primitive_schema(primitive, &attribute.restriction),
            None => self.reference(&attribute.type_ref),
        };
        if let Some(ref default) = attribute.default_value {
            item.insert("default".into(), json!(default));
        }
        if let Some(ref fixed) = attribute.fixed_value {
            item.insert("const".into(), json!(fixed));
        }
        let item = with_description(item, &attribute.documentation);
        with_cardinality(item, attribute.cardinality)
    }

    fn association(&self, association: &SchemaAssociation) -> Map<String, Value> {
        let item = with_description(self.reference(&association.type_ref), &association.documentation);
        with_cardinality(item, association.cardinality)
    }

    fn member(&self, member: &ChoiceMember) -> Map<String, Value> {
        match member {
            ChoiceMember::Attribute(a) => self.attribute(a),
            ChoiceMember::Association(a) => self.association(a),
        }
    }

    /// `oneOf` over the alternatives; an optional choice also admits none
    fn choice(&self, choice: &Choice, properties: &mut Map<String, Value>) -> Value {
        let mut branches = Vec::new();
        let mut all_names = Vec::new();
        for (_, members) in choice.branches() {
            let names: Vec<Value> = members.iter().map(|m| json!(m.name())).collect();
            for member in &members {
                properties.insert(member.name().to_string(), Value::Object(self.member(member)));
            }
            all_names.extend(names.iter().map(|n| json!({ "required": [n] })));
            branches.push(json!({ "required": names }));
        }
        if choice.cardinality().effective().is_optional() {
            branches.push(json!({ "not": { "anyOf": all_names } }));
        }
        json!({ "oneOf": branches })
    }

    fn object(
        &self,
        properties: Map<String, Value>,
        required: Vec<String>,
        documentation: &str,
    ) -> Map<String, Value> {
        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), json!(required));
        }
        schema.insert("additionalProperties".into(), json!(false));
        with_description(schema, documentation)
    }

    fn supplementaries(
        &self,
        attributes: &[SchemaAttribute],
        properties: &mut Map<String, Value>,
        required: &mut Vec<String>,
    ) {
        for attribute in attributes {
            properties.insert(attribute.name.clone(), Value::Object(self.attribute(attribute)));
            if !attribute.is_optional() {
                required.push(attribute.name.clone());
            }
        }
    }

    fn simple(&self, classifier: &SimpleClassifier) -> Map<String, Value> {
        with_description(
            primitive_schema(&classifier.primitive, &classifier.facets),
            &classifier.documentation,
        )
    }

    fn with_value(
        &self,
        value: Map<String, Value>,
        supplementaries: &[SchemaAttribute],
        documentation: &str,
    ) -> Map<String, Value> {
        if supplementaries.is_empty() {
            return with_description(value, documentation);
        }
        let mut properties = Map::new();
        let mut required = vec![VALUE_PROPERTY.to_string()];
        properties.insert(VALUE_PROPERTY.into(), Value::Object(value));
        self.supplementaries(supplementaries, &mut properties, &mut required);
        self.object(properties, required, documentation)
    }

    fn complex(&self, classifier: &ComplexClassifier) -> Map<String, Value> {
        let value = primitive_schema(&classifier.primitive, &classifier.facets);
        self.with_value(value, &classifier.supplementaries, &classifier.documentation)
    }

    fn enumeration(&self, classifier: &EnumClassifier) -> Map<String, Value> {
        let mut value = primitive_schema(&classifier.primitive, &[]);
        let literals: Vec<Value> = classifier.items.iter().map(|i| json!(i.value)).collect();
        value.insert("enum".into(), Value::Array(literals));
        self.with_value(value, &classifier.supplementaries, &classifier.documentation)
    }

    fn external(&self, classifier: &ExternalClassifier) -> Map<String, Value> {
        let mut item = Map::new();
        let target = format!("{}#/$defs/{}", classifier.schema_name, classifier.base_type);
        item.insert("$ref".into(), json!(target));
        with_description(
            with_cardinality(item, classifier.cardinality),
            &classifier.documentation,
        )
    }

    fn abie(&self, abie: &AbieType) -> Map<String, Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        let mut choices = Vec::new();

        for particle in abie.particles() {
            match particle {
                Particle::Attribute(a) => {
                    properties.insert(a.name.clone(), Value::Object(self.attribute(a)));
                    if !a.is_optional() {
                        required.push(a.name.clone());
                    }
                }
                Particle::Association(a) => {
                    properties.insert(a.name.clone(), Value::Object(self.association(a)));
                    if !a.is_optional() {
                        required.push(a.name.clone());
                    }
                }
                Particle::Choice(c) => choices.push(self.choice(c, &mut properties)),
            }
        }
        self.supplementaries(&abie.supplementaries, &mut properties, &mut required);

        let mut schema = self.object(properties, required, &abie.documentation);
        match choices.len() {
            0 => {}
            1 => {
                if let Some(Value::Object(choice)) = choices.pop() {
                    schema.extend(choice);
                }
            }
            _ => {
                schema.insert("allOf".into(), Value::Array(choices));
            }
        }
        schema
    }

    fn definition(&self, definition: &Definition) -> Map<String, Value> {
        match definition {
            Definition::Simple(d) => self.simple(d),
            Definition::Complex(d) => self.complex(d),
            Definition::Enum(d) => self.enumeration(d),
            Definition::External(d) => self.external(d),
            Definition::Abie(d) => self.abie(d),
        }
    }

    fn document(&self, header: &str) -> Value {
        let mut root = Map::new();
        root.insert("$schema".into(), json!(JSON_SCHEMA_DRAFT));
        root.insert("$id".into(), json!(self.schema.namespace()));
        if !header.trim().is_empty() {
            root.insert("$comment".into(), json!(header.trim()));
        }
        root.insert("x-version".into(), json!(self.schema.version()));

        let mut properties = Map::new();
        let mut defs = Map::new();
        for component in self.schema.document().components() {
            match component {
                Component::Element(e) => {
                    let item = with_description(self.reference(&e.type_ref), &e.documentation);
                    properties.insert(e.name.clone(), Value::Object(item));
                }
                Component::Type(d) => {
                    defs.insert(d.name().to_string(), Value::Object(self.definition(d)));
                }
            }
        }

        root.insert("type".into(), json!("object"));
        if properties.len() == 1 {
            let name = properties.keys().next().cloned().unwrap_or_default();
            root.insert("required".into(), json!([name]));
        }
        root.insert("properties".into(), Value::Object(properties));
        root.insert("additionalProperties".into(), json!(false));
        root.insert("$defs".into(), Value::Object(defs));
        Value::Object(root)
    }
}

/// Serialize `schema` as a JSON Schema document
pub fn write_schema(schema: &Schema, out: &mut dyn Write, header: &str) -> Result<()> {
    let document = JsonWriter { schema }.document(header);
    serde_json::to_writer_pretty(&mut *out, &document)?;
    out.write_all(b"\n")?;
    Ok(())
}
