//! Choice groups
//!
//! Attributes and associations are tagged with a flat group descriptor
//! (`Payment[1..1]`) and a branch number. Members sharing a descriptor form
//! one [`Choice`]; members sharing a branch number inside it form one
//! alternative. A choice needs at least two alternatives to be emitted.

use indexmap::IndexMap;

use super::attributes::{SchemaAssociation, SchemaAttribute};
use super::cardinality::Cardinality;
use crate::error::{Diagnostic, Normalized};
use crate::names::to_pascal_case;

/// Parsed cardinality of a group descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupCardinality {
    /// The descriptor had no bracket suffix
    Absent,
    /// The bracket suffix was malformed and ignored
    Unset,
    /// A usable, possibly corrected, range
    Range(Cardinality),
}

impl GroupCardinality {
    /// The range to emit, defaulting to exactly one
    pub fn effective(&self) -> Cardinality {
        match self {
            GroupCardinality::Range(c) => *c,
            GroupCardinality::Absent | GroupCardinality::Unset => Cardinality::ONE,
        }
    }
}

/// Group membership of one attribute or association
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChoiceGroup {
    /// Pascal-cased group id
    pub id: String,
    /// Alternative (branch) the member belongs to
    pub sequence_id: u32,
    /// Cardinality declared on the descriptor
    pub cardinality: GroupCardinality,
}

impl ChoiceGroup {
    /// Parse a `name[low..high]` descriptor
    ///
    /// Never fails: a malformed suffix keeps a best-effort id and an
    /// [`GroupCardinality::Unset`] cardinality, and the problem is reported
    /// in the returned diagnostics.
    pub fn parse(descriptor: &str, sequence_id: u32) -> Normalized<ChoiceGroup> {
        let descriptor = descriptor.trim();

        let Some(open) = descriptor.find('[') else {
            return Normalized::clean(ChoiceGroup {
                id: to_pascal_case(descriptor),
                sequence_id,
                cardinality: GroupCardinality::Absent,
            });
        };

        let id = to_pascal_case(descriptor[..open].trim());
        let rest = &descriptor[open + 1..];
        let range = rest
            .find(']')
            .map(|close| &rest[..close])
            .and_then(|inner| inner.split_once(".."));

        match range {
            Some((low, high)) => {
                let parsed = Cardinality::parse(low, high);
                let diagnostics = parsed
                    .diagnostics
                    .into_iter()
                    .map(|d| d.with_subject(descriptor))
                    .collect();
                Normalized {
                    value: ChoiceGroup {
                        id,
                        sequence_id,
                        cardinality: GroupCardinality::Range(parsed.value),
                    },
                    diagnostics,
                }
            }
            None => Normalized::clean(ChoiceGroup {
                id,
                sequence_id,
                cardinality: GroupCardinality::Unset,
            })
            .with(
                Diagnostic::error("malformed choice group cardinality, expected `[low..high]`")
                    .with_subject(descriptor)
                    .with_fallback("no cardinality"),
            ),
        }
    }
}

/// A member of a choice
#[derive(Debug, Clone, PartialEq)]
pub enum ChoiceMember {
    /// A content attribute
    Attribute(SchemaAttribute),
    /// An association
    Association(SchemaAssociation),
}

impl ChoiceMember {
    /// Ordering key of the member
    pub fn sequence_key(&self) -> u32 {
        match self {
            ChoiceMember::Attribute(a) => a.sequence_key,
            ChoiceMember::Association(a) => a.sequence_key,
        }
    }

    /// Output name of the member
    pub fn name(&self) -> &str {
        match self {
            ChoiceMember::Attribute(a) => &a.name,
            ChoiceMember::Association(a) => &a.name,
        }
    }

    /// Group membership of the member
    pub fn group(&self) -> Option<&ChoiceGroup> {
        match self {
            ChoiceMember::Attribute(a) => a.choice.as_ref(),
            ChoiceMember::Association(a) => a.choice.as_ref(),
        }
    }

    /// Alternative the member belongs to
    pub fn branch(&self) -> u32 {
        self.group().map(|g| g.sequence_id).unwrap_or(0)
    }
}

/// Mutually exclusive alternatives sharing one group id
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    id: String,
    cardinality: GroupCardinality,
    members: Vec<ChoiceMember>,
}

impl Choice {
    /// Create an empty choice
    pub fn new(id: impl Into<String>, cardinality: GroupCardinality) -> Self {
        Self {
            id: id.into(),
            cardinality,
            members: Vec::new(),
        }
    }

    /// Group id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Cardinality of the whole choice
    pub fn cardinality(&self) -> GroupCardinality {
        self.cardinality
    }

    /// Add a member, keeping members ordered by sequence key
    ///
    /// The first member declaring a range decides the choice cardinality.
    pub fn push(&mut self, member: ChoiceMember) {
        if let Some(GroupCardinality::Range(range)) = member.group().map(|g| g.cardinality) {
            if !matches!(self.cardinality, GroupCardinality::Range(_)) {
                self.cardinality = GroupCardinality::Range(range);
            }
        }
        let key = member.sequence_key();
        let pos = self
            .members
            .iter()
            .position(|m| m.sequence_key() > key)
            .unwrap_or(self.members.len());
        self.members.insert(pos, member);
    }

    /// Members in sequence-key order
    pub fn members(&self) -> &[ChoiceMember] {
        &self.members
    }

    /// Lowest non-zero member key, 0 when no member is ordered
    pub fn sequence_key(&self) -> u32 {
        self.members
            .iter()
            .map(ChoiceMember::sequence_key)
            .filter(|k| *k != 0)
            .min()
            .unwrap_or(0)
    }

    /// Alternatives in order of their first member
    pub fn branches(&self) -> Vec<(u32, Vec<&ChoiceMember>)> {
        let mut branches: IndexMap<u32, Vec<&ChoiceMember>> = IndexMap::new();
        for member in &self.members {
            branches.entry(member.branch()).or_default().push(member);
        }
        branches.into_iter().collect()
    }

    /// Number of distinct alternatives
    pub fn branch_count(&self) -> usize {
        self.branches().len()
    }

    /// Whether this is a real choice between at least two alternatives
    pub fn is_valid(&self) -> bool {
        self.branch_count() >= 2
    }

    fn into_members(self) -> Vec<ChoiceMember> {
        self.members
    }
}

/// Content of a constructed type after choice assembly
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembled {
    /// Attributes outside any choice
    pub content: Vec<SchemaAttribute>,
    /// Associations outside any choice
    pub associations: Vec<SchemaAssociation>,
    /// Valid choices
    pub choices: Vec<Choice>,
}

/// Gather choice members into [`Choice`] values
///
/// Single-branch choices are not emitted as choices: their members are
/// returned to the plain content with their group cleared, and a warning
/// is attached.
pub fn assemble_choices(
    content: Vec<SchemaAttribute>,
    associations: Vec<SchemaAssociation>,
) -> Normalized<Assembled> {
    let mut assembled = Assembled::default();
    let mut choices: IndexMap<String, Choice> = IndexMap::new();

    let mut collect = |member: ChoiceMember, assembled: &mut Assembled| {
        let group = member.group().map(|g| (g.id.clone(), g.cardinality));
        match group {
            Some((id, cardinality)) => {
                choices
                    .entry(id.clone())
                    .or_insert_with(|| Choice::new(id, cardinality))
                    .push(member);
            }
            None => match member {
                ChoiceMember::Attribute(a) => assembled.content.push(a),
                ChoiceMember::Association(a) => assembled.associations.push(a),
            },
        }
    };

    for attribute in content {
        collect(ChoiceMember::Attribute(attribute), &mut assembled);
    }
    for association in associations {
        collect(ChoiceMember::Association(association), &mut assembled);
    }

    let mut diagnostics = Vec::new();
    for (id, choice) in choices {
        if choice.is_valid() {
            assembled.choices.push(choice);
            continue;
        }
        diagnostics.push(
            Diagnostic::warning("choice group has a single alternative")
                .with_subject(id)
                .with_fallback("plain sequence content"),
        );
        for member in choice.into_members() {
            match member {
                ChoiceMember::Attribute(a) => assembled.content.push(a.with_choice(None)),
                ChoiceMember::Association(a) => assembled.associations.push(a.with_choice(None)),
            }
        }
    }

    Normalized {
        value: assembled,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::TypeRef;

    fn attr(name: &str, key: u32, group: Option<ChoiceGroup>) -> SchemaAttribute {
        SchemaAttribute::content(name, TypeRef::primitive("xs", "string"), Cardinality::ONE)
            .with_sequence(key)
            .with_choice(group)
    }

    fn group(descriptor: &str, branch: u32) -> Option<ChoiceGroup> {
        Some(ChoiceGroup::parse(descriptor, branch).value)
    }

    #[test]
    fn test_parse_without_brackets() {
        let parsed = ChoiceGroup::parse("payment method", 1);
        assert!(parsed.is_clean());
        assert_eq!(parsed.value.id, "PaymentMethod");
        assert_eq!(parsed.value.cardinality, GroupCardinality::Absent);
    }

    #[test]
    fn test_parse_range() {
        let parsed = ChoiceGroup::parse("Payment[1..*]", 2);
        assert!(parsed.is_clean());
        assert_eq!(parsed.value.id, "Payment");
        assert_eq!(parsed.value.sequence_id, 2);
        assert_eq!(
            parsed.value.cardinality,
            GroupCardinality::Range(Cardinality::new(1, 0))
        );
    }

    #[test]
    fn test_parse_malformed_keeps_id() {
        let parsed = ChoiceGroup::parse("Payment[1..2", 1);
        assert_eq!(parsed.value.id, "Payment");
        assert_eq!(parsed.value.cardinality, GroupCardinality::Unset);
        assert_eq!(parsed.diagnostics.len(), 1);

        let parsed = ChoiceGroup::parse("Payment[12]", 1);
        assert_eq!(parsed.value.cardinality, GroupCardinality::Unset);
        assert!(!parsed.is_clean());
    }

    #[test]
    fn test_parse_clamps_upper_bound() {
        let parsed = ChoiceGroup::parse("Payment[2..1]", 1);
        assert_eq!(
            parsed.value.cardinality,
            GroupCardinality::Range(Cardinality::new(2, 1))
        );
        assert_eq!(parsed.diagnostics.len(), 1);

        let parsed = ChoiceGroup::parse("Payment[x..n]", 1);
        assert_eq!(
            parsed.value.cardinality,
            GroupCardinality::Range(Cardinality::new(0, 0))
        );
        assert_eq!(parsed.diagnostics.len(), 1);
    }

    #[test]
    fn test_choice_sequence_key_is_minimum() {
        let mut choice = Choice::new("Payment", GroupCardinality::Absent);
        choice.push(ChoiceMember::Attribute(attr("card", 3, group("Payment", 1))));
        choice.push(ChoiceMember::Attribute(attr("iban", 1, group("Payment", 2))));
        choice.push(ChoiceMember::Attribute(attr("expiry", 2, group("Payment", 1))));
        choice.push(ChoiceMember::Attribute(attr("bic", 1, group("Payment", 2))));

        assert_eq!(choice.sequence_key(), 1);
        assert!(choice.is_valid());
        let names: Vec<&str> = choice.members().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["iban", "bic", "expiry", "card"]);

        let branches = choice.branches();
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].0, 2);
        assert_eq!(branches[1].1.len(), 2);
    }

    #[test]
    fn test_unordered_members_key_zero() {
        let mut choice = Choice::new("Any", GroupCardinality::Absent);
        choice.push(ChoiceMember::Attribute(attr("a", 0, group("Any", 1))));
        assert_eq!(choice.sequence_key(), 0);
        assert!(!choice.is_valid());
    }

    #[test]
    fn test_assemble_degrades_single_branch() {
        let content = vec![
            attr("id", 1, None),
            attr("card", 2, group("Payment[1..1]", 1)),
            attr("iban", 3, group("Payment[1..1]", 2)),
            attr("note", 4, group("Remark", 1)),
        ];
        let assembled = assemble_choices(content, Vec::new());
        assert_eq!(assembled.diagnostics.len(), 1);

        let value = assembled.value;
        assert_eq!(value.choices.len(), 1);
        assert_eq!(value.choices[0].id(), "Payment");
        assert_eq!(
            value.choices[0].cardinality(),
            GroupCardinality::Range(Cardinality::ONE)
        );

        let plain: Vec<&str> = value.content.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(plain, vec!["id", "note"]);
        assert!(value.content[1].choice.is_none());
    }

    #[test]
    fn test_assemble_mixes_associations() {
        let assoc = SchemaAssociation::new("voucher", TypeRef::new("tns", "Voucher"), Cardinality::ONE)
            .with_sequence(5)
            .with_choice(group("Payment", 2));
        let content = vec![attr("card", 2, group("Payment", 1))];
        let assembled = assemble_choices(content, vec![assoc]);
        assert!(assembled.is_clean());
        assert_eq!(assembled.value.choices[0].members().len(), 2);
        assert_eq!(assembled.value.choices[0].sequence_key(), 2);
    }
}
