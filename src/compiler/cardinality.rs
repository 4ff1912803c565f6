//! Occurrence bounds and their best-effort parsing
//!
//! Every parser here returns a usable [`Cardinality`]. Anything that had to
//! be corrected is reported through [`Normalized::diagnostics`] so the
//! resolver does not carry its own correction logic.

use std::fmt;

use crate::error::{Diagnostic, Normalized};

/// Occurrence bounds of an element, attribute or group
///
/// A `max` of 0 means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cardinality {
    /// Minimum occurrences
    pub min: u32,
    /// Maximum occurrences, 0 for unbounded
    pub max: u32,
}

impl Cardinality {
    /// Encoded value of an unbounded maximum
    pub const UNBOUNDED: u32 = 0;

    /// Exactly one
    pub const ONE: Cardinality = Cardinality { min: 1, max: 1 };

    /// Zero or one
    pub const OPTIONAL: Cardinality = Cardinality { min: 0, max: 1 };

    /// Zero or more
    pub const ANY: Cardinality = Cardinality { min: 0, max: 0 };

    /// Create new bounds
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Whether the maximum is unbounded
    pub fn is_unbounded(&self) -> bool {
        self.max == Self::UNBOUNDED
    }

    /// Whether the item may be absent
    pub fn is_optional(&self) -> bool {
        self.min == 0
    }

    /// Whether more than one occurrence is allowed
    pub fn is_repeated(&self) -> bool {
        self.is_unbounded() || self.max > 1
    }

    /// The maximum as written in an XSD `maxOccurs` attribute
    pub fn max_occurs(&self) -> String {
        if self.is_unbounded() {
            "unbounded".to_string()
        } else {
            self.max.to_string()
        }
    }

    /// Parse a `low`/`high` pair as used by choice-group descriptors
    ///
    /// - `low` falls back to 0 when it is not an integer
    /// - `high` of `*`, `n` or `N` is unbounded
    /// - `high` below `low` (and not unbounded) is clamped to 1
    pub fn parse(low: &str, high: &str) -> Normalized<Cardinality> {
        let mut diagnostics = Vec::new();
        let low = low.trim();
        let high = high.trim();

        let min = match low.parse::<u32>() {
            Ok(v) => v,
            Err(_) => {
                diagnostics.push(
                    Diagnostic::error(format!("invalid lower bound '{}'", low))
                        .with_fallback("0"),
                );
                0
            }
        };

        let mut max = match parse_upper(high) {
            Some(v) => v,
            None => {
                diagnostics.push(
                    Diagnostic::error(format!("invalid upper bound '{}'", high))
                        .with_fallback("1"),
                );
                1
            }
        };

        if max != Self::UNBOUNDED && max < min {
            diagnostics.push(
                Diagnostic::error(format!(
                    "upper bound {} is lower than lower bound {}",
                    max, min
                ))
                .with_fallback("upper bound 1"),
            );
            max = 1;
        }

        Normalized {
            value: Cardinality { min, max },
            diagnostics,
        }
    }

    /// Parse `minOccurs`/`maxOccurs` strings of an external reference
    ///
    /// Empty strings mean the default of 1. Any parse failure falls back to
    /// exactly one for both bounds.
    pub fn parse_occurs(min: &str, max: &str) -> Normalized<Cardinality> {
        let min = min.trim();
        let max = max.trim();

        let parsed_min = if min.is_empty() {
            Some(1)
        } else {
            min.parse::<u32>().ok()
        };
        let parsed_max = if max.is_empty() {
            Some(1)
        } else {
            parse_upper(max)
        };

        match (parsed_min, parsed_max) {
            (Some(min), Some(max)) => Normalized::clean(Cardinality { min, max }),
            _ => Normalized::clean(Cardinality::ONE).with(
                Diagnostic::warning(format!(
                    "cannot parse occurrence bounds '{}'/'{}'",
                    min, max
                ))
                .with_fallback("1..1"),
            ),
        }
    }

    /// Parse a UML-style multiplicity such as `1`, `0..1`, `*` or `1..*`
    pub fn parse_multiplicity(multiplicity: &str) -> Normalized<Cardinality> {
        let multiplicity = multiplicity.trim();
        if multiplicity.is_empty() {
            return Normalized::clean(Cardinality::ONE);
        }
        if let Some((low, high)) = multiplicity.split_once("..") {
            return Cardinality::parse(low, high);
        }
        match parse_upper(multiplicity) {
            Some(Self::UNBOUNDED) => Normalized::clean(Cardinality::ANY),
            Some(n) => Normalized::clean(Cardinality { min: n, max: n }),
            None => Normalized::clean(Cardinality::ONE).with(
                Diagnostic::error(format!("invalid multiplicity '{}'", multiplicity))
                    .with_fallback("1..1"),
            ),
        }
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::ONE
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "{}..*", self.min)
        } else {
            write!(f, "{}..{}", self.min, self.max)
        }
    }
}

fn parse_upper(value: &str) -> Option<u32> {
    match value {
        "*" | "n" | "N" => Some(Cardinality::UNBOUNDED),
        other => other.parse::<u32>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Severity;
    use proptest::prelude::*;

    #[test]
    fn test_unbounded_upper() {
        let parsed = Cardinality::parse("1", "*");
        assert!(parsed.is_clean());
        assert_eq!(parsed.value, Cardinality::new(1, 0));
        assert!(parsed.value.is_unbounded());

        assert_eq!(Cardinality::parse("0", "n").value, Cardinality::ANY);
        assert_eq!(Cardinality::parse("0", "N").value, Cardinality::ANY);
    }

    #[test]
    fn test_upper_below_lower_is_clamped() {
        let parsed = Cardinality::parse("2", "1");
        assert_eq!(parsed.value, Cardinality::new(2, 1));
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].severity, Severity::Error);

        let parsed = Cardinality::parse("5", "3");
        assert_eq!(parsed.value, Cardinality::new(5, 1));
    }

    #[test]
    fn test_invalid_lower_defaults_to_zero() {
        let parsed = Cardinality::parse("x", "3");
        assert_eq!(parsed.value, Cardinality::new(0, 3));
        assert!(!parsed.is_clean());
    }

    #[test]
    fn test_occurs_fallback() {
        let parsed = Cardinality::parse_occurs("0", "*");
        assert_eq!(parsed.value, Cardinality::ANY);
        assert!(parsed.is_clean());

        let parsed = Cardinality::parse_occurs("zero", "*");
        assert_eq!(parsed.value, Cardinality::ONE);
        assert_eq!(parsed.diagnostics[0].severity, Severity::Warning);

        assert_eq!(Cardinality::parse_occurs("", "").value, Cardinality::ONE);
    }

    #[test]
    fn test_multiplicity() {
        assert_eq!(Cardinality::parse_multiplicity("0..1").value, Cardinality::OPTIONAL);
        assert_eq!(Cardinality::parse_multiplicity("1..*").value, Cardinality::new(1, 0));
        assert_eq!(Cardinality::parse_multiplicity("*").value, Cardinality::ANY);
        assert_eq!(Cardinality::parse_multiplicity("3").value, Cardinality::new(3, 3));
        assert_eq!(Cardinality::parse_multiplicity("").value, Cardinality::ONE);
        assert!(!Cardinality::parse_multiplicity("many").is_clean());
    }

    #[test]
    fn test_display_and_max_occurs() {
        assert_eq!(Cardinality::new(1, 0).to_string(), "1..*");
        assert_eq!(Cardinality::new(1, 0).max_occurs(), "unbounded");
        assert_eq!(Cardinality::OPTIONAL.max_occurs(), "1");
    }

    proptest! {
        #[test]
        fn prop_parse_never_yields_inverted_bounds(low in "\\PC{0,6}", high in "\\PC{0,6}") {
            let parsed = Cardinality::parse(&low, &high);
            let c = parsed.value;
            prop_assert!(c.max == 0 || c.max >= c.min || c.max == 1);
        }
    }
}
