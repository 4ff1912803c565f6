//! Normalized primitive types
//!
//! Classifier hierarchies terminate in one of a small set of normalized
//! primitive names. Each dialect translates those names into its own base
//! type through [`PrimitiveType::new`].

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;

use super::facets::Facet;
use super::{json, xsd, Dialect};

// =============================================================================
// Normalized Primitive Names
// =============================================================================

/// Character data
pub const STRING: &str = "string";
/// Whitespace-collapsed character data
pub const TOKEN: &str = "token";
/// true / false
pub const BOOLEAN: &str = "boolean";
/// Arbitrary precision decimal
pub const DECIMAL: &str = "decimal";
/// Arbitrary size integer
pub const INTEGER: &str = "integer";
/// Single precision floating point
pub const FLOAT: &str = "float";
/// Double precision floating point
pub const DOUBLE: &str = "double";
/// Calendar date
pub const DATE: &str = "date";
/// Date and time of day
pub const DATE_TIME: &str = "dateTime";
/// Time of day
pub const TIME: &str = "time";
/// ISO 8601 duration
pub const DURATION: &str = "duration";
/// Gregorian year
pub const G_YEAR: &str = "gYear";
/// Gregorian year and month
pub const G_YEAR_MONTH: &str = "gYearMonth";
/// Gregorian month
pub const G_MONTH: &str = "gMonth";
/// Gregorian month and day
pub const G_MONTH_DAY: &str = "gMonthDay";
/// Gregorian day
pub const G_DAY: &str = "gDay";
/// Base64 encoded binary
pub const BINARY: &str = "binary";
/// Hex encoded binary
pub const HEX_BINARY: &str = "hexBinary";
/// URI reference
pub const URI: &str = "uri";

lazy_static! {
    /// Lower-cased spelling → normalized primitive name
    static ref NORMALIZED_NAMES: HashMap<String, &'static str> = {
        let names = [
            STRING, TOKEN, BOOLEAN, DECIMAL, INTEGER, FLOAT, DOUBLE, DATE, DATE_TIME, TIME,
            DURATION, G_YEAR, G_YEAR_MONTH, G_MONTH, G_MONTH_DAY, G_DAY, BINARY, HEX_BINARY, URI,
        ];
        let mut m: HashMap<String, &'static str> =
            names.iter().map(|n| (n.to_lowercase(), *n)).collect();
        // Common spellings used by modeling tools
        m.insert("int".to_string(), INTEGER);
        m.insert("bool".to_string(), BOOLEAN);
        m.insert("datetime".to_string(), DATE_TIME);
        m.insert("base64binary".to_string(), BINARY);
        m.insert("anyuri".to_string(), URI);
        m
    };
}

/// Normalize a classifier name to a primitive name, if it is one
pub fn normalize_primitive_name(name: &str) -> Option<&'static str> {
    NORMALIZED_NAMES.get(&name.trim().to_lowercase()).copied()
}

/// Names a `dateType` facet may select on a `date` primitive
pub fn is_date_subtype(name: &str) -> bool {
    matches!(
        name,
        DATE | DATE_TIME | TIME | G_YEAR | G_YEAR_MONTH | G_MONTH | G_MONTH_DAY | G_DAY
    )
}

// =============================================================================
// Primitive Families
// =============================================================================

/// Value space family of a primitive, used for facet admission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveFamily {
    /// string, token
    String,
    /// boolean
    Boolean,
    /// decimal
    Decimal,
    /// integer
    Integer,
    /// float, double
    Float,
    /// date, time and duration types
    DateTime,
    /// binary, hexBinary
    Binary,
    /// uri
    Uri,
}

impl PrimitiveFamily {
    /// Family of a normalized primitive name
    pub fn of(normalized: &str) -> Self {
        match normalized {
            BOOLEAN => PrimitiveFamily::Boolean,
            DECIMAL => PrimitiveFamily::Decimal,
            INTEGER => PrimitiveFamily::Integer,
            FLOAT | DOUBLE => PrimitiveFamily::Float,
            DATE | DATE_TIME | TIME | DURATION | G_YEAR | G_YEAR_MONTH | G_MONTH | G_MONTH_DAY
            | G_DAY => PrimitiveFamily::DateTime,
            BINARY | HEX_BINARY => PrimitiveFamily::Binary,
            URI => PrimitiveFamily::Uri,
            _ => PrimitiveFamily::String,
        }
    }

    /// Whether numeric bound facets compare values as decimals
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            PrimitiveFamily::Decimal | PrimitiveFamily::Integer | PrimitiveFamily::Float
        )
    }
}

// =============================================================================
// Primitive Type
// =============================================================================

/// A normalized primitive translated into one dialect
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimitiveType {
    /// Normalized primitive name
    pub name: &'static str,
    /// Dialect base type name (`decimal`, `number`, ...)
    pub base_type: &'static str,
    /// Dialect format hint (JSON `format`), if any
    pub format: Option<&'static str>,
    /// Dialect this translation belongs to
    pub dialect: Dialect,
}

impl PrimitiveType {
    /// Translate a normalized primitive name for a dialect
    pub fn new(dialect: Dialect, normalized: &str) -> Option<Self> {
        let name = normalize_primitive_name(normalized)?;
        let (base_type, format) = match dialect {
            Dialect::Xml => (xsd::primitive_base_type(name)?, None),
            Dialect::Json => json::primitive_base_type(name)?,
        };
        Some(Self {
            name,
            base_type,
            format,
            dialect,
        })
    }

    /// Value space family
    pub fn family(&self) -> PrimitiveFamily {
        PrimitiveFamily::of(self.name)
    }

    /// Apply the base-type substitutions requested by `facets`
    ///
    /// Returns the substituted primitive and the facets still to be emitted;
    /// facets that only served to request a substitution are consumed.
    pub fn apply_substitutions(&self, facets: &[Facet]) -> (PrimitiveType, Vec<Facet>) {
        let mut current = self.clone();
        let mut remaining = Vec::with_capacity(facets.len());

        for facet in facets {
            match facet.substitution(&current) {
                Some(target) => match PrimitiveType::new(current.dialect, target) {
                    Some(substituted) => {
                        tracing::debug!(
                            from = current.name,
                            to = substituted.name,
                            facet = %facet,
                            "substituting base type"
                        );
                        current = substituted;
                    }
                    None => remaining.push(facet.clone()),
                },
                None => remaining.push(facet.clone()),
            }
        }

        (current, remaining)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            Some(format) => write!(f, "{}({})", self.base_type, format),
            None => write!(f, "{}", self.base_type),
        }
    }
}
