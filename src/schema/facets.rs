//! Value constraints (facets)
//!
//! A facet is declared on a classifier with a free-form name. The name is
//! translated into a [`FacetToken`] through a fixed table; unknown names
//! produce an empty facet which is never applicable.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::primitives::{self, PrimitiveFamily, PrimitiveType};
use super::{json, xsd, Dialect};

/// Normalized facet kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetToken {
    /// Exact length
    Length,
    /// Minimum length
    MinLength,
    /// Maximum length
    MaxLength,
    /// Regular expression
    Pattern,
    /// One allowed value
    Enumeration,
    /// Whitespace handling
    WhiteSpace,
    /// Inclusive lower bound
    MinInclusive,
    /// Inclusive upper bound
    MaxInclusive,
    /// Exclusive lower bound
    MinExclusive,
    /// Exclusive upper bound
    MaxExclusive,
    /// Maximum number of digits
    TotalDigits,
    /// Maximum number of fraction digits
    FractionDigits,
    /// Selects a date subtype (gYear, dateTime, ...) of a date primitive
    DateType,
}

static FACET_NAMES: Lazy<HashMap<&'static str, FacetToken>> = Lazy::new(|| {
    HashMap::from([
        ("length", FacetToken::Length),
        ("minlength", FacetToken::MinLength),
        ("maxlength", FacetToken::MaxLength),
        ("pattern", FacetToken::Pattern),
        ("enumeration", FacetToken::Enumeration),
        ("whitespace", FacetToken::WhiteSpace),
        ("mininclusive", FacetToken::MinInclusive),
        ("maxinclusive", FacetToken::MaxInclusive),
        ("minexclusive", FacetToken::MinExclusive),
        ("maxexclusive", FacetToken::MaxExclusive),
        ("totaldigits", FacetToken::TotalDigits),
        ("fractiondigits", FacetToken::FractionDigits),
        ("datetype", FacetToken::DateType),
        ("datesubtype", FacetToken::DateType),
    ])
});

impl FacetToken {
    /// Translate a declared facet name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        FACET_NAMES.get(name.trim().to_lowercase().as_str()).copied()
    }

    /// Whether the facet value is a non-negative count
    pub fn takes_count(self) -> bool {
        matches!(
            self,
            FacetToken::Length
                | FacetToken::MinLength
                | FacetToken::MaxLength
                | FacetToken::TotalDigits
                | FacetToken::FractionDigits
        )
    }

    /// Whether the facet value is a bound on the value space
    pub fn is_bound(self) -> bool {
        matches!(
            self,
            FacetToken::MinInclusive
                | FacetToken::MaxInclusive
                | FacetToken::MinExclusive
                | FacetToken::MaxExclusive
        )
    }
}

/// One value constraint, bound to the dialect it will be emitted in
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Facet {
    token: Option<FacetToken>,
    name: String,
    value: String,
    dialect: Dialect,
}

impl Facet {
    /// Create a facet from its declared name and value
    pub fn new(dialect: Dialect, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let token = FacetToken::from_name(&name);
        if token.is_none() {
            tracing::debug!(facet = %name, "unrecognized facet name");
        }
        Self {
            token,
            name,
            value: value.into(),
            dialect,
        }
    }

    /// Normalized token, `None` for an unrecognized name
    pub fn token(&self) -> Option<FacetToken> {
        self.token
    }

    /// Declared name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Dialect the facet is emitted in
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Whether the declared name was not recognized
    pub fn is_empty(&self) -> bool {
        self.token.is_none()
    }

    /// Whether the facet may be applied to `primitive` in this facet's dialect
    pub fn is_valid(&self, primitive: &PrimitiveType) -> bool {
        let Some(token) = self.token else {
            return false;
        };
        let admitted = match self.dialect {
            Dialect::Xml => xsd::admits_facet(token, primitive.family()),
            Dialect::Json => json::admits_facet(token, primitive.family()),
        };
        admitted && self.value_fits(token, primitive)
    }

    fn value_fits(&self, token: FacetToken, primitive: &PrimitiveType) -> bool {
        let value = self.value.trim();
        if token.takes_count() {
            return value.parse::<u32>().is_ok();
        }
        match token {
            FacetToken::Pattern => Regex::new(value).is_ok(),
            FacetToken::WhiteSpace => matches!(value, "preserve" | "replace" | "collapse"),
            FacetToken::DateType => {
                primitive.name == primitives::DATE && primitives::is_date_subtype(value)
            }
            t if t.is_bound() && primitive.family().is_numeric() => {
                Decimal::from_str(value).is_ok() || Decimal::from_scientific(value).is_ok()
            }
            _ => !value.is_empty(),
        }
    }

    /// The primitive this facet asks its base type to be replaced with
    ///
    /// `decimal` with `fractionDigits = 0` becomes `integer`; `date` with
    /// `dateType = X` becomes the date subtype `X`.
    pub fn substitution(&self, primitive: &PrimitiveType) -> Option<&'static str> {
        match self.token? {
            FacetToken::FractionDigits
                if primitive.name == primitives::DECIMAL
                    && self.value.trim().parse::<u32>() == Ok(0) =>
            {
                Some(primitives::INTEGER)
            }
            FacetToken::DateType if primitive.name == primitives::DATE => {
                let target = primitives::normalize_primitive_name(&self.value)?;
                primitives::is_date_subtype(target).then_some(target)
            }
            _ => None,
        }
    }

    /// Dialect keyword the facet is written as
    pub fn keyword(&self) -> Option<&'static str> {
        let token = self.token?;
        match self.dialect {
            Dialect::Xml => Some(xsd::facet_keyword(token)),
            Dialect::Json => json::facet_keyword(token),
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Keep only the facets applicable to `primitive`, logging the rest
pub fn retain_valid(facets: Vec<Facet>, primitive: &PrimitiveType, owner: &str) -> Vec<Facet> {
    facets
        .into_iter()
        .filter(|f| {
            let ok = f.is_valid(primitive);
            if !ok {
                tracing::warn!(
                    classifier = owner,
                    facet = %f,
                    primitive = primitive.name,
                    "facet not applicable, dropped"
                );
            }
            ok
        })
        .collect()
}
