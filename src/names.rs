//! Name validation and casing utilities
//!
//! Emitted type and element names must be valid NCNames in the XSD dialect,
//! so everything the compiler builds goes through these helpers.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}][A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\-\.0-9]*$")
        .unwrap()
});

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    !name.is_empty() && NCNAME.is_match(name)
}

/// Validate an NCName and return an error if invalid
pub fn validate_ncname(name: &str) -> Result<()> {
    if is_valid_ncname(name) {
        Ok(())
    } else {
        Err(Error::Namespace(format!("Invalid NCName: '{}'", name)))
    }
}

/// Split a prefixed name into prefix and local name
pub fn split_prefixed(name: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = name.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, name)
    }
}

/// Convert a free-form name to PascalCase
///
/// Words are split on whitespace, `_`, `-` and `.`; the first letter of each
/// word is upper-cased and the rest is kept as written, so `payment method`
/// becomes `PaymentMethod` and `eMail` becomes `EMail`.
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for word in s.split(|c: char| c.is_whitespace() || c == '_' || c == '-' || c == '.') {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }
    result
}

/// Prefix `name` with `prefix` unless it already starts with it
pub fn with_prefix(prefix: &str, name: &str) -> String {
    if prefix.is_empty() || name.starts_with(prefix) {
        name.to_string()
    } else {
        format!("{}{}", prefix, name)
    }
}

/// Whether `name` already carries `marker` at its start or end
pub fn is_marked_with(name: &str, marker: &str) -> bool {
    !marker.is_empty() && (name.starts_with(marker) || name.ends_with(marker))
}
