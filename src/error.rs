//! Error types for modelschema
//!
//! Hard failures are reported through [`Error`]. Data problems that have a
//! safe fallback (malformed cardinalities, unsupported classifier kinds, ...)
//! are reported as [`Diagnostic`] values instead, so that a generation
//! session can keep going with the remaining classifiers.

use std::fmt;
use thiserror::Error;

/// Result type alias using the modelschema Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for schema compilation
#[derive(Error, Debug)]
pub enum Error {
    /// The base chain of a classifier never reaches a primitive type
    #[error("unresolved primitive: classifier '{classifier}' does not derive from a primitive type")]
    UnresolvedPrimitive {
        /// Name of the classifier being resolved
        classifier: String,
    },

    /// The classifier meta-kind cannot be emitted
    #[error("unsupported classifier kind '{kind}' for classifier '{classifier}'")]
    UnsupportedClassifierKind {
        /// Name of the classifier being resolved
        classifier: String,
        /// Meta-kind found on the classifier
        kind: String,
    },

    /// A suppressed enumeration has no replacement classifier to fall back on
    #[error("enumeration '{classifier}' is suppressed but no replacement classifier is configured")]
    MissingReplacementClassifier {
        /// Name of the suppressed enumeration
        classifier: String,
    },

    /// A classifier's supplementaries lead back to the classifier itself
    #[error("classifier '{classifier}' refers to itself through its supplementary attributes")]
    CyclicClassifier {
        /// Name of the classifier being resolved
        classifier: String,
    },

    /// A schema already holds a different definition under the same name
    #[error("conflicting definition: '{name}' is already defined differently")]
    ConflictingDefinition {
        /// Name shared by both definitions
        name: String,
    },

    /// Insert-once cache received a second insert for the same key
    #[error("duplicate cache key: {0}")]
    DuplicateKey(String),

    /// Two schemas of different dialects cannot be merged
    #[error("cannot merge a {source_dialect} schema into a {target_dialect} schema")]
    IncompatibleSchemaMerge {
        /// Dialect of the receiving schema
        target_dialect: String,
        /// Dialect of the absorbed schema
        source_dialect: String,
    },

    /// No backend is configured for an interface type
    #[error("no schema backend configured for interface type '{key}'")]
    MissingBackend {
        /// The offending configuration key
        key: String,
    },

    /// A classifier id is referenced but not present in the model
    #[error("unknown classifier: {0}")]
    UnknownClassifier(String),

    /// A class id is referenced but not present in the model
    #[error("unknown class: {0}")]
    UnknownClass(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML writing error
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading error
    #[error("configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the error only concerns the classifier being resolved
    ///
    /// Such errors are reported as diagnostics and the session continues
    /// with the next attribute; all others abort the session.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Error::UnresolvedPrimitive { .. }
                | Error::UnsupportedClassifierKind { .. }
                | Error::MissingReplacementClassifier { .. }
                | Error::CyclicClassifier { .. }
                | Error::ConflictingDefinition { .. }
                | Error::UnknownClassifier(_)
                | Error::UnknownClass(_)
        )
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Severity of a non-fatal diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Something was corrected or ignored
    Warning,
    /// Something was wrong and a fallback was used
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A data problem reported while compiling, with the fallback already applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error message
    pub message: String,
    /// Classifier, class or attribute the problem belongs to
    pub subject: Option<String>,
    /// Description of the fallback that was used
    pub fallback: Option<String>,
}

impl Diagnostic {
    /// Create a new warning
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            subject: None,
            fallback: None,
        }
    }

    /// Create a new error-level diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            subject: None,
            fallback: None,
        }
    }

    /// Set the subject of the diagnostic
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the fallback description
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// Emit this diagnostic through `tracing`
    pub fn log(&self) {
        let subject = self.subject.as_deref().unwrap_or("-");
        match self.severity {
            Severity::Warning => tracing::warn!(subject, "{}", self),
            Severity::Error => tracing::error!(subject, "{}", self),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref subject) = self.subject {
            write!(f, "{}: ", subject)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(ref fallback) = self.fallback {
            write!(f, " (using {})", fallback)?;
        }
        Ok(())
    }
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        Diagnostic::error(err.to_string())
    }
}

/// Ordered collection of diagnostics for one capability
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and record a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        self.items.push(diagnostic);
    }

    /// Log and record several diagnostics
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for d in diagnostics {
            self.push(d);
        }
    }

    /// All recorded diagnostics, in report order
    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Whether any error-level diagnostic was recorded
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    /// Number of recorded diagnostics
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A value produced by a best-effort parser together with the corrections it made
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    /// The usable, possibly corrected value
    pub value: T,
    /// Corrections applied while producing `value`
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Normalized<T> {
    /// A value that needed no correction
    pub fn clean(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    /// Attach a correction
    pub fn with(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }

    /// Attribute corrections without a subject to `subject`
    pub fn with_subject(mut self, subject: &str) -> Self {
        for d in self.diagnostics.iter_mut().filter(|d| d.subject.is_none()) {
            d.subject = Some(subject.to_string());
        }
        self
    }

    /// Whether any correction was applied
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Move the diagnostics into `sink` and return the value
    pub fn into_value(self, sink: &mut Diagnostics) -> T {
        sink.extend(self.diagnostics);
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::error("malformed cardinality")
            .with_subject("Payment.method")
            .with_fallback("1..1");

        let msg = format!("{}", d);
        assert!(msg.starts_with("Payment.method: "));
        assert!(msg.contains("malformed cardinality"));
        assert!(msg.ends_with("(using 1..1)"));
    }

    #[test]
    fn test_diagnostics_has_errors() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::warning("just a warning"));
        assert!(!diags.has_errors());

        diags.push(Diagnostic::error("a real problem"));
        assert!(diags.has_errors());
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_normalized_into_value() {
        let mut sink = Diagnostics::new();
        let n = Normalized::clean(7).with(Diagnostic::warning("corrected"));
        assert!(!n.is_clean());
        assert_eq!(n.into_value(&mut sink), 7);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_error_messages() {
        let err = Error::MissingBackend {
            key: "GraphQL".to_string(),
        };
        assert!(err.to_string().contains("'GraphQL'"));

        let err = Error::DuplicateKey("Amount@common".to_string());
        assert!(err.to_string().contains("Amount@common"));
        assert!(!err.is_data_error());

        let err = Error::UnresolvedPrimitive {
            classifier: "Amount".to_string(),
        };
        assert!(err.is_data_error());

        let err = Error::ConflictingDefinition {
            name: "Code".to_string(),
        };
        assert!(err.is_data_error());
        assert!(err.to_string().contains("'Code'"));
    }
}
