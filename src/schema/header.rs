//! Document header templates
//!
//! A header template is free text with `@NAME@` placeholders. Rendering
//! substitutes the known placeholders and leaves anything else untouched.

use chrono::{DateTime, Datelike, Utc};

/// Default header template
pub const DEFAULT_TEMPLATE: &str = "Service: @SERVICE@\n\
Capability: @CAPABILITY@ (@CAPABILITYTYPE@)\n\
Version: @VERSION@, access level: @ACCESSLEVEL@\n\
Author: @AUTHOR@, generated @TIMESTAMP@\n\
Copyright @YEAR@\n\
@CHANGELOG@";

/// Values substituted into a header template
#[derive(Debug, Clone)]
pub struct HeaderFields {
    service: String,
    capability: String,
    capability_type: String,
    author: String,
    version: String,
    access_level: String,
    changelog: String,
    generated_at: DateTime<Utc>,
}

impl Default for HeaderFields {
    fn default() -> Self {
        Self {
            service: String::new(),
            capability: String::new(),
            capability_type: String::new(),
            author: String::new(),
            version: String::new(),
            access_level: String::new(),
            changelog: String::new(),
            generated_at: Utc::now(),
        }
    }
}

impl HeaderFields {
    /// Fields stamped with the current time
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service name
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Set the capability (operation or library) name and its type
    pub fn with_capability(mut self, capability: impl Into<String>, kind: impl Into<String>) -> Self {
        self.capability = capability.into();
        self.capability_type = kind.into();
        self
    }

    /// Set the author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Set the document version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the access level
    pub fn with_access_level(mut self, access_level: impl Into<String>) -> Self {
        self.access_level = access_level.into();
        self
    }

    /// Set the change log text
    pub fn with_changelog(mut self, changelog: impl Into<String>) -> Self {
        self.changelog = changelog.into();
        self
    }

    /// Override the generation time
    pub fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = at;
        self
    }

    /// Substitute all placeholders of `template`
    pub fn render(&self, template: &str) -> String {
        let timestamp = self.generated_at.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let year = self.generated_at.year().to_string();
        // CAPABILITYTYPE before CAPABILITY so the shorter name cannot match inside it
        let replacements: [(&str, &str); 9] = [
            ("@SERVICE@", &self.service),
            ("@CAPABILITYTYPE@", &self.capability_type),
            ("@CAPABILITY@", &self.capability),
            ("@AUTHOR@", &self.author),
            ("@TIMESTAMP@", &timestamp),
            ("@YEAR@", &year),
            ("@VERSION@", &self.version),
            ("@ACCESSLEVEL@", &self.access_level),
            ("@CHANGELOG@", &self.changelog),
        ];
        replacements
            .iter()
            .fold(template.to_string(), |text, (placeholder, value)| {
                text.replace(placeholder, value)
            })
            .trim_end()
            .to_string()
    }
}
