//! Format registry for reconstructed structures
//!
//! Each format implements [`Formatter`] and is looked up by name.

use std::collections::HashMap;
use thiserror::Error;

use crate::spy::host::Document;
use crate::spy::walker::DomFrameworkStructure;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Format '{0}' not found")]
    FormatNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub trait Formatter: Send + Sync {
    /// The name of this format (e.g., "treeviz", "json")
    fn name(&self) -> &str;

    fn serialize(
        &self,
        structures: &[DomFrameworkStructure],
        document: &Document,
    ) -> Result<String, FormatError>;

    fn description(&self) -> &str {
        ""
    }
}

pub struct FormatRegistry {
    formatters: HashMap<String, Box<dyn Formatter>>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        FormatRegistry {
            formatters: HashMap::new(),
        }
    }

    /// Register a formatter, replacing any with the same name
    pub fn register<F: Formatter + 'static>(&mut self, formatter: F) {
        self.formatters
            .insert(formatter.name().to_string(), Box::new(formatter));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Formatter> {
        self.formatters.get(name).map(|f| f.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    pub fn serialize(
        &self,
        structures: &[DomFrameworkStructure],
        document: &Document,
        format: &str,
    ) -> Result<String, FormatError> {
        let formatter = self
            .get(format)
            .ok_or_else(|| FormatError::FormatNotFound(format.to_string()))?;
        formatter.serialize(structures, document)
    }

    /// Available format names, sorted
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formatters.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(super::TreevizFormatter);
        registry.register(super::JsonFormatter);
        registry.register(super::YamlFormatter);
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountFormatter;
    impl Formatter for CountFormatter {
        fn name(&self) -> &str {
            "count"
        }
        fn serialize(
            &self,
            structures: &[DomFrameworkStructure],
            _document: &Document,
        ) -> Result<String, FormatError> {
            Ok(structures.len().to_string())
        }
    }

    #[test]
    fn test_defaults() {
        let registry = FormatRegistry::default();
        assert_eq!(registry.list_formats(), vec!["json", "treeviz", "yaml"]);
    }

    #[test]
    fn test_register_and_serialize() {
        let mut registry = FormatRegistry::new();
        registry.register(CountFormatter);
        assert!(registry.has("count"));
        let out = registry.serialize(&[DomFrameworkStructure::default()], &Document::new(), "count");
        assert_eq!(out, Ok("1".to_string()));
    }

    #[test]
    fn test_unknown_format() {
        let registry = FormatRegistry::new();
        assert_eq!(
            registry.serialize(&[], &Document::new(), "xml"),
            Err(FormatError::FormatNotFound("xml".to_string()))
        );
    }
}
