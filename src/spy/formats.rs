//! Output formats: printed source for modules, treeviz/json/yaml for
//! reconstructed structures.

pub mod printer;
pub mod registry;
pub mod treeviz;

pub use printer::{print_expression, print_module};
pub use registry::{FormatError, FormatRegistry, Formatter};
pub use treeviz::to_treeviz;

use crate::spy::host::Document;
use crate::spy::walker::DomFrameworkStructure;

pub fn to_json(structures: &[DomFrameworkStructure]) -> Result<String, FormatError> {
    serde_json::to_string_pretty(structures)
        .map_err(|e| FormatError::SerializationError(e.to_string()))
}

pub fn to_yaml(structures: &[DomFrameworkStructure]) -> Result<String, FormatError> {
    serde_yaml::to_string(structures).map_err(|e| FormatError::SerializationError(e.to_string()))
}

pub struct TreevizFormatter;

impl Formatter for TreevizFormatter {
    fn name(&self) -> &str {
        "treeviz"
    }

    fn serialize(
        &self,
        structures: &[DomFrameworkStructure],
        document: &Document,
    ) -> Result<String, FormatError> {
        Ok(to_treeviz(structures, document))
    }

    fn description(&self) -> &str {
        "Visual tree of rendered nodes and their source contributors"
    }
}

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize(
        &self,
        structures: &[DomFrameworkStructure],
        _document: &Document,
    ) -> Result<String, FormatError> {
        to_json(structures)
    }
}

pub struct YamlFormatter;

impl Formatter for YamlFormatter {
    fn name(&self) -> &str {
        "yaml"
    }

    fn serialize(
        &self,
        structures: &[DomFrameworkStructure],
        _document: &Document,
    ) -> Result<String, FormatError> {
        to_yaml(structures)
    }
}
