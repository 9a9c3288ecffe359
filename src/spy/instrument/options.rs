//! Instrumentation options
//!
//! The attribute names the pass writes (`__self`, `__source`) are part of the
//! runtime contract and are fixed. The names of the generated bindings are
//! base names: the pass appends a numeric suffix when a module already uses
//! one of them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spy::syntax::tokens::is_reserved;

/// Attribute holding the element's owner
pub const SELF_ATTRIBUTE: &str = "__self";
/// Attribute holding the element's source location
pub const SOURCE_ATTRIBUTE: &str = "__source";

pub const DEFAULT_FILE_NAME_BINDING: &str = "__jsxFileName";
pub const DEFAULT_STACK_BINDING: &str = "wcs_expression_stack";
pub const DEFAULT_RECORD_AS_PARENT_BINDING: &str = "wcs_wrap_source";
pub const DEFAULT_RECORD_EXPRESSION_BINDING: &str = "wcs_wrap_expression";

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("`{value}` is not a valid identifier for {field}")]
    InvalidIdentifier { field: &'static str, value: String },
    #[error("{first} and {second} must use different names (both are `{value}`)")]
    DuplicateName {
        first: &'static str,
        second: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentOptions {
    pub file_name_binding: String,
    pub stack_binding: String,
    pub record_as_parent_binding: String,
    pub record_expression_binding: String,
    /// Report offsets as if the file used `\n` line endings
    pub normalize_line_endings: bool,
}

impl Default for InstrumentOptions {
    fn default() -> Self {
        Self {
            file_name_binding: DEFAULT_FILE_NAME_BINDING.to_string(),
            stack_binding: DEFAULT_STACK_BINDING.to_string(),
            record_as_parent_binding: DEFAULT_RECORD_AS_PARENT_BINDING.to_string(),
            record_expression_binding: DEFAULT_RECORD_EXPRESSION_BINDING.to_string(),
            normalize_line_endings: true,
        }
    }
}

impl InstrumentOptions {
    fn bindings(&self) -> [(&'static str, &str); 4] {
        [
            ("file_name_binding", &self.file_name_binding),
            ("stack_binding", &self.stack_binding),
            ("record_as_parent_binding", &self.record_as_parent_binding),
            ("record_expression_binding", &self.record_expression_binding),
        ]
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        let bindings = self.bindings();
        for (field, value) in bindings {
            if !IDENTIFIER.is_match(value) || is_reserved(value) {
                return Err(OptionsError::InvalidIdentifier {
                    field,
                    value: value.to_string(),
                });
            }
        }
        for (i, (first, value)) in bindings.iter().enumerate() {
            if let Some((second, _)) = bindings[i + 1..].iter().find(|(_, other)| other == value) {
                return Err(OptionsError::DuplicateName {
                    first,
                    second,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}
