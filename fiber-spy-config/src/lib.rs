//! Shared configuration loader for fiber-spy tools.
//!
//! `defaults/fiber-spy.default.toml` is embedded into every binary so that the
//! documented defaults and runtime behavior stay in sync. Applications layer
//! user files on top of those defaults via [`Loader`] before deserializing
//! into [`SpyConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use fiber_spy::spy::instrument::InstrumentOptions;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/fiber-spy.default.toml");

/// Top-level configuration consumed by fiber-spy applications.
#[derive(Debug, Clone, Deserialize)]
pub struct SpyConfig {
    pub instrument: InstrumentConfig,
    pub inspect: InspectConfig,
}

/// Names of the generated bindings and offset reporting.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentConfig {
    pub file_name_binding: String,
    pub stack_binding: String,
    pub record_as_parent_binding: String,
    pub record_expression_binding: String,
    pub normalize_line_endings: bool,
}

impl From<InstrumentConfig> for InstrumentOptions {
    fn from(config: InstrumentConfig) -> Self {
        InstrumentOptions {
            file_name_binding: config.file_name_binding,
            stack_binding: config.stack_binding,
            record_as_parent_binding: config.record_as_parent_binding,
            record_expression_binding: config.record_expression_binding,
            normalize_line_endings: config.normalize_line_endings,
        }
    }
}

impl InstrumentConfig {
    pub fn to_options(&self) -> InstrumentOptions {
        self.clone().into()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InspectConfig {
    pub format: String,
    pub component: String,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, e.g. from a command line flag.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<SpyConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<SpyConfig, ConfigError> {
    Loader::new().build()
}
