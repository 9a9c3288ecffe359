//! Compile-time instrumentation of markup modules.

pub mod generators;
pub mod names;
pub mod options;
pub mod pass;

pub use names::GeneratedNames;
pub use options::{InstrumentOptions, OptionsError, SELF_ATTRIBUTE, SOURCE_ATTRIBUTE};
pub use pass::{instrument, InstrumentReport, Instrumented};
