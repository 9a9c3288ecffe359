//! Maps a rendered fiber tree back to the source that produced it
//!
//! - [`instrument`] rewrites markup modules so every element carries its
//!   source location and records its text and expression children
//! - [`runtime`] evaluates instrumented modules; the attribution stack
//!   lives here
//! - [`host`] renders element values into a document and a fiber graph
//! - [`walker`] rebuilds the source-attributed structure from that graph
//! - [`bridge`] keeps the structure reachable and notifies on change

pub mod bridge;
pub mod formats;
pub mod host;
pub mod instrument;
pub mod pipeline;
pub mod runtime;
pub mod syntax;
pub mod testing;
pub mod walker;

pub use pipeline::{compile, Compiled, SpyError};
