//! # fiber-spy
//!
//! Source attribution for rendered component trees: a compile-time pass that
//! annotates markup with source locations, the runtime stack that records
//! children against their parent element, and a walker that rebuilds which
//! source produced each rendered node.
//!
//! ## Testing
//!
//! See the [testing module](spy::testing) for the harness and the fluent
//! structure assertions used across the test suite.

pub mod spy;
