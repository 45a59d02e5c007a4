//! Tracing/logging setup shared by every binary of the shell.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, init};
