//! `adminshell-core` — shared building blocks for the dashboard shell.
//!
//! This crate holds the error taxonomy and the typed identifiers every other
//! crate agrees on. No IO, no async.

pub mod error;
pub mod id;

pub use error::{ShellError, ShellResult};
pub use id::{SessionId, UserId};
