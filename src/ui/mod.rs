//! ui
//!
//! Terminal presentation: the release table, ticket detail view, and
//! interactive prompts. Rendering produces plain strings so the command
//! layer decides where they go and tests can assert on them directly.

pub mod output;
pub mod prompts;

pub use output::{Printer, Theme};
