//! Burrow - a distributed issue tracker that lives inside your git repository
//!
//! Burrow stores tickets as plain-text files on a hidden branch (`burrow`) of
//! the repository it tracks. No extra database, no daemon, no lock files:
//! cloning the repository clones the issue tracker with it.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to store)
//! - [`store`] - Ticket repository and the critical-section protocol
//! - [`core`] - Domain types, ticket codec, report aggregation, config
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - Terminal output and interactive prompts
//!
//! # Correctness Invariants
//!
//! Burrow maintains the following invariants:
//!
//! 1. The user's checkout never visibly leaves its branch: every mutation
//!    repoints HEAD to the hidden branch, commits, and restores the original
//!    branch, index, and working tree before returning
//! 2. Restoration runs on every exit path, including errors
//! 3. A dirty working tree aborts a mutation before the critical section is
//!    entered
//! 4. All git access flows through the [`git`] interface

pub mod cli;
pub mod core;
pub mod git;
pub mod store;
pub mod ui;
