//! core
//!
//! Core domain types and policy for Burrow.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Status, TicketType, Priority, Weight
//! - [`ticket`] - The ticket record and its plain-text codec
//! - [`report`] - Listing policy: grouping, ordering, progress
//! - [`config`] - Author identity and editor resolution from git config
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Codec behavior is deterministic and backward compatible
//! - Aggregation policy is pure and independently testable

pub mod config;
pub mod report;
pub mod ticket;
pub mod types;
