//! core::types
//!
//! Strong types for the ticket vocabulary.
//!
//! # Types
//!
//! - [`Status`] - Workflow state of a ticket
//! - [`TicketType`] - Kind of work a ticket describes
//! - [`Priority`] - Three-level urgency rank (1 = most urgent)
//! - [`Weight`] - Effort estimate on a logarithmic (base-3) scale
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use burrow::core::types::{Priority, Status, TicketType, Weight};
//!
//! let status: Status = "open".parse().unwrap();
//! assert_eq!(status, Status::Open);
//!
//! // "bug" is a legacy synonym for the error type
//! let kind: TicketType = "bug".parse().unwrap();
//! assert_eq!(kind, TicketType::Error);
//!
//! assert!(Priority::new(4).is_err());
//! assert_eq!(Weight::new(9).unwrap().bucket(), "major");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid status: {0:?} (expected open, test, fixed, closed or rejected)")]
    InvalidStatus(String),

    #[error("invalid ticket type: {0:?} (expected issue, error, feature or task)")]
    InvalidType(String),

    #[error("invalid priority: {0} (expected 1, 2 or 3)")]
    InvalidPriority(String),

    #[error("invalid weight: {0} (expected an integer in 1..=27)")]
    InvalidWeight(String),
}

/// Workflow state of a ticket.
///
/// Transitions out of the open part of the workflow (`open`, `test`) are
/// enforced by the store, not here; the type only guarantees the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Open,
    Test,
    Fixed,
    Closed,
    Rejected,
}

impl Status {
    /// The default filter applied by `list`: tickets still being worked on.
    pub const DEFAULT_FILTER: [Status; 2] = [Status::Open, Status::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::Test => "test",
            Status::Fixed => "fixed",
            Status::Closed => "closed",
            Status::Rejected => "rejected",
        }
    }

    /// Whether a ticket in this status may still be finished or tested.
    pub fn is_active(self) -> bool {
        matches!(self, Status::Open | Status::Test)
    }
}

impl std::str::FromStr for Status {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "open" => Ok(Status::Open),
            "test" => Ok(Status::Test),
            "fixed" => Ok(Status::Fixed),
            "closed" => Ok(Status::Closed),
            "rejected" => Ok(Status::Rejected),
            other => Err(TypeError::InvalidStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of work a ticket describes.
///
/// `bug` is accepted on parse as a synonym for [`TicketType::Error`] but is
/// never written back; encoding always uses the canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketType {
    Error,
    Issue,
    Feature,
    Task,
}

impl TicketType {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketType::Error => "error",
            TicketType::Issue => "issue",
            TicketType::Feature => "feature",
            TicketType::Task => "task",
        }
    }
}

impl std::str::FromStr for TicketType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "error" | "bug" => Ok(TicketType::Error),
            "issue" => Ok(TicketType::Issue),
            "feature" => Ok(TicketType::Feature),
            "task" => Ok(TicketType::Task),
            other => Err(TypeError::InvalidType(other.to_string())),
        }
    }
}

impl std::fmt::Display for TicketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Urgency rank: 1 (high), 2 (medium), 3 (low). Smaller is more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const HIGH: Priority = Priority(1);
    pub const MEDIUM: Priority = Priority(2);
    pub const LOW: Priority = Priority(3);

    /// Create a priority from its numeric rank.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPriority` unless the rank is 1, 2 or 3.
    pub fn new(rank: u8) -> Result<Self, TypeError> {
        if (1..=3).contains(&rank) {
            Ok(Priority(rank))
        } else {
            Err(TypeError::InvalidPriority(rank.to_string()))
        }
    }

    pub fn rank(self) -> u8 {
        self.0
    }

    /// Short display name: "high", "med" or "low".
    pub fn name(self) -> &'static str {
        match self.0 {
            1 => "high",
            2 => "med",
            _ => "low",
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = TypeError;

    fn try_from(rank: u8) -> Result<Self, TypeError> {
        Priority::new(rank)
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p.0
    }
}

impl std::str::FromStr for Priority {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map_err(|_| TypeError::InvalidPriority(s.trim().to_string()))
            .and_then(Priority::new)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Effort estimate in 1..=27.
///
/// Weights live on a base-3 logarithmic scale: each named bucket is three
/// times the size of the one before it. The bucket name is recovered with
/// `round(log3(weight))` clamped to the defined range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Weight(u32);

/// Bucket names, smallest first. `3^i` is the canonical weight of bucket `i`.
const WEIGHT_BUCKETS: [&str; 4] = ["small", "minor", "major", "super"];

impl Weight {
    /// Create a weight from its raw value.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidWeight` unless the value is in 1..=27.
    pub fn new(value: u32) -> Result<Self, TypeError> {
        if (1..=27).contains(&value) {
            Ok(Weight(value))
        } else {
            Err(TypeError::InvalidWeight(value.to_string()))
        }
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Name of the nearest bucket on the log-3 scale.
    pub fn bucket(self) -> &'static str {
        let index = (f64::from(self.0).ln() / 3f64.ln()).round() as i64;
        WEIGHT_BUCKETS[index.clamp(0, 3) as usize]
    }
}

impl Default for Weight {
    fn default() -> Self {
        // "minor"
        Weight(3)
    }
}

impl TryFrom<u32> for Weight {
    type Error = TypeError;

    fn try_from(value: u32) -> Result<Self, TypeError> {
        Weight::new(value)
    }
}

impl From<Weight> for u32 {
    fn from(w: Weight) -> u32 {
        w.0
    }
}

impl std::str::FromStr for Weight {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map_err(|_| TypeError::InvalidWeight(s.trim().to_string()))
            .and_then(Weight::new)
    }
}

impl std::fmt::Display for Weight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod status {
        use super::*;

        #[test]
        fn parse_all_variants() {
            for s in ["open", "test", "fixed", "closed", "rejected"] {
                let status: Status = s.parse().unwrap();
                assert_eq!(status.as_str(), s);
            }
        }

        #[test]
        fn parse_rejects_unknown() {
            assert!("done".parse::<Status>().is_err());
            assert!("".parse::<Status>().is_err());
        }

        #[test]
        fn active_states() {
            assert!(Status::Open.is_active());
            assert!(Status::Test.is_active());
            assert!(!Status::Fixed.is_active());
            assert!(!Status::Closed.is_active());
            assert!(!Status::Rejected.is_active());
        }
    }

    mod ticket_type {
        use super::*;

        #[test]
        fn bug_is_error_alias() {
            assert_eq!("bug".parse::<TicketType>().unwrap(), TicketType::Error);
            assert_eq!(TicketType::Error.as_str(), "error");
        }

        #[test]
        fn parse_rejects_unknown() {
            assert!("chore".parse::<TicketType>().is_err());
        }
    }

    mod priority {
        use super::*;

        #[test]
        fn valid_range() {
            assert_eq!(Priority::new(1).unwrap(), Priority::HIGH);
            assert_eq!(Priority::new(2).unwrap(), Priority::MEDIUM);
            assert_eq!(Priority::new(3).unwrap(), Priority::LOW);
        }

        #[test]
        fn out_of_range() {
            assert!(Priority::new(0).is_err());
            assert!(Priority::new(4).is_err());
        }

        #[test]
        fn names() {
            assert_eq!(Priority::HIGH.name(), "high");
            assert_eq!(Priority::MEDIUM.name(), "med");
            assert_eq!(Priority::LOW.name(), "low");
        }

        #[test]
        fn ordering_smaller_is_more_urgent() {
            assert!(Priority::HIGH < Priority::LOW);
        }
    }

    mod weight {
        use super::*;

        #[test]
        fn canonical_buckets() {
            assert_eq!(Weight::new(1).unwrap().bucket(), "small");
            assert_eq!(Weight::new(3).unwrap().bucket(), "minor");
            assert_eq!(Weight::new(9).unwrap().bucket(), "major");
            assert_eq!(Weight::new(27).unwrap().bucket(), "super");
        }

        #[test]
        fn rounding_picks_nearest_bucket() {
            // log3(2) ~ 0.63 rounds to 1
            assert_eq!(Weight::new(2).unwrap().bucket(), "minor");
            // log3(5) ~ 1.46 rounds to 1
            assert_eq!(Weight::new(5).unwrap().bucket(), "minor");
            // log3(6) ~ 1.63 rounds to 2
            assert_eq!(Weight::new(6).unwrap().bucket(), "major");
            // log3(16) ~ 2.52 rounds to 3
            assert_eq!(Weight::new(16).unwrap().bucket(), "super");
        }

        #[test]
        fn out_of_range() {
            assert!(Weight::new(0).is_err());
            assert!(Weight::new(28).is_err());
        }

        #[test]
        fn default_is_minor() {
            assert_eq!(Weight::default().value(), 3);
        }
    }
}
