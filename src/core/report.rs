//! core::report
//!
//! Listing aggregation: release ordering, ticket ordering, and progress.
//!
//! The store enumerates releases and decodes tickets; this module owns the
//! pure policy of how a listing is grouped, ordered, and measured.

use std::cmp::Ordering;

use serde::Serialize;

use crate::core::ticket::{Ticket, UNCATEGORIZED};
use crate::core::types::Status;

/// One release group in a listing.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseRows {
    /// Release label (`none` for uncategorized tickets).
    pub release: String,
    /// Completion fraction in 0..=1, or `None` when nothing counts.
    pub progress: Option<f64>,
    /// Tickets that survived the status filter, in display order.
    pub tickets: Vec<Ticket>,
}

/// A full listing: releases in display order plus the caller's inbox.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub releases: Vec<ReleaseRows>,
    /// Tickets assigned to the configured user, across all releases.
    pub inbox: Vec<Ticket>,
}

impl Listing {
    /// Total number of rows a renderer would print.
    pub fn row_count(&self) -> usize {
        self.releases.iter().map(|r| r.tickets.len()).sum::<usize>() + self.inbox.len()
    }
}

/// Compare two version-ish strings token by token.
///
/// Each string is split into alternating non-digit and digit runs; non-digit
/// runs compare lexicographically only insofar as they gate recursion, digit
/// runs compare numerically. `"2.10" > "2.9" > "2.1"`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a_digits, a_rest) = split_version_token(a);
    let (b_digits, b_rest) = split_version_token(b);

    match (a_digits, b_digits) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => match x.cmp(&y) {
            Ordering::Equal => compare_versions(a_rest, b_rest),
            other => other,
        },
    }
}

/// Strip a leading non-digit run, parse the digit run after it.
///
/// Returns the digit run's numeric value (None when there is none) and the
/// remainder after it.
fn split_version_token(s: &str) -> (Option<u64>, &str) {
    let digits_start = s
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(s.len());
    let after_prefix = &s[digits_start..];
    let digits_end = after_prefix
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after_prefix.len());
    if digits_end == 0 {
        return (None, after_prefix);
    }
    // Digit runs are bounded by the split, so the parse cannot fail except
    // on absurd lengths; saturate rather than error in that case.
    let value = after_prefix[..digits_end].parse::<u64>().unwrap_or(u64::MAX);
    (Some(value), &after_prefix[digits_end..])
}

/// Display order for releases: uncategorized first, then descending version.
pub fn compare_releases(a: &str, b: &str) -> Ordering {
    match (a == UNCATEGORIZED, b == UNCATEGORIZED) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => compare_versions(b, a),
    }
}

/// Display order for tickets: priority ascending, then created ascending.
pub fn sort_tickets(tickets: &mut [Ticket]) {
    tickets.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.created.cmp(&b.created))
    });
}

/// Weighted completion fraction for one release.
///
/// Done weight counts tickets past the active part of the workflow
/// (anything but open, test and rejected); total weight counts everything
/// not rejected. `None` when the total is zero.
pub fn progress(tickets: &[Ticket]) -> Option<f64> {
    let total: u32 = tickets
        .iter()
        .filter(|t| t.status != Status::Rejected)
        .map(|t| t.weight.value())
        .sum();
    if total == 0 {
        return None;
    }
    let done: u32 = tickets
        .iter()
        .filter(|t| !matches!(t.status, Status::Open | Status::Rejected | Status::Test))
        .map(|t| t.weight.value())
        .sum();
    Some(f64::from(done) / f64::from(total))
}

/// The inbox narrows to open tickets only when the caller kept the default
/// open/test filter; an explicit filter applies to the inbox unchanged.
pub fn inbox_filter(status_filter: &[Status]) -> Vec<Status> {
    if status_filter == Status::DEFAULT_FILTER.as_slice() {
        vec![Status::Open]
    } else {
        status_filter.to_vec()
    }
}
