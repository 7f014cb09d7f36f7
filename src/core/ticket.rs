//! core::ticket
//!
//! The ticket record and its plain-text codec.
//!
//! # Format
//!
//! A ticket is stored as an ordered block of `Field: value` header lines,
//! a blank line, then the free-text body:
//!
//! ```text
//! Id: 4ac0d3...
//! Issuer: Ada Lovelace <ada@example.org>
//! Created: 2026-08-26T09:30:00
//! Type: feature
//! Subject: Support nested releases
//! Priority: 2
//! Weight: 3
//! Status: open
//! Assigned to: -
//! Release: 1.1
//! Last modified: 2026-08-26T09:30:00
//!
//! Body text, verbatim.
//! ```
//!
//! Encoding is deterministic and whitespace-stable; the header order above is
//! fixed regardless of how the ticket was built. Decoding is forgiving:
//! header keys are case-folded, legacy key spellings are aliased to their
//! canonical field, and records written by old versions without `Id`,
//! `Release`, `Weight`, `Assigned to` or `Last modified` headers still parse
//! (the first two can be supplied by the caller from the record's storage
//! path).
//!
//! # Identifiers
//!
//! A ticket id is the SHA-256 hex digest of the record's canonical encoding
//! minus the `Id` line. The issuer and creation timestamp are part of that
//! encoding, which keeps ids practically unique; byte-for-byte duplicate
//! content collides deliberately, and the store reports that instead of
//! silently overwriting.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::core::types::{Priority, Status, TicketType, TypeError, Weight};

/// Release label for tickets that are not attached to any release.
pub const UNCATEGORIZED: &str = "none";

/// Sentinel owner for tickets nobody has taken.
pub const UNASSIGNED: &str = "-";

/// Timestamp format written on encode. Legacy spaced timestamps and
/// fractional seconds are still accepted on decode.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Errors from decoding a ticket record.
#[derive(Debug, Error)]
pub enum TicketError {
    /// A non-blank, non-comment header line had no `:` separator.
    #[error("cannot parse field {line:?}")]
    MalformedField { line: String },

    /// A required field was absent after parsing.
    #[error("missing required field {field:?}")]
    MissingField { field: &'static str },

    /// A field was present but its value did not parse.
    #[error("invalid value for {field}: {source}")]
    InvalidValue {
        field: &'static str,
        #[source]
        source: TypeError,
    },

    /// A timestamp matched none of the accepted formats.
    #[error("cannot parse timestamp {value:?} for {field}")]
    InvalidTimestamp { field: &'static str, value: String },
}

/// A single ticket record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub release: String,
    pub ticket_type: TicketType,
    pub subject: String,
    pub issuer: String,
    pub priority: Priority,
    pub weight: Weight,
    pub status: Status,
    pub assigned_to: String,
    pub created: NaiveDateTime,
    pub last_modified: NaiveDateTime,
    pub body: String,
}

/// Caller-supplied fallbacks for fields derivable from the storage path.
///
/// Old records carry neither an `Id` nor a `Release` header; both are implied
/// by where the file sits (`tickets/<release>/<id>`). These values are used
/// only when the corresponding header is absent from the text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathOverrides<'a> {
    pub id: Option<&'a str>,
    pub release: Option<&'a str>,
}

impl Ticket {
    /// Build a fresh ticket. The id is derived from the content immediately.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        subject: impl Into<String>,
        issuer: impl Into<String>,
        ticket_type: TicketType,
        priority: Priority,
        weight: Weight,
        release: impl Into<String>,
        body: impl Into<String>,
        now: NaiveDateTime,
    ) -> Self {
        let mut ticket = Ticket {
            id: String::new(),
            release: release.into(),
            ticket_type,
            subject: subject.into(),
            issuer: issuer.into(),
            priority,
            weight,
            status: Status::Open,
            assigned_to: UNASSIGNED.to_string(),
            created: now,
            last_modified: now,
            body: body.into(),
        };
        ticket.id = ticket.content_id();
        ticket
    }

    /// SHA-256 hex digest of the canonical encoding, excluding the id itself.
    ///
    /// Stable for identical content; the issuer and creation timestamp inside
    /// the encoding are the disambiguating input.
    pub fn content_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_content().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Whether this ticket is assigned to `owner`.
    pub fn is_assigned_to(&self, owner: &str) -> bool {
        self.assigned_to == owner
    }

    /// Everything below the `Id` header, in canonical order.
    fn canonical_content(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Issuer: {}\n", self.issuer));
        out.push_str(&format!(
            "Created: {}\n",
            self.created.format(TIMESTAMP_FORMAT)
        ));
        out.push_str(&format!("Type: {}\n", self.ticket_type));
        out.push_str(&format!("Subject: {}\n", self.subject));
        out.push_str(&format!("Priority: {}\n", self.priority));
        out.push_str(&format!("Weight: {}\n", self.weight));
        out.push_str(&format!("Status: {}\n", self.status));
        out.push_str(&format!("Assigned to: {}\n", self.assigned_to));
        out.push_str(&format!("Release: {}\n", self.release));
        out.push_str(&format!(
            "Last modified: {}\n",
            self.last_modified.format(TIMESTAMP_FORMAT)
        ));
        out.push('\n');
        out.push_str(&self.body);
        if !self.body.is_empty() && !self.body.ends_with('\n') {
            out.push('\n');
        }
        out
    }

    /// Serialize to the canonical plain-text form.
    pub fn encode(&self) -> String {
        format!("Id: {}\n{}", self.id, self.canonical_content())
    }

    /// Parse a record from its plain-text form.
    ///
    /// `overrides` supplies the id and release implied by the record's
    /// storage location; they are consulted only when the corresponding
    /// header is missing from `text`.
    ///
    /// # Errors
    ///
    /// - [`TicketError::MalformedField`] for a pre-body line without `:`
    /// - [`TicketError::MissingField`] naming the first absent required field
    /// - [`TicketError::InvalidValue`] / [`TicketError::InvalidTimestamp`]
    ///   when a present field fails to parse
    pub fn decode(text: &str, overrides: PathOverrides<'_>) -> Result<Self, TicketError> {
        let mut fields: Vec<(String, String)> = Vec::new();
        let mut body_lines: Vec<&str> = Vec::new();
        let mut in_body = false;

        for line in text.lines() {
            if in_body {
                body_lines.push(line);
                continue;
            }
            if line.trim().is_empty() {
                in_body = true;
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                return Err(TicketError::MalformedField {
                    line: line.to_string(),
                });
            };
            fields.push((
                canonical_key(key).to_string(),
                value.trim().to_string(),
            ));
        }

        let get = |name: &str| {
            fields
                .iter()
                .rev()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };
        let require = |name: &'static str| {
            get(name).ok_or(TicketError::MissingField { field: name })
        };

        let subject = require("subject")?.to_string();
        let issuer = require("issuer")?.to_string();
        let ticket_type: TicketType =
            require("type")?
                .parse()
                .map_err(|source| TicketError::InvalidValue {
                    field: "type",
                    source,
                })?;
        let priority: Priority =
            require("priority")?
                .parse()
                .map_err(|source| TicketError::InvalidValue {
                    field: "priority",
                    source,
                })?;
        let status: Status =
            require("status")?
                .parse()
                .map_err(|source| TicketError::InvalidValue {
                    field: "status",
                    source,
                })?;
        let created = parse_timestamp("created", require("created")?)?;

        // Fields added after the first release: default when absent so old
        // stores keep parsing.
        let weight = match get("weight") {
            Some(raw) => raw.parse().map_err(|source| TicketError::InvalidValue {
                field: "weight",
                source,
            })?,
            None => Weight::default(),
        };
        let assigned_to = get("assigned_to").unwrap_or(UNASSIGNED).to_string();
        let last_modified = match get("last_modified") {
            Some(raw) => parse_timestamp("last_modified", raw)?,
            None => created,
        };
        let release = get("release")
            .or(overrides.release)
            .unwrap_or(UNCATEGORIZED)
            .to_string();

        let body = {
            let joined = body_lines.join("\n");
            joined.trim_end().to_string()
        };

        let mut ticket = Ticket {
            id: String::new(),
            release,
            ticket_type,
            subject,
            issuer,
            priority,
            weight,
            status,
            assigned_to,
            created,
            last_modified,
            body,
        };
        ticket.id = match get("id").or(overrides.id) {
            Some(id) => id.to_string(),
            None => ticket.content_id(),
        };
        Ok(ticket)
    }
}

/// Chop an id down to its displayed prefix.
pub fn short_id(id: &str) -> &str {
    let end = id
        .char_indices()
        .nth(7)
        .map(|(i, _)| i)
        .unwrap_or(id.len());
    &id[..end]
}

/// Case-fold a header key and resolve legacy spellings.
fn canonical_key(raw: &str) -> &'static str {
    // Leak-free mapping onto static names keeps lookups allocation-light.
    let folded = raw.trim().to_ascii_lowercase();
    match folded.as_str() {
        "id" => "id",
        "subject" => "subject",
        "issuer" => "issuer",
        "type" => "type",
        "priority" => "priority",
        "weight" => "weight",
        "status" => "status",
        "release" => "release",
        "created" | "date" => "created",
        "assigned to" | "assigned_to" => "assigned_to",
        "last modified" | "last_modified" => "last_modified",
        _ => "unknown",
    }
}

/// Parse a timestamp in any of the accepted formats, newest first.
fn parse_timestamp(field: &'static str, value: &str) -> Result<NaiveDateTime, TicketError> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    let trimmed = value.trim();
    for format in FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }
    Err(TicketError::InvalidTimestamp {
        field,
        value: value.to_string(),
    })
}
