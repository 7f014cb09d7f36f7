//! ui::output
//!
//! Table and detail rendering for the terminal.
//!
//! The listing is one table per release: a full-width colored header row
//! naming the release and its progress bar, a column header row, then one
//! row per ticket. Colors are plain SGR sequences behind a [`Theme`] that
//! can be switched off wholesale (`--no-color`, or stdout not a tty).

use crate::core::report::{Listing, ReleaseRows};
use crate::core::ticket::{short_id, Ticket, UNASSIGNED};
use crate::core::types::Status;

// SGR palette. White-background headers, matching the row colors below.
const S_RELEASE: &str = "\x1b[31;47m";
const S_COLUMNS: &str = "\x1b[34;47m";
const S_BAR_FILL: &str = "\x1b[30;42m";
const S_BAR_REST: &str = "\x1b[30;47m";
const S_ACTIVE: &str = "\x1b[1m";
const S_FIXED: &str = "\x1b[32m";
const S_RESET: &str = "\x1b[0m";

const PROGRESS_WIDTH: usize = 32;

// Fixed column widths; the title column absorbs the rest.
const W_ID: usize = 7;
const W_TYPE: usize = 7;
const W_WEIGHT: usize = 5;
const W_STATUS: usize = 8;
const W_DATE: usize = 10;
const W_PRIO: usize = 4;
const W_TITLE_MIN: usize = 10;

/// Color switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub enabled: bool,
}

impl Theme {
    fn paint(&self, style: &str, text: &str) -> String {
        if self.enabled {
            format!("{style}{text}{S_RESET}")
        } else {
            text.to_string()
        }
    }

    fn row_style(&self, status: Status) -> Option<&'static str> {
        if !self.enabled {
            return None;
        }
        match status {
            Status::Open | Status::Test => Some(S_ACTIVE),
            Status::Fixed => Some(S_FIXED),
            _ => None,
        }
    }
}

/// Renders listings and ticket details to strings.
pub struct Printer {
    theme: Theme,
    width: usize,
}

impl Printer {
    pub fn new(theme: Theme) -> Self {
        Printer {
            theme,
            width: terminal_width(),
        }
    }

    /// Fixed-width constructor, used by tests for stable layout.
    pub fn with_width(theme: Theme, width: usize) -> Self {
        Printer { theme, width }
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Render the grouped listing.
    ///
    /// Release tables come first, the caller's inbox last. `compact` drops
    /// the weight and status columns; the caller uses it when every shown
    /// ticket is open anyway. `inbox_owner` labels the inbox section when
    /// the listing carries one.
    pub fn listing(&self, listing: &Listing, compact: bool, inbox_owner: Option<&str>) -> String {
        let mut out = String::new();

        for rows in &listing.releases {
            if rows.tickets.is_empty() {
                continue;
            }
            out.push_str(&self.release_section(rows, compact));
            out.push('\n');
        }

        if !listing.inbox.is_empty() {
            let owner = inbox_owner.unwrap_or("me");
            let header = format!("assigned to {owner}");
            out.push_str(&self.section_header(&header, None));
            out.push_str(&self.column_header(compact));
            for ticket in &listing.inbox {
                out.push_str(&self.ticket_row(ticket, compact));
            }
            out.push('\n');
        }

        out
    }

    fn release_section(&self, rows: &ReleaseRows, compact: bool) -> String {
        let mut out = self.section_header(&rows.release, rows.progress);
        out.push_str(&self.column_header(compact));
        for ticket in &rows.tickets {
            out.push_str(&self.ticket_row(ticket, compact));
        }
        out
    }

    /// Full-width header line: release name left, progress bar right.
    fn section_header(&self, name: &str, progress: Option<f64>) -> String {
        let bar = progress.map(|f| self.progress_bar(f));
        let bar_cols = if bar.is_some() { PROGRESS_WIDTH + 1 } else { 0 };
        let name_field = pad(name, self.width.saturating_sub(bar_cols));

        let mut line = self.theme.paint(S_RELEASE, &name_field);
        if let Some(bar) = bar {
            line.push(' ');
            line.push_str(&bar);
        }
        line.push('\n');
        line
    }

    /// Fraction of `PROGRESS_WIDTH` cells filled, percentage overlaid.
    fn progress_bar(&self, fraction: f64) -> String {
        let fraction = fraction.clamp(0.0, 1.0);
        let label = center(&format!("{:.0}%", fraction * 100.0), PROGRESS_WIDTH);
        let filled = (fraction * PROGRESS_WIDTH as f64).round() as usize;

        if !self.theme.enabled {
            // No colors to carry the fill, so draw it with characters.
            let mut bar = String::with_capacity(PROGRESS_WIDTH + 2);
            bar.push('[');
            for (i, c) in label.chars().enumerate() {
                bar.push(if c == ' ' && i < filled { '#' } else { c });
            }
            bar.push(']');
            return bar;
        }

        let (fill, rest) = split_at_char(&label, filled);
        format!("{S_BAR_FILL}{fill}{S_RESET}{S_BAR_REST}{rest}{S_RESET}")
    }

    fn column_header(&self, compact: bool) -> String {
        let line = self.row(
            "id", "type", "title", "wght", "status", "date", "prio", compact,
        );
        format!("{}\n", self.theme.paint(S_COLUMNS, &line))
    }

    fn ticket_row(&self, ticket: &Ticket, compact: bool) -> String {
        let mut title = ticket.subject.clone();
        if ticket.assigned_to != UNASSIGNED {
            title.push_str(&format!(" ({})", first_name(&ticket.assigned_to)));
        }

        let date = ticket.created.format("%Y-%m-%d").to_string();
        let line = self.row(
            short_id(&ticket.id),
            ticket.ticket_type.as_str(),
            &title,
            ticket.weight.bucket(),
            ticket.status.as_str(),
            &date,
            ticket.priority.name(),
            compact,
        );
        match self.theme.row_style(ticket.status) {
            Some(style) => format!("{style}{line}{S_RESET}\n"),
            None => format!("{line}\n"),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn row(
        &self,
        id: &str,
        kind: &str,
        title: &str,
        weight: &str,
        status: &str,
        date: &str,
        prio: &str,
        compact: bool,
    ) -> String {
        let fixed = if compact {
            W_ID + W_TYPE + W_DATE + W_PRIO + 4
        } else {
            W_ID + W_TYPE + W_WEIGHT + W_STATUS + W_DATE + W_PRIO + 6
        };
        let title_width = self.width.saturating_sub(fixed).max(W_TITLE_MIN);

        let mut cells = vec![pad(id, W_ID), pad(kind, W_TYPE), pad(title, title_width)];
        if !compact {
            cells.push(pad(weight, W_WEIGHT));
            cells.push(pad(status, W_STATUS));
        }
        cells.push(pad(date, W_DATE));
        cells.push(pad(prio, W_PRIO));
        cells.join(" ")
    }

    // =========================================================================
    // Detail View
    // =========================================================================

    /// Render one ticket in full: every header field, then the body.
    pub fn ticket(&self, ticket: &Ticket) -> String {
        let mut out = String::new();
        let field = |out: &mut String, name: &str, value: &str| {
            out.push_str(&format!("{:>13}: {}\n", name, value));
        };

        field(&mut out, "Id", &ticket.id);
        field(&mut out, "Subject", &ticket.subject);
        field(&mut out, "Issuer", &ticket.issuer);
        field(&mut out, "Type", ticket.ticket_type.as_str());
        field(&mut out, "Priority", ticket.priority.name());
        field(
            &mut out,
            "Weight",
            &format!("{} ({})", ticket.weight, ticket.weight.bucket()),
        );
        field(&mut out, "Status", ticket.status.as_str());
        field(&mut out, "Assigned to", &ticket.assigned_to);
        field(&mut out, "Release", &ticket.release);
        field(&mut out, "Created", &ticket.created.to_string());
        field(&mut out, "Last modified", &ticket.last_modified.to_string());

        if !ticket.body.trim().is_empty() {
            out.push('\n');
            out.push_str(ticket.body.trim_end());
            out.push('\n');
        }
        out
    }
}

/// Width of the attached terminal, or 80 when there is none.
fn terminal_width() -> usize {
    match crossterm::terminal::size() {
        Ok((cols, _)) => usize::from(cols).max(40),
        Err(_) => 80,
    }
}

/// Pad or chop to exactly `width` characters.
fn pad(text: &str, width: usize) -> String {
    let mut s: String = text.chars().take(width).collect();
    while s.chars().count() < width {
        s.push(' ');
    }
    s
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count().min(width);
    let left = (width - len) / 2;
    let mut s = " ".repeat(left);
    s.extend(text.chars().take(width));
    while s.chars().count() < width {
        s.push(' ');
    }
    s
}

fn split_at_char(text: &str, index: usize) -> (&str, &str) {
    match text.char_indices().nth(index) {
        Some((byte, _)) => text.split_at(byte),
        None => (text, ""),
    }
}

/// First whitespace-separated word of an owner name.
fn first_name(owner: &str) -> &str {
    owner.split_whitespace().next().unwrap_or(owner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ticket::Ticket;
    use crate::core::types::{Priority, Status, TicketType, Weight};
    use chrono::NaiveDate;

    const PLAIN: Theme = Theme { enabled: false };

    fn sample(subject: &str, status: Status, assigned: &str) -> Ticket {
        let created = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut ticket = Ticket::new(
            subject,
            "Ada Lovelace <ada@example.org>",
            TicketType::Issue,
            Priority::MEDIUM,
            Weight::new(3).unwrap(),
            "1.0",
            "",
            created,
        );
        ticket.status = status;
        ticket.assigned_to = assigned.to_string();
        ticket
    }

    #[test]
    fn padding_pads_and_chops() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("abcdef", 4), "abcd");
    }

    #[test]
    fn centering() {
        assert_eq!(center("50%", 9), "   50%   ");
    }

    #[test]
    fn row_carries_owner_first_name() {
        let printer = Printer::with_width(PLAIN, 100);
        let row = printer.ticket_row(&sample("fix the thing", Status::Open, "Ada Lovelace"), false);
        assert!(row.contains("fix the thing (Ada)"));
    }

    #[test]
    fn unassigned_row_has_no_annotation() {
        let printer = Printer::with_width(PLAIN, 100);
        let row = printer.ticket_row(&sample("fix the thing", Status::Open, UNASSIGNED), false);
        assert!(!row.contains('('));
    }

    #[test]
    fn compact_rows_drop_weight_and_status() {
        let printer = Printer::with_width(PLAIN, 100);
        let row = printer.ticket_row(&sample("fix", Status::Open, UNASSIGNED), true);
        assert!(!row.contains("open"));
        let full = printer.ticket_row(&sample("fix", Status::Open, UNASSIGNED), false);
        assert!(full.contains("open"));
    }

    #[test]
    fn plain_progress_bar_has_label() {
        let printer = Printer::with_width(PLAIN, 100);
        let bar = printer.progress_bar(0.5);
        assert!(bar.starts_with('['));
        assert!(bar.contains("50%"));
        assert!(bar.ends_with(']'));
    }

    #[test]
    fn inbox_renders_after_the_release_tables() {
        let printer = Printer::with_width(PLAIN, 100);
        let listing = Listing {
            releases: vec![ReleaseRows {
                release: "1.0".to_string(),
                progress: Some(0.0),
                tickets: vec![sample("released work", Status::Open, UNASSIGNED)],
            }],
            inbox: vec![sample("my work", Status::Open, "Ada Lovelace")],
        };
        let out = printer.listing(&listing, false, Some("Ada Lovelace"));

        let release_at = out.find("released work").unwrap();
        let inbox_at = out.find("assigned to Ada Lovelace").unwrap();
        assert!(release_at < inbox_at);
    }

    #[test]
    fn detail_view_lists_every_field() {
        let printer = Printer::with_width(PLAIN, 100);
        let text = printer.ticket(&sample("fix the thing", Status::Open, UNASSIGNED));
        for field in [
            "Id:", "Subject:", "Issuer:", "Type:", "Priority:", "Weight:", "Status:",
            "Assigned to:", "Release:", "Created:", "Last modified:",
        ] {
            assert!(text.contains(field), "missing {field}");
        }
    }
}
