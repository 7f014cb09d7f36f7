//! new command - file a ticket interactively

use std::fmt::Display;
use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::cli::commands::open_repo;
use crate::cli::Context;
use crate::core::config::Identity;
use crate::core::ticket::{short_id, Ticket, UNCATEGORIZED};
use crate::core::types::{Priority, TicketType, Weight};
use crate::store::{self, TicketStore};
use crate::ui::prompts;

/// File a new ticket.
///
/// Prompts for each field; defaults are in brackets. The author comes from
/// the repository's git identity, checked before any prompting so a missing
/// `user.name` fails fast instead of after five questions.
pub fn new(ctx: &Context) -> Result<()> {
    let git = open_repo(ctx)?;
    let store = TicketStore::new(&git);
    store.require_exists()?;
    let identity = Identity::from_repo(&git)?;

    let subject = prompts::input("Title", None, |answer| {
        if answer.trim().is_empty() {
            Err("a title is required".to_string())
        } else {
            Ok(answer.trim().to_string())
        }
    })?;
    let ticket_type: TicketType = prompt_parsed("Type", "issue")?;
    let priority: Priority = prompt_parsed("Priority", "2")?;
    let weight: Weight = prompt_parsed("Weight", "3")?;
    let release = prompts::input("Release", Some(UNCATEGORIZED), |answer| {
        if answer == "." || answer == ".." || answer.contains('/') || answer.contains('\\') {
            Err("release labels cannot contain path components".to_string())
        } else {
            Ok(answer.to_string())
        }
    })?;

    let ticket = Ticket::new(
        subject,
        identity.issuer(),
        ticket_type,
        priority,
        weight,
        release,
        "",
        store::now(),
    );
    let ticket = store.create(ticket)?;
    if !ctx.quiet {
        println!("created ticket '{}'", short_id(&ticket.id));
    }
    Ok(())
}

/// Prompt until the answer parses as `T`, then return the parsed value.
fn prompt_parsed<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let answer = prompts::input(name, Some(default), |answer| match answer.parse::<T>() {
        Ok(_) => Ok(answer.to_string()),
        Err(e) => Err(e.to_string()),
    })?;
    answer.parse().map_err(|e: T::Err| anyhow!("{e}"))
}
