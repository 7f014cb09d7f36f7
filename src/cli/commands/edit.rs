//! edit command - open a ticket in the configured editor

use std::io::Write;
use std::process::Command;

use anyhow::{bail, Context as _, Result};

use crate::cli::commands::open_repo;
use crate::cli::Context;
use crate::core::config;
use crate::core::ticket::{short_id, PathOverrides, Ticket};
use crate::store::{self, TicketStore};

/// Edit a ticket's text form and commit the result.
///
/// The encoded ticket goes to a temp file, the editor runs on it, and the
/// file is decoded back. Id and release are fixed by the store (the release
/// changes through `bur move`); editing those header lines has no effect.
pub fn edit(ctx: &Context, prefix: &str) -> Result<()> {
    let git = open_repo(ctx)?;
    let store = TicketStore::new(&git);
    let located = store.get(prefix)?;
    let editor = config::editor(&git)?;

    let original = located.ticket.encode();
    let mut file = tempfile::Builder::new()
        .prefix("bur-")
        .suffix(".ticket")
        .tempfile()
        .context("could not create temp file for editing")?;
    file.write_all(original.as_bytes())?;
    file.flush()?;

    let status = Command::new("sh")
        .arg("-c")
        .arg(format!("{editor} '{}'", file.path().display()))
        .status()
        .with_context(|| format!("could not launch editor '{editor}'"))?;
    if !status.success() {
        bail!("editor exited with {status}; ticket unchanged");
    }

    let edited = std::fs::read_to_string(file.path())?;
    if edited == original {
        if !ctx.quiet {
            println!("no changes.");
        }
        return Ok(());
    }

    let mut ticket = Ticket::decode(
        &edited,
        PathOverrides {
            id: Some(&located.ticket.id),
            release: Some(&located.ticket.release),
        },
    )?;
    ticket.id = located.ticket.id.clone();
    ticket.release = located.ticket.release.clone();
    ticket.last_modified = store::now();

    store.update(&ticket)?;
    if !ctx.quiet {
        println!("ticket '{}' edited", short_id(&ticket.id));
    }
    Ok(())
}
