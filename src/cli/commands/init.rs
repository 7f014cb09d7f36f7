//! init command - create the ticket database in this repository

use anyhow::Result;

use crate::cli::commands::open_repo;
use crate::cli::Context;
use crate::store::{InitOutcome, TicketStore};

/// Initialize the ticket database. Safe to run twice.
pub fn init(ctx: &Context) -> Result<()> {
    let git = open_repo(ctx)?;
    let store = TicketStore::new(&git);

    let outcome = store.init()?;
    if ctx.quiet {
        return Ok(());
    }
    match outcome {
        InitOutcome::AlreadyInitialized => {
            println!("ticket database already initialized.");
        }
        InitOutcome::TrackedRemote { remote_ref } => {
            println!("tracking existing ticket database from '{remote_ref}'.");
        }
        InitOutcome::Created => {
            println!("Initialized empty ticket database.");
        }
    }
    Ok(())
}
