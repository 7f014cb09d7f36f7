//! move command - relocate a ticket to another release

use anyhow::Result;

use crate::cli::commands::open_repo;
use crate::cli::Context;
use crate::store::{MoveOutcome, TicketStore};

/// Move a ticket into `release`.
pub fn move_ticket(ctx: &Context, prefix: &str, release: &str) -> Result<()> {
    let git = open_repo(ctx)?;
    let store = TicketStore::new(&git);

    let outcome = store.move_ticket(prefix, release)?;
    if ctx.quiet {
        return Ok(());
    }
    match outcome {
        MoveOutcome::Moved { id, release } => {
            println!("moved ticket '{id}' to '{release}'");
        }
        MoveOutcome::SameRelease { id, release } => {
            println!("ticket '{id}' is already in release '{release}'");
        }
    }
    Ok(())
}
