//! workflow commands - status transitions and ownership

use anyhow::Result;

use crate::cli::commands::open_repo;
use crate::cli::Context;
use crate::core::config::Identity;
use crate::core::ticket::short_id;
use crate::core::types::Status;
use crate::store::{AssignOutcome, TicketStore};

/// Mark a ticket test/fixed/closed/rejected.
pub fn set_status(ctx: &Context, prefix: &str, status: Status) -> Result<()> {
    let git = open_repo(ctx)?;
    let store = TicketStore::new(&git);

    let ticket = store.set_status(prefix, status)?;
    if !ctx.quiet {
        println!("ticket '{}' now {}", short_id(&ticket.id), ticket.status);
    }
    Ok(())
}

/// Put a finished ticket back in the open pile.
pub fn reopen(ctx: &Context, prefix: &str) -> Result<()> {
    let git = open_repo(ctx)?;
    let store = TicketStore::new(&git);

    let ticket = store.reopen(prefix)?;
    if !ctx.quiet {
        println!("ticket '{}' reopened", short_id(&ticket.id));
    }
    Ok(())
}

/// Take ownership yourself; the owner name comes from `user.name`.
pub fn take(ctx: &Context, prefix: &str) -> Result<()> {
    let git = open_repo(ctx)?;
    let identity = Identity::from_repo(&git)?;
    assign_as(ctx, &git, prefix, &identity.name)
}

/// Hand the ticket to a named owner.
pub fn assign(ctx: &Context, prefix: &str, owner: &str) -> Result<()> {
    let git = open_repo(ctx)?;
    assign_as(ctx, &git, prefix, owner)
}

fn assign_as(ctx: &Context, git: &crate::git::Git, prefix: &str, owner: &str) -> Result<()> {
    let store = TicketStore::new(git);
    let outcome = store.assign(prefix, owner)?;
    if ctx.quiet {
        return Ok(());
    }
    match outcome {
        AssignOutcome::Updated(ticket) => {
            println!("ticket {} taken by \"{owner}\"", short_id(&ticket.id));
        }
        AssignOutcome::Unchanged(ticket) => {
            println!(
                "ticket {} is already assigned to \"{owner}\"",
                short_id(&ticket.id)
            );
        }
    }
    Ok(())
}

/// Give up ownership.
pub fn leave(ctx: &Context, prefix: &str) -> Result<()> {
    let git = open_repo(ctx)?;
    let store = TicketStore::new(&git);

    let outcome = store.unassign(prefix)?;
    if ctx.quiet {
        return Ok(());
    }
    match outcome {
        AssignOutcome::Updated(ticket) => {
            println!("ticket {} left alone", short_id(&ticket.id));
        }
        AssignOutcome::Unchanged(ticket) => {
            println!("ticket {} is not assigned", short_id(&ticket.id));
        }
    }
    Ok(())
}
