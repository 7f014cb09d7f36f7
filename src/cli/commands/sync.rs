//! sync command - pull the ticket branch from the remote

use anyhow::Result;

use crate::cli::commands::open_repo;
use crate::cli::Context;
use crate::git::FastForward;
use crate::store::TicketStore;

/// Fetch the hidden branch and fast-forward the local copy.
///
/// Divergent histories are reported, not merged; the local branch is never
/// rewound.
pub fn sync(ctx: &Context) -> Result<()> {
    let git = open_repo(ctx)?;
    let store = TicketStore::new(&git);

    let outcome = store.sync()?;
    if ctx.quiet {
        return Ok(());
    }
    match outcome {
        FastForward::UpToDate => println!("already up to date."),
        FastForward::Updated(oid) => println!("ticket branch updated to {oid}."),
        FastForward::Created(oid) => println!("ticket branch created at {oid}."),
    }
    Ok(())
}
