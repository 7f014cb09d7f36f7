//! list command - the release table

use anyhow::Result;

use crate::cli::commands::open_repo;
use crate::cli::Context;
use crate::core::config::Identity;
use crate::core::types::Status;
use crate::store::TicketStore;
use crate::ui::{Printer, Theme};

/// List tickets grouped by release.
///
/// The default view shows open and test tickets only; `--all` widens the
/// filter to every status and adds the weight and status columns. Naming
/// releases narrows the table to those releases.
pub fn list(ctx: &Context, all: bool, json: bool, releases: &[String]) -> Result<()> {
    let git = open_repo(ctx)?;
    let store = TicketStore::new(&git);

    let filter: Vec<Status> = if all {
        vec![
            Status::Open,
            Status::Test,
            Status::Fixed,
            Status::Closed,
            Status::Rejected,
        ]
    } else {
        Status::DEFAULT_FILTER.to_vec()
    };

    // Inbox only makes sense when git knows who we are.
    let identity = Identity::from_repo(&git).ok();
    let user = identity.as_ref().map(|i| i.name.as_str());
    let listing = store.list(&filter, releases, user)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if listing.row_count() == 0 {
        if !ctx.quiet {
            if all {
                println!("no tickets yet. use 'bur new' to add new tickets.");
            } else {
                println!("no open tickets. use the -a flag to show all tickets.");
            }
        }
        return Ok(());
    }

    let printer = Printer::new(Theme { enabled: ctx.color });
    print!("{}", printer.listing(&listing, !all, user));
    Ok(())
}
