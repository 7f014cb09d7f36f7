//! show command - one ticket in full

use anyhow::Result;

use crate::cli::commands::open_repo;
use crate::cli::Context;
use crate::store::TicketStore;
use crate::ui::{Printer, Theme};

/// Show every field of the ticket matching `prefix`, then its body.
pub fn show(ctx: &Context, prefix: &str, json: bool) -> Result<()> {
    let git = open_repo(ctx)?;
    let store = TicketStore::new(&git);
    let located = store.get(prefix)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&located.ticket)?);
        return Ok(());
    }

    let printer = Printer::new(Theme { enabled: ctx.color });
    print!("{}", printer.ticket(&located.ticket));
    Ok(())
}
