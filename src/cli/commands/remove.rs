//! rm command - permanent deletion

use anyhow::Result;

use crate::cli::commands::open_repo;
use crate::cli::Context;
use crate::core::ticket::short_id;
use crate::store::TicketStore;
use crate::ui::prompts;

/// Delete a ticket for good, after confirmation.
///
/// The backing object disappears from the branch tip; history still has it,
/// which is what makes this safe enough to offer at all.
pub fn remove(ctx: &Context, prefix: &str, force: bool) -> Result<()> {
    let git = open_repo(ctx)?;
    let store = TicketStore::new(&git);

    // Resolve before prompting so a bad prefix fails without a question.
    let located = store.get(prefix)?;
    let id = short_id(&located.ticket.id).to_string();

    if !force {
        let question = format!(
            "permanently remove ticket '{id}' ({})?",
            located.ticket.subject
        );
        if !prompts::confirm(&question)? {
            if !ctx.quiet {
                println!("aborted.");
            }
            return Ok(());
        }
    }

    store.remove(&located.ticket.id)?;
    if !ctx.quiet {
        println!("removed ticket '{id}'");
    }
    Ok(())
}
