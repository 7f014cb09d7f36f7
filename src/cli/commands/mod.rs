//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the ticket store to execute the command
//! 3. Formats and displays output
//!
//! Handlers do NOT touch the hidden branch directly; every mutation goes
//! through [`crate::store::TicketStore`].

mod edit;
mod init;
mod list;
mod move_cmd;
mod new;
mod remove;
mod show;
mod sync;
mod workflow;

pub use edit::edit;
pub use init::init;
pub use list::list;
pub use move_cmd::move_ticket;
pub use new::new;
pub use remove::remove;
pub use show::show;
pub use sync::sync;
pub use workflow::{assign, leave, reopen, set_status, take};

use anyhow::Result;

use crate::cli::args::Command;
use crate::cli::Context;
use crate::core::types::Status;
use crate::git::Git;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init => init(ctx),
        Command::New => new(ctx),
        Command::List { all, json, release } => list(ctx, all, json, &release),
        Command::Show { prefix, json } => show(ctx, &prefix, json),
        Command::Edit { prefix } => edit(ctx, &prefix),
        Command::Move { prefix, release } => move_ticket(ctx, &prefix, &release),
        Command::Test { prefix } => set_status(ctx, &prefix, Status::Test),
        Command::Fix { prefix } => set_status(ctx, &prefix, Status::Fixed),
        Command::Close { prefix } => set_status(ctx, &prefix, Status::Closed),
        Command::Reject { prefix } => set_status(ctx, &prefix, Status::Rejected),
        Command::Reopen { prefix } => reopen(ctx, &prefix),
        Command::Take { prefix } => take(ctx, &prefix),
        Command::Assign { prefix, owner } => assign(ctx, &prefix, &owner),
        Command::Leave { prefix } => leave(ctx, &prefix),
        Command::Rm { prefix, force } => remove(ctx, &prefix, force),
        Command::Sync => sync(ctx),
    }
}

/// Open the repository the command should act on.
fn open_repo(ctx: &Context) -> Result<Git> {
    let cwd = match &ctx.cwd {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };
    Ok(Git::open(&cwd)?)
}
