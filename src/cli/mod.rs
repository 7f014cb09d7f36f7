//! cli
//!
//! Command-line interface layer for Burrow.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Does NOT perform repository mutations directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! handlers that drive [`crate::store::TicketStore`]. All hidden-branch
//! state changes flow through the store's critical-section protocol.

pub mod args;
pub mod commands;

pub use args::Cli;

use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;

/// Execution context shared by all command handlers.
pub struct Context {
    pub cwd: Option<PathBuf>,
    pub quiet: bool,
    /// Colored table output. Off with `--no-color` or a non-tty stdout.
    pub color: bool,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = Context {
        cwd: cli.cwd.clone(),
        quiet: cli.quiet,
        color: !cli.no_color && std::io::stdout().is_terminal(),
    };

    commands::dispatch(cli.command, &ctx)
}
