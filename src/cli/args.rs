//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--quiet` / `-q`: Minimal output
//! - `--no-color`: Disable colored output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Burrow - a ticket tracker that lives on a hidden branch of your repo
#[derive(Parser, Debug)]
#[command(name = "bur")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if bur was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize the ticket database in this repository
    Init,

    /// File a new ticket (interactive)
    New,

    /// List tickets grouped by release
    List {
        /// Show finished tickets too
        #[arg(short, long)]
        all: bool,

        /// Machine-readable JSON instead of the table
        #[arg(long)]
        json: bool,

        /// Only list these releases
        #[arg(short, long)]
        release: Vec<String>,
    },

    /// Show one ticket in full
    Show {
        /// Unique prefix of the ticket id
        prefix: String,

        /// Machine-readable JSON instead of the field view
        #[arg(long)]
        json: bool,
    },

    /// Edit a ticket in your editor
    Edit {
        /// Unique prefix of the ticket id
        prefix: String,
    },

    /// Move a ticket to another release
    #[command(name = "move", visible_alias = "mv")]
    Move {
        /// Unique prefix of the ticket id
        prefix: String,

        /// Target release
        release: String,
    },

    /// Mark a ticket ready for testing
    Test {
        /// Unique prefix of the ticket id
        prefix: String,
    },

    /// Mark a ticket fixed
    Fix {
        /// Unique prefix of the ticket id
        prefix: String,
    },

    /// Close a ticket
    Close {
        /// Unique prefix of the ticket id
        prefix: String,
    },

    /// Reject a ticket
    Reject {
        /// Unique prefix of the ticket id
        prefix: String,
    },

    /// Reopen a finished ticket
    Reopen {
        /// Unique prefix of the ticket id
        prefix: String,
    },

    /// Take ownership of a ticket
    Take {
        /// Unique prefix of the ticket id
        prefix: String,
    },

    /// Hand a ticket to someone else
    Assign {
        /// Unique prefix of the ticket id
        prefix: String,

        /// New owner's name
        owner: String,
    },

    /// Give up ownership of a ticket
    Leave {
        /// Unique prefix of the ticket id
        prefix: String,
    },

    /// Permanently delete a ticket
    Rm {
        /// Unique prefix of the ticket id
        prefix: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Fetch the ticket branch from the remote and fast-forward
    Sync,
}
