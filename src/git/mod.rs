//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. All repository reads and
//! writes flow through this interface. Direct parsing of `.git` internal
//! files outside this module is prohibited. No other module should import
//! `git2`.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Branch/HEAD introspection and symbolic HEAD repointing
//! - Object reads at `<branch>:<path>` and tree listings
//! - Pathspec-limited commits built from the branch tip tree
//! - Index reset and worktree restoration for one subtree
//! - Dirty-tree checks
//! - Remote branch search, fetch, and fast-forward
//! - Config value reads
//!
//! # Invariants
//!
//! - Commits never sweep in index state beyond the named paths
//! - `set_head` never touches the working tree or index
//! - No other module calls git2 directly

mod interface;

pub use interface::{EntryKind, FastForward, Git, GitError, RemoteBranch, TreeEntry};
