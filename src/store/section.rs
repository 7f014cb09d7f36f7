//! store::section
//!
//! The critical-section protocol for mutating the hidden branch.
//!
//! Every mutation of the ticket database follows the same shape:
//! enter the critical section, do file-level work under the ticket root,
//! commit, leave. "Enter" repoints the symbolic HEAD reference at the
//! hidden branch without any checkout; "leave" repoints HEAD back at the
//! original branch and restores the index and working tree for the ticket
//! root to what that branch expects.
//!
//! State machine per operation:
//!
//! ```text
//! Idle -> Entered(original_branch) -> Committed -> Restored
//! ```
//!
//! Restoration is the guaranteed finalizer: [`CriticalSection::finish`]
//! runs it and reports errors on the happy path, and [`Drop`] runs it
//! best-effort on every other exit path (early returns, propagated
//! errors). It is idempotent.
//!
//! There is no inter-process locking: two processes racing on the same
//! repository can interleave HEAD repoints. Callers are responsible for
//! serializing access.

use std::path::Path;

use crate::git::{Git, GitError};
use crate::store::{StoreError, TICKET_DIR};

/// Scoped HEAD repoint onto the hidden branch.
///
/// While a `CriticalSection` is live, HEAD points at the hidden branch and
/// [`CriticalSection::commit`] advances it. Dropping the guard (or calling
/// [`CriticalSection::finish`]) restores the original branch, index, and
/// working tree for the ticket root.
#[must_use = "dropping the guard immediately would restore HEAD before any commit"]
pub struct CriticalSection<'a> {
    git: &'a Git,
    original_branch: String,
    restored: bool,
}

impl<'a> CriticalSection<'a> {
    /// Enter the critical section.
    ///
    /// Preconditions checked before HEAD moves: the working tree must have
    /// no unstaged and no uncommitted changes, otherwise user changes could
    /// be conflated with store changes.
    ///
    /// # Errors
    ///
    /// - [`StoreError::DirtyWorkingTree`] if the precondition fails
    /// - [`StoreError::Git`] if HEAD cannot be read or repointed
    pub fn enter(git: &'a Git, hidden_branch: &str) -> Result<Self, StoreError> {
        if git.has_unstaged_changes()? {
            return Err(StoreError::DirtyWorkingTree {
                details: "unstaged changes".to_string(),
            });
        }
        if git.has_uncommitted_changes()? {
            return Err(StoreError::DirtyWorkingTree {
                details: "uncommitted changes".to_string(),
            });
        }

        let original_branch = git.current_branch()?;
        git.set_head(hidden_branch)?;
        Ok(CriticalSection {
            git,
            original_branch,
            restored: false,
        })
    }

    /// Commit the named ticket-root paths onto the hidden branch.
    ///
    /// Paths are workdir-relative. See [`Git::stage_and_commit`].
    pub fn commit(&self, paths: &[&str], message: &str) -> Result<String, GitError> {
        self.git.stage_and_commit(paths, message)
    }

    /// Leave the critical section, reporting restoration errors.
    pub fn finish(mut self) -> Result<(), GitError> {
        self.restore()
    }

    /// Restore the original branch, index, and worktree. Idempotent.
    ///
    /// Every step is attempted even when an earlier one fails; HEAD must
    /// never be left on the hidden branch because one cleanup step broke.
    fn restore(&mut self) -> Result<(), GitError> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        let head = self.git.set_head(&self.original_branch);
        let index = self.git.reset_index(&self.original_branch, TICKET_DIR);
        let worktree = self.git.restore_worktree(TICKET_DIR);
        if let Ok(workdir) = self.git.workdir() {
            prune_empty_dirs(&workdir.join(TICKET_DIR));
        }

        head.and(index).and(worktree)
    }
}

impl Drop for CriticalSection<'_> {
    fn drop(&mut self) {
        // Guaranteed finalizer. An error during unwind cannot be reported
        // without clobbering the one already in flight.
        let _ = self.restore();
    }
}

/// Remove `root` and its subdirectories wherever they are empty.
///
/// Leaves non-empty directories (and their ancestors) alone. Missing paths
/// are fine.
pub(crate) fn prune_empty_dirs(root: &Path) {
    if !root.is_dir() {
        return;
    }
    if let Ok(entries) = std::fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                prune_empty_dirs(&path);
            }
        }
    }
    // Fails while the directory still has contents, which is the point.
    let _ = std::fs::remove_dir(root);
}
