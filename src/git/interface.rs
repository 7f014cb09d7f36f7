//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in
//! Burrow. All repository reads and writes flow through this interface,
//! which provides structured results and normalizes errors into typed
//! failure categories.
//!
//! # Architecture
//!
//! The `Git` struct is the only way to interact with a Git repository.
//! No other module should import `git2` directly. This ensures:
//!
//! - Consistent error handling across all Git operations
//! - Strong type guarantees at the boundary
//! - One place where the commit-without-checkout machinery lives
//!
//! # Commits without checkout
//!
//! The ticket store commits onto the hidden branch while the working tree
//! stays on the user's branch. [`Git::stage_and_commit`] therefore builds
//! the commit tree from the branch tip plus only the named worktree paths,
//! never from the full index: files from the user's branch can never leak
//! into a ticket commit, and ticket files never enter the user's index.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// No object at the given path under the given ref.
    #[error("object not found: {spec}")]
    ObjectNotFound {
        /// `<ref>:<path>` of the missing object
        spec: String,
    },

    /// HEAD is not a symbolic reference to a branch.
    #[error("HEAD is detached; checkout a branch first")]
    DetachedHead,

    /// A commit was requested but the tree is unchanged.
    #[error("nothing to commit")]
    NothingToCommit,

    /// A branch update would lose commits.
    #[error("branch {branch} has diverged from its remote; not fast-forwarding")]
    NonFastForward {
        /// The local branch that diverged
        branch: String,
    },

    /// Object content is not valid UTF-8.
    #[error("object is not valid UTF-8: {spec}")]
    InvalidUtf8 {
        /// `<ref>:<path>` of the object
        spec: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context == "HEAD" {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        spec: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Blob,
    Tree,
    Other,
}

/// One entry from a tree listing.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    /// Raw git filemode of the entry
    pub mode: i32,
    /// Blob, tree, or something else (submodule, symlink target)
    pub kind: EntryKind,
    /// Hex object id of the entry
    pub oid: String,
    /// Path relative to the listed root, `/`-separated
    pub path: String,
}

/// A remote branch reference and its tip.
#[derive(Debug, Clone)]
pub struct RemoteBranch {
    /// Short remote branch name, e.g. `origin/burrow`
    pub name: String,
    /// Hex commit id of the branch tip
    pub oid: String,
}

/// Outcome of a fast-forward attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastForward {
    /// The local branch already matched the target.
    UpToDate,
    /// The local branch was advanced to the target commit.
    Updated(String),
    /// The local branch did not exist and was created at the target commit.
    Created(String),
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. All repository
/// reads and writes flow through this interface. No other module should
/// import `git2`.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Path to the working directory root.
    pub fn workdir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    // =========================================================================
    // Branch and HEAD Introspection
    // =========================================================================

    /// Name of the branch HEAD points to.
    ///
    /// Reads the symbolic target of HEAD directly, so this works even when
    /// the branch is unborn (no commits yet).
    ///
    /// # Errors
    ///
    /// - [`GitError::DetachedHead`] if HEAD is not symbolic
    pub fn current_branch(&self) -> Result<String, GitError> {
        let head = self
            .repo
            .find_reference("HEAD")
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        match head.symbolic_target() {
            Some(target) => target
                .strip_prefix("refs/heads/")
                .map(str::to_string)
                .ok_or(GitError::DetachedHead),
            None => Err(GitError::DetachedHead),
        }
    }

    /// Repoint the symbolic HEAD reference at a branch without checkout.
    ///
    /// The working tree and index are untouched; if the branch has no
    /// commits yet, HEAD becomes unborn and the next commit creates it.
    pub fn set_head(&self, branch: &str) -> Result<(), GitError> {
        let refname = format!("refs/heads/{branch}");
        self.repo
            .set_head(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))
    }

    /// Check if a local branch exists.
    pub fn branch_exists(&self, branch: &str) -> bool {
        self.repo
            .find_branch(branch, git2::BranchType::Local)
            .is_ok()
    }

    // =========================================================================
    // Object Reads
    // =========================================================================

    /// Read the blob at `path` in the tip tree of `branch`.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the branch doesn't exist
    /// - [`GitError::ObjectNotFound`] if nothing lives at that path
    pub fn read_object(&self, branch: &str, path: &str) -> Result<Vec<u8>, GitError> {
        let spec = format!("{branch}:{path}");
        let tree = self.branch_tree(branch)?;
        let entry = tree
            .get_path(Path::new(path))
            .map_err(|e| GitError::from_git2(e, &spec))?;
        let object = entry
            .to_object(&self.repo)
            .map_err(|e| GitError::from_git2(e, &spec))?;
        let blob = object
            .into_blob()
            .map_err(|_| GitError::ObjectNotFound { spec: spec.clone() })?;
        Ok(blob.content().to_vec())
    }

    /// Read the blob at `path` in `branch` as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Those of [`Git::read_object`], plus [`GitError::InvalidUtf8`].
    pub fn read_object_string(&self, branch: &str, path: &str) -> Result<String, GitError> {
        let content = self.read_object(branch, path)?;
        String::from_utf8(content).map_err(|_| GitError::InvalidUtf8 {
            spec: format!("{branch}:{path}"),
        })
    }

    /// List the tree at `path` in the tip tree of `branch`.
    ///
    /// With `recursive`, descends into subtrees and reports every entry with
    /// its path relative to `path`. Without it, reports only the immediate
    /// children.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if the branch doesn't exist
    /// - [`GitError::ObjectNotFound`] if `path` is not a tree
    pub fn list_tree(
        &self,
        branch: &str,
        path: &str,
        recursive: bool,
    ) -> Result<Vec<TreeEntry>, GitError> {
        let spec = format!("{branch}:{path}");
        let root = self.branch_tree(branch)?;
        let tree = if path.is_empty() {
            root
        } else {
            let entry = root
                .get_path(Path::new(path))
                .map_err(|e| GitError::from_git2(e, &spec))?;
            let object = entry
                .to_object(&self.repo)
                .map_err(|e| GitError::from_git2(e, &spec))?;
            object
                .into_tree()
                .map_err(|_| GitError::ObjectNotFound { spec: spec.clone() })?
        };

        let mut entries = Vec::new();
        if recursive {
            tree.walk(git2::TreeWalkMode::PreOrder, |root, entry| {
                if let Some(name) = entry.name() {
                    entries.push(TreeEntry {
                        mode: entry.filemode(),
                        kind: entry_kind(entry.kind()),
                        oid: entry.id().to_string(),
                        path: format!("{root}{name}"),
                    });
                }
                git2::TreeWalkResult::Ok
            })
            .map_err(|e| GitError::from_git2(e, &spec))?;
        } else {
            for entry in tree.iter() {
                if let Some(name) = entry.name() {
                    entries.push(TreeEntry {
                        mode: entry.filemode(),
                        kind: entry_kind(entry.kind()),
                        oid: entry.id().to_string(),
                        path: name.to_string(),
                    });
                }
            }
        }
        Ok(entries)
    }

    /// Tip tree of a local branch.
    fn branch_tree(&self, branch: &str) -> Result<git2::Tree<'_>, GitError> {
        let refname = format!("refs/heads/{branch}");
        let reference = self
            .repo
            .find_reference(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))?;
        let commit = reference
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, &refname))?;
        commit
            .tree()
            .map_err(|e| GitError::from_git2(e, &refname))
    }

    // =========================================================================
    // Commits
    // =========================================================================

    /// Commit the named worktree paths onto the branch HEAD points to.
    ///
    /// This is a pathspec-limited commit: the new tree is the branch tip's
    /// tree with exactly the named paths upserted (file exists in the
    /// worktree) or removed (file absent). The index and the rest of the
    /// worktree play no part, which is what lets the store commit onto the
    /// hidden branch while the checkout stays on the user's branch.
    ///
    /// Paths are workdir-relative with `/` separators. Returns the new
    /// commit's hex id.
    ///
    /// # Errors
    ///
    /// - [`GitError::NothingToCommit`] if the tree would be unchanged, or a
    ///   path neither exists on disk nor in the branch tip
    /// - [`GitError::Internal`] if no author identity is configured
    pub fn stage_and_commit(&self, paths: &[&str], message: &str) -> Result<String, GitError> {
        let workdir = self.workdir()?.to_path_buf();

        // Tip of the branch HEAD points at; None while the branch is unborn.
        let parent = match self.repo.head() {
            Ok(head) => Some(
                head.peel_to_commit()
                    .map_err(|e| GitError::from_git2(e, "HEAD"))?,
            ),
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                None
            }
            Err(e) => return Err(GitError::from_git2(e, "HEAD")),
        };

        let base_tree = match &parent {
            Some(commit) => commit.tree().map_err(|e| GitError::from_git2(e, "HEAD"))?,
            None => {
                let oid = self
                    .repo
                    .treebuilder(None)
                    .and_then(|builder| builder.write())
                    .map_err(|e| GitError::from_git2(e, "empty tree"))?;
                self.repo
                    .find_tree(oid)
                    .map_err(|e| GitError::from_git2(e, "empty tree"))?
            }
        };

        let mut update = git2::build::TreeUpdateBuilder::new();
        for path in paths {
            let file = workdir.join(path);
            if file.is_file() {
                let content = std::fs::read(&file).map_err(|e| GitError::AccessError {
                    message: format!("{}: {e}", file.display()),
                })?;
                let blob = self
                    .repo
                    .blob(&content)
                    .map_err(|e| GitError::from_git2(e, path))?;
                update.upsert(*path, blob, git2::FileMode::Blob);
            } else if base_tree.get_path(Path::new(path)).is_ok() {
                update.remove(*path);
            } else {
                return Err(GitError::NothingToCommit);
            }
        }

        let tree_oid = update
            .create_updated(&self.repo, &base_tree)
            .map_err(|e| GitError::from_git2(e, "tree update"))?;
        if let Some(commit) = &parent {
            if commit.tree_id() == tree_oid {
                return Err(GitError::NothingToCommit);
            }
        }
        let tree = self
            .repo
            .find_tree(tree_oid)
            .map_err(|e| GitError::from_git2(e, "tree update"))?;

        let signature = self.repo.signature().map_err(|e| GitError::Internal {
            message: format!(
                "cannot determine author; set user.name and user.email: {}",
                e.message()
            ),
        })?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .map_err(|e| GitError::from_git2(e, "commit"))?;
        Ok(oid.to_string())
    }

    // =========================================================================
    // Index and Worktree Restoration
    // =========================================================================

    /// Reset the index entries under `path` to match the tip of `branch`.
    ///
    /// Other index entries are untouched. Equivalent to
    /// `git reset <branch> -- <path>`. An unborn branch has an empty tree,
    /// so resetting against it drops the entries.
    pub fn reset_index(&self, branch: &str, path: &str) -> Result<(), GitError> {
        let refname = format!("refs/heads/{branch}");
        match self.repo.revparse_single(&refname) {
            Ok(object) => self
                .repo
                .reset_default(Some(&object), [path])
                .map_err(|e| GitError::from_git2(e, path)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                let mut index = self
                    .repo
                    .index()
                    .map_err(|e| GitError::from_git2(e, path))?;
                index
                    .remove_all([path], None)
                    .and_then(|_| index.write())
                    .map_err(|e| GitError::from_git2(e, path))
            }
            Err(e) => Err(GitError::from_git2(e, &refname)),
        }
    }

    /// Make the worktree under `path` match HEAD exactly.
    ///
    /// Tracked files are restored; untracked leftovers under `path` are
    /// removed. Other paths are untouched. With an unborn HEAD the subtree
    /// simply goes away.
    pub fn restore_worktree(&self, path: &str) -> Result<(), GitError> {
        let unborn = matches!(
            self.repo.head(),
            Err(ref e) if e.code() == git2::ErrorCode::UnbornBranch
                || e.code() == git2::ErrorCode::NotFound
        );
        if unborn {
            let target = self.workdir()?.join(path);
            return match std::fs::remove_dir_all(&target) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(GitError::AccessError {
                    message: format!("{}: {e}", target.display()),
                }),
            };
        }

        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.force().remove_untracked(true).path(path);
        self.repo
            .checkout_head(Some(&mut checkout))
            .map_err(|e| GitError::from_git2(e, path))
    }

    // =========================================================================
    // Dirty-Tree Checks
    // =========================================================================

    /// Whether tracked files have unstaged modifications.
    ///
    /// Untracked files do not count, matching `git diff --quiet`.
    pub fn has_unstaged_changes(&self) -> Result<bool, GitError> {
        let statuses = self.statuses()?;
        Ok(statuses.iter().any(|entry| {
            let status = entry.status();
            status.is_wt_modified()
                || status.is_wt_deleted()
                || status.is_wt_renamed()
                || status.is_wt_typechange()
        }))
    }

    /// Whether the index differs from HEAD (staged but uncommitted changes).
    pub fn has_uncommitted_changes(&self) -> Result<bool, GitError> {
        let statuses = self.statuses()?;
        Ok(statuses.iter().any(|entry| {
            let status = entry.status();
            status.is_index_new()
                || status.is_index_modified()
                || status.is_index_deleted()
                || status.is_index_renamed()
                || status.is_index_typechange()
        }))
    }

    fn statuses(&self) -> Result<git2::Statuses<'_>, GitError> {
        let mut options = git2::StatusOptions::new();
        options.include_untracked(false).include_ignored(false);
        self.repo
            .statuses(Some(&mut options))
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })
    }

    // =========================================================================
    // Remotes
    // =========================================================================

    /// Get the default remote name (prefers "origin").
    ///
    /// Returns `None` if no remotes exist.
    pub fn default_remote(&self) -> Result<Option<String>, GitError> {
        let remotes = self.repo.remotes().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;

        for name in remotes.iter().flatten() {
            if name == "origin" {
                return Ok(Some(name.to_string()));
            }
        }
        Ok(remotes.iter().flatten().next().map(String::from))
    }

    /// Find a remote-tracking branch whose short name ends in `/{branch}`.
    pub fn find_remote_branch(&self, branch: &str) -> Result<Option<RemoteBranch>, GitError> {
        let suffix = format!("/{branch}");
        let branches = self
            .repo
            .branches(Some(git2::BranchType::Remote))
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;

        for item in branches {
            let (remote, _) = item.map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;
            let Some(name) = remote.name().ok().flatten() else {
                continue;
            };
            if name.ends_with(&suffix) {
                let oid = remote
                    .get()
                    .peel_to_commit()
                    .map_err(|e| GitError::from_git2(e, name))?
                    .id();
                return Ok(Some(RemoteBranch {
                    name: name.to_string(),
                    oid: oid.to_string(),
                }));
            }
        }
        Ok(None)
    }

    /// Create a local branch at a commit, optionally tracking a remote branch.
    pub fn create_branch(
        &self,
        branch: &str,
        oid: &str,
        upstream: Option<&str>,
    ) -> Result<(), GitError> {
        let commit_oid =
            git2::Oid::from_str(oid).map_err(|e| GitError::from_git2(e, oid))?;
        let commit = self
            .repo
            .find_commit(commit_oid)
            .map_err(|e| GitError::from_git2(e, oid))?;
        let mut created = self
            .repo
            .branch(branch, &commit, false)
            .map_err(|e| GitError::from_git2(e, branch))?;
        if let Some(upstream) = upstream {
            // Tracking setup is best-effort; the branch itself is what matters.
            let _ = created.set_upstream(Some(upstream));
        }
        Ok(())
    }

    /// Fetch one branch from a remote, updating its remote-tracking ref.
    pub fn fetch_branch(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        let refspec = format!("+refs/heads/{branch}:refs/remotes/{remote}/{branch}");
        let mut remote = self
            .repo
            .find_remote(remote)
            .map_err(|e| GitError::from_git2(e, remote))?;
        remote
            .fetch(&[&refspec], None, None)
            .map_err(|e| GitError::Internal {
                message: format!("fetch failed: {}", e.message()),
            })
    }

    /// Tip of a remote-tracking ref, if it exists.
    pub fn remote_branch_oid(
        &self,
        remote: &str,
        branch: &str,
    ) -> Result<Option<String>, GitError> {
        let refname = format!("refs/remotes/{remote}/{branch}");
        match self.repo.find_reference(&refname) {
            Ok(reference) => {
                let oid = reference
                    .peel_to_commit()
                    .map_err(|e| GitError::from_git2(e, &refname))?
                    .id();
                Ok(Some(oid.to_string()))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, &refname)),
        }
    }

    /// Fast-forward a local branch to a commit, creating it if missing.
    ///
    /// # Errors
    ///
    /// - [`GitError::NonFastForward`] if the branch has commits the target
    ///   doesn't
    pub fn fast_forward_branch(&self, branch: &str, to: &str) -> Result<FastForward, GitError> {
        let target =
            git2::Oid::from_str(to).map_err(|e| GitError::from_git2(e, to))?;
        let refname = format!("refs/heads/{branch}");

        let current = match self.repo.find_reference(&refname) {
            Ok(reference) => reference
                .peel_to_commit()
                .map_err(|e| GitError::from_git2(e, &refname))?
                .id(),
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                self.create_branch(branch, to, None)?;
                return Ok(FastForward::Created(to.to_string()));
            }
            Err(e) => return Err(GitError::from_git2(e, &refname)),
        };

        if current == target {
            return Ok(FastForward::UpToDate);
        }
        let is_ff = self
            .repo
            .graph_descendant_of(target, current)
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })?;
        if !is_ff {
            return Err(GitError::NonFastForward {
                branch: branch.to_string(),
            });
        }

        let mut reference = self
            .repo
            .find_reference(&refname)
            .map_err(|e| GitError::from_git2(e, &refname))?;
        reference
            .set_target(target, &format!("burrow: fast-forward {branch}"))
            .map_err(|e| GitError::from_git2(e, &refname))?;
        Ok(FastForward::Updated(to.to_string()))
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Read a config value, distinguishing "missing" from other failures.
    ///
    /// A missing section and a missing key within a present section both
    /// come back as `None`; git reports both as the key not being found,
    /// and callers react the same way to either.
    pub fn config_value(&self, key: &str) -> Result<Option<String>, GitError> {
        let config = self.repo.config().map_err(|e| GitError::Internal {
            message: e.message().to_string(),
        })?;
        match config.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::Internal {
                message: format!("{key}: {}", e.message()),
            }),
        }
    }
}

fn entry_kind(kind: Option<git2::ObjectType>) -> EntryKind {
    match kind {
        Some(git2::ObjectType::Blob) => EntryKind::Blob,
        Some(git2::ObjectType::Tree) => EntryKind::Tree,
        _ => EntryKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod git_error {
        use super::*;

        #[test]
        fn error_display_formatting() {
            let err = GitError::ObjectNotFound {
                spec: "burrow:tickets/.hold".to_string(),
            };
            assert!(err.to_string().contains("burrow:tickets/.hold"));

            let err = GitError::NonFastForward {
                branch: "burrow".to_string(),
            };
            assert!(err.to_string().contains("diverged"));
        }

        #[test]
        fn open_non_repository_fails() {
            let dir = std::env::temp_dir();
            // temp_dir itself is never a repository root in CI images, but a
            // parent might be; use a guaranteed-missing subpath instead.
            let missing = dir.join("definitely-not-a-repo-xyzzy");
            match Git::open(&missing) {
                Err(GitError::NotARepo { .. }) => {}
                other => panic!("expected NotARepo, got {:?}", other.map(|_| ())),
            }
        }
    }
}
