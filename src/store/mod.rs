//! store
//!
//! The ticket repository: domain-level operations over the hidden branch.
//!
//! # Modules
//!
//! - [`section`] - The critical-section protocol (HEAD repoint + restore)
//!
//! # Layout
//!
//! The store lives entirely on the hidden branch [`TICKET_BRANCH`]. Its tip
//! tree holds one directory per release under [`TICKET_DIR`], one file per
//! ticket (named by the ticket's id), plus a sentinel [`HOLD_FILE`] whose
//! only job is to keep an otherwise-empty tree reachable. The store exists
//! when the branch exists and the hold file is present in its committed
//! tree.
//!
//! Every mutation is one commit on the hidden branch, performed inside a
//! [`section::CriticalSection`] so the user's checkout never visibly moves.

pub mod section;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::core::report::{self, Listing, ReleaseRows};
use crate::core::ticket::{short_id, PathOverrides, Ticket, TicketError, UNASSIGNED};
use crate::core::types::Status;
use crate::git::{EntryKind, FastForward, Git, GitError};
use section::CriticalSection;

/// The hidden branch holding the ticket database.
pub const TICKET_BRANCH: &str = "burrow";

/// Subtree under the hidden branch where all records live.
pub const TICKET_DIR: &str = "tickets";

/// Sentinel file that keeps the ticket root reachable when empty.
pub const HOLD_FILE: &str = ".hold";

const HOLD_CONTENT: &str = "This is merely a placeholder file that keeps the ticket \
                            directory from\nbeing pruned by git.\n";

/// Errors from ticket repository operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ticket database not initialized; run 'bur init' first")]
    NotInitialized,

    #[error("working tree has {details}; aborting")]
    DirtyWorkingTree { details: String },

    #[error("no ticket matches '{prefix}'")]
    NotFound { prefix: String },

    #[error("ambiguous match for '{prefix}'; matching tickets: {ids}", ids = .matches.join(", "))]
    AmbiguousMatch {
        prefix: String,
        matches: Vec<String>,
    },

    #[error("ticket '{id}' already {status}")]
    AlreadyInStatus { id: String, status: Status },

    #[error("ticket '{id}' is {status}; only open or test tickets can be finished")]
    InvalidTransition { id: String, status: Status },

    #[error("a ticket with id {id} already exists")]
    Duplicate { id: String },

    #[error("invalid release label '{release}'; labels cannot be empty, '.', '..', or contain path separators")]
    InvalidRelease { release: String },

    #[error("could not move ticket '{id}' to '{release}'")]
    Move {
        id: String,
        release: String,
        #[source]
        source: Box<StoreError>,
    },

    #[error("no remote configured")]
    NoRemote,

    #[error(transparent)]
    Ticket(#[from] TicketError),

    #[error(transparent)]
    Git(#[from] GitError),
}

/// Outcome of [`TicketStore::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// Branch and hold file were already in place; nothing committed.
    AlreadyInitialized,
    /// A remote carried the hidden branch; a local tracking branch now
    /// points at it.
    TrackedRemote { remote_ref: String },
    /// A fresh, empty database was committed.
    Created,
}

/// Outcome of [`TicketStore::move_ticket`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { id: String, release: String },
    /// The ticket was already in the requested release; nothing committed.
    SameRelease { id: String, release: String },
}

/// Outcome of [`TicketStore::assign`] / [`TicketStore::unassign`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    Updated(Ticket),
    /// Already in the requested state; nothing committed.
    Unchanged(Ticket),
}

/// A ticket resolved from a prefix, with its storage location.
#[derive(Debug, Clone)]
pub struct Located {
    pub ticket: Ticket,
    /// Store-relative path, `<release>/<id>`.
    pub path: String,
}

/// The ticket repository.
///
/// All reads go straight to the hidden branch's committed tree; all writes
/// go through the critical section. The store holds an explicit repository
/// handle; there is no ambient global repository.
pub struct TicketStore<'a> {
    git: &'a Git,
}

impl<'a> TicketStore<'a> {
    pub fn new(git: &'a Git) -> Self {
        TicketStore { git }
    }

    // =========================================================================
    // Existence and Initialization
    // =========================================================================

    /// Whether the ticket database exists: hidden branch present and the
    /// hold file committed under the ticket root.
    pub fn exists(&self, include_remotes: bool) -> Result<bool, StoreError> {
        if self.git.branch_exists(TICKET_BRANCH) {
            return match self.git.read_object(TICKET_BRANCH, &hold_path()) {
                Ok(_) => Ok(true),
                Err(GitError::ObjectNotFound { .. }) | Err(GitError::RefNotFound { .. }) => {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            };
        }
        if include_remotes {
            return Ok(self.git.find_remote_branch(TICKET_BRANCH)?.is_some());
        }
        Ok(false)
    }

    /// Fail fast when the database is missing.
    pub fn require_exists(&self) -> Result<(), StoreError> {
        if self.exists(false)? {
            Ok(())
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    /// Initialize the ticket database. Idempotent.
    ///
    /// Already initialized: no-op. A remote carries the hidden branch: adopt
    /// it as a local tracking branch. Otherwise bootstrap a fresh database
    /// by committing the hold file; the file lives on in the branch's tree
    /// only, never in the user's working tree.
    pub fn init(&self) -> Result<InitOutcome, StoreError> {
        if self.exists(false)? {
            return Ok(InitOutcome::AlreadyInitialized);
        }

        if let Some(remote) = self.git.find_remote_branch(TICKET_BRANCH)? {
            self.git
                .create_branch(TICKET_BRANCH, &remote.oid, Some(&remote.name))?;
            return Ok(InitOutcome::TrackedRemote {
                remote_ref: remote.name,
            });
        }

        let section = CriticalSection::enter(self.git, TICKET_BRANCH)?;
        self.write_worktree_file(&hold_path(), HOLD_CONTENT)?;
        section.commit(&[&hold_path()], "Initialized empty ticket database.")?;
        section.finish()?;
        Ok(InitOutcome::Created)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Find the unique stored record whose id starts with `prefix`.
    ///
    /// Returns the store-relative path `<release>/<id>`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] for zero matches
    /// - [`StoreError::AmbiguousMatch`] enumerating the ids for two or more
    pub fn find_by_prefix(&self, prefix: &str) -> Result<String, StoreError> {
        self.require_exists()?;

        let entries = self.git.list_tree(TICKET_BRANCH, TICKET_DIR, true)?;
        let mut matches: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.kind == EntryKind::Blob)
            .filter(|entry| {
                let basename = entry.path.rsplit('/').next().unwrap_or(&entry.path);
                basename != HOLD_FILE && basename.starts_with(prefix)
            })
            .map(|entry| entry.path)
            .collect();

        match matches.len() {
            0 => Err(StoreError::NotFound {
                prefix: prefix.to_string(),
            }),
            1 => Ok(matches.remove(0)),
            _ => {
                matches.sort();
                Err(StoreError::AmbiguousMatch {
                    prefix: prefix.to_string(),
                    matches: matches
                        .iter()
                        .map(|path| path.rsplit('/').next().unwrap_or(path).to_string())
                        .collect(),
                })
            }
        }
    }

    /// Resolve a prefix to the stored ticket and its location.
    pub fn get(&self, prefix: &str) -> Result<Located, StoreError> {
        let path = self.find_by_prefix(prefix)?;
        let (release, id) = split_store_path(&path);
        let text = self
            .git
            .read_object_string(TICKET_BRANCH, &format!("{TICKET_DIR}/{path}"))?;
        let ticket = Ticket::decode(
            &text,
            PathOverrides {
                id: Some(id),
                release: Some(release),
            },
        )?;
        Ok(Located { ticket, path })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Store a new ticket. Returns the stored record.
    ///
    /// Assigns a content-derived id when the caller left it empty. A ticket
    /// whose id already exists is a collision and is reported, not hidden.
    pub fn create(&self, mut ticket: Ticket) -> Result<Ticket, StoreError> {
        self.require_exists()?;
        validate_release(&ticket.release)?;

        if ticket.id.is_empty() {
            ticket.id = ticket.content_id();
        }
        match self.find_by_prefix(&ticket.id) {
            Ok(_) => {
                return Err(StoreError::Duplicate {
                    id: short_id(&ticket.id).to_string(),
                })
            }
            Err(StoreError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let path = worktree_path(&ticket.release, &ticket.id);
        let message = format!(
            "{} added ticket '{}'",
            ticket.issuer,
            short_id(&ticket.id)
        );
        let section = CriticalSection::enter(self.git, TICKET_BRANCH)?;
        self.write_worktree_file(&path, &ticket.encode())?;
        section.commit(&[&path], &message)?;
        section.finish()?;
        Ok(ticket)
    }

    /// Re-serialize and commit a ticket in place at its existing path.
    pub fn update(&self, ticket: &Ticket) -> Result<(), StoreError> {
        self.require_exists()?;
        let message = format!("ticket '{}' edited", short_id(&ticket.id));
        self.commit_in_place(ticket, &message)
    }

    /// Move a ticket to another release.
    ///
    /// A single commit writes the record under the new release directory and
    /// deletes the old file. Failure is wrapped in [`StoreError::Move`]; the
    /// store stays in its pre-move committed state either way.
    pub fn move_ticket(&self, prefix: &str, new_release: &str) -> Result<MoveOutcome, StoreError> {
        self.require_exists()?;
        validate_release(new_release)?;
        let located = self.get(prefix)?;
        let id = short_id(&located.ticket.id).to_string();

        if located.ticket.release == new_release {
            return Ok(MoveOutcome::SameRelease {
                id,
                release: new_release.to_string(),
            });
        }

        self.commit_move(&located, new_release)
            .map_err(|source| StoreError::Move {
                id: id.clone(),
                release: new_release.to_string(),
                source: Box::new(source),
            })?;
        Ok(MoveOutcome::Moved {
            id,
            release: new_release.to_string(),
        })
    }

    fn commit_move(&self, located: &Located, new_release: &str) -> Result<(), StoreError> {
        let mut ticket = located.ticket.clone();
        let old_release = std::mem::replace(&mut ticket.release, new_release.to_string());
        ticket.last_modified = now();

        let old_path = format!("{TICKET_DIR}/{}", located.path);
        let new_path = worktree_path(new_release, &ticket.id);
        let message = format!(
            "moved ticket '{}' ({} --> {})",
            short_id(&ticket.id),
            old_release,
            new_release
        );

        let section = CriticalSection::enter(self.git, TICKET_BRANCH)?;
        self.write_worktree_file(&new_path, &ticket.encode())?;
        section.commit(&[old_path.as_str(), new_path.as_str()], &message)?;
        section.finish()?;
        Ok(())
    }

    /// Finish a ticket: move it out of the active workflow.
    ///
    /// Only open or test tickets can be finished.
    ///
    /// # Errors
    ///
    /// - [`StoreError::AlreadyInStatus`] if the change is redundant
    /// - [`StoreError::InvalidTransition`] from fixed/closed/rejected
    pub fn set_status(&self, prefix: &str, new_status: Status) -> Result<Ticket, StoreError> {
        self.require_exists()?;
        let located = self.get(prefix)?;
        let mut ticket = located.ticket;
        let id = short_id(&ticket.id).to_string();

        if ticket.status == new_status {
            return Err(StoreError::AlreadyInStatus {
                id,
                status: ticket.status,
            });
        }
        if !ticket.status.is_active() {
            return Err(StoreError::InvalidTransition {
                id,
                status: ticket.status,
            });
        }

        ticket.status = new_status;
        ticket.last_modified = now();
        let message = format!("ticket '{id}' marked {new_status}");
        self.commit_in_place(&ticket, &message)?;
        Ok(ticket)
    }

    /// Reopen a finished ticket.
    ///
    /// # Errors
    ///
    /// - [`StoreError::AlreadyInStatus`] if the ticket is already open
    pub fn reopen(&self, prefix: &str) -> Result<Ticket, StoreError> {
        self.require_exists()?;
        let located = self.get(prefix)?;
        let mut ticket = located.ticket;
        let id = short_id(&ticket.id).to_string();

        if ticket.status == Status::Open {
            return Err(StoreError::AlreadyInStatus {
                id,
                status: Status::Open,
            });
        }

        ticket.status = Status::Open;
        ticket.last_modified = now();
        let message = format!("ticket '{id}' reopened");
        self.commit_in_place(&ticket, &message)?;
        Ok(ticket)
    }

    /// Hand a ticket to `owner`.
    pub fn assign(&self, prefix: &str, owner: &str) -> Result<AssignOutcome, StoreError> {
        self.require_exists()?;
        let located = self.get(prefix)?;
        let mut ticket = located.ticket;

        if ticket.assigned_to == owner {
            return Ok(AssignOutcome::Unchanged(ticket));
        }

        ticket.assigned_to = owner.to_string();
        ticket.last_modified = now();
        let message = format!(
            "ticket {} taken by \"{owner}\"",
            short_id(&ticket.id)
        );
        self.commit_in_place(&ticket, &message)?;
        Ok(AssignOutcome::Updated(ticket))
    }

    /// Clear a ticket's owner.
    pub fn unassign(&self, prefix: &str) -> Result<AssignOutcome, StoreError> {
        self.require_exists()?;
        let located = self.get(prefix)?;
        let mut ticket = located.ticket;

        if ticket.assigned_to == UNASSIGNED {
            return Ok(AssignOutcome::Unchanged(ticket));
        }

        let owner = std::mem::replace(&mut ticket.assigned_to, UNASSIGNED.to_string());
        ticket.last_modified = now();
        let message = format!(
            "ticket {} was left alone from \"{owner}\"",
            short_id(&ticket.id)
        );
        self.commit_in_place(&ticket, &message)?;
        Ok(AssignOutcome::Updated(ticket))
    }

    /// Permanently delete a ticket's backing object and commit the deletion.
    ///
    /// Confirmation is the caller's responsibility; the store does not
    /// prompt.
    pub fn remove(&self, prefix: &str) -> Result<String, StoreError> {
        self.require_exists()?;
        let path = self.find_by_prefix(prefix)?;
        let (_, id) = split_store_path(&path);
        let id = id.to_string();

        let message = format!("removed ticket '{}'", short_id(&id));
        let section = CriticalSection::enter(self.git, TICKET_BRANCH)?;
        section.commit(&[&format!("{TICKET_DIR}/{path}")], &message)?;
        section.finish()?;
        Ok(id)
    }

    /// Commit an existing ticket at its canonical path.
    fn commit_in_place(&self, ticket: &Ticket, message: &str) -> Result<(), StoreError> {
        let path = worktree_path(&ticket.release, &ticket.id);
        let section = CriticalSection::enter(self.git, TICKET_BRANCH)?;
        self.write_worktree_file(&path, &ticket.encode())?;
        section.commit(&[&path], message)?;
        section.finish()?;
        Ok(())
    }

    /// Write a file under the workdir, creating parent directories.
    fn write_worktree_file(&self, rel: &str, content: &str) -> Result<(), StoreError> {
        let file = self.git.workdir()?.join(rel);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GitError::AccessError {
                message: format!("{}: {e}", parent.display()),
            })?;
        }
        std::fs::write(&file, content).map_err(|e| {
            GitError::AccessError {
                message: format!("{}: {e}", file.display()),
            }
            .into()
        })
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Build the grouped listing.
    ///
    /// Releases are enumerated in display order (uncategorized first, then
    /// descending version order), each filtered by `status_filter` and
    /// sorted by priority then creation time. Progress is computed over the
    /// whole release, before filtering. `current_user` collects an inbox of
    /// tickets assigned to them across all releases, narrowed to open
    /// tickets when `status_filter` is the default open/test set.
    pub fn list(
        &self,
        status_filter: &[Status],
        release_filter: &[String],
        current_user: Option<&str>,
    ) -> Result<Listing, StoreError> {
        self.require_exists()?;

        let mut release_names: Vec<String> = self
            .git
            .list_tree(TICKET_BRANCH, TICKET_DIR, false)?
            .into_iter()
            .filter(|entry| entry.kind == EntryKind::Tree)
            .map(|entry| entry.path)
            .filter(|name| release_filter.is_empty() || release_filter.contains(name))
            .collect();
        release_names.sort_by(|a, b| report::compare_releases(a, b));

        let inbox_statuses = report::inbox_filter(status_filter);
        let mut releases = Vec::with_capacity(release_names.len());
        let mut inbox = Vec::new();

        for release in release_names {
            let mut tickets = self.read_release(&release)?;
            let progress = report::progress(&tickets);

            if let Some(user) = current_user {
                inbox.extend(
                    tickets
                        .iter()
                        .filter(|t| t.is_assigned_to(user))
                        .filter(|t| inbox_statuses.contains(&t.status))
                        .cloned(),
                );
            }

            tickets.retain(|t| status_filter.contains(&t.status));
            report::sort_tickets(&mut tickets);
            releases.push(ReleaseRows {
                release,
                progress,
                tickets,
            });
        }

        report::sort_tickets(&mut inbox);
        Ok(Listing { releases, inbox })
    }

    /// Decode every ticket in one release directory.
    fn read_release(&self, release: &str) -> Result<Vec<Ticket>, StoreError> {
        let entries = self
            .git
            .list_tree(TICKET_BRANCH, &format!("{TICKET_DIR}/{release}"), false)?;

        let mut tickets = Vec::new();
        for entry in entries {
            if entry.kind != EntryKind::Blob || entry.path == HOLD_FILE {
                continue;
            }
            let text = self.git.read_object_string(
                TICKET_BRANCH,
                &format!("{TICKET_DIR}/{release}/{}", entry.path),
            )?;
            tickets.push(Ticket::decode(
                &text,
                PathOverrides {
                    id: Some(&entry.path),
                    release: Some(release),
                },
            )?);
        }
        Ok(tickets)
    }

    // =========================================================================
    // Sync
    // =========================================================================

    /// Fetch the hidden branch from the default remote and fast-forward the
    /// local ref. The working tree is never touched.
    pub fn sync(&self) -> Result<FastForward, StoreError> {
        let remote = self.git.default_remote()?.ok_or(StoreError::NoRemote)?;
        self.git.fetch_branch(&remote, TICKET_BRANCH)?;
        let oid = self
            .git
            .remote_branch_oid(&remote, TICKET_BRANCH)?
            .ok_or(GitError::RefNotFound {
                refname: format!("refs/remotes/{remote}/{TICKET_BRANCH}"),
            })?;
        Ok(self.git.fast_forward_branch(TICKET_BRANCH, &oid)?)
    }
}

/// Current wall-clock time, truncated to whole seconds for stable encoding.
pub fn now() -> NaiveDateTime {
    use chrono::{Local, Timelike};
    Local::now().naive_local().with_nanosecond(0).unwrap_or_else(|| Local::now().naive_local())
}

/// Reject labels that would escape the ticket root when joined into a path.
///
/// A release must be exactly one path component: ticket files live at
/// `tickets/<release>/<id>`, and a label like `../x` would place the
/// worktree file outside the subtree that restoration scrubs.
fn validate_release(release: &str) -> Result<(), StoreError> {
    let invalid = release.is_empty()
        || release == "."
        || release == ".."
        || release.contains('/')
        || release.contains('\\');
    if invalid {
        return Err(StoreError::InvalidRelease {
            release: release.to_string(),
        });
    }
    Ok(())
}

fn hold_path() -> String {
    format!("{TICKET_DIR}/{HOLD_FILE}")
}

/// Workdir-relative path of a ticket file.
fn worktree_path(release: &str, id: &str) -> String {
    format!("{TICKET_DIR}/{release}/{id}")
}

/// Split a store-relative path into `(release, id)`.
fn split_store_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((release, id)) => (release, id),
        None => (crate::core::ticket::UNCATEGORIZED, path),
    }
}
