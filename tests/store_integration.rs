//! Integration tests for the ticket store.
//!
//! These tests use real git repositories created via tempfile to verify
//! the critical-section protocol end to end: the hidden branch advances,
//! and the user's branch, index, and working tree come back untouched.

use std::path::Path;
use std::process::Command;

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use burrow::core::ticket::{Ticket, UNASSIGNED, UNCATEGORIZED};
use burrow::core::types::{Priority, Status, TicketType, Weight};
use burrow::git::{Git, GitError};
use burrow::store::{
    AssignOutcome, InitOutcome, MoveOutcome, StoreError, TicketStore, TICKET_BRANCH,
};

/// Test fixture that creates a real git repository.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new test repository with an initial commit.
    fn new() -> Self {
        let repo = Self::empty();
        std::fs::write(repo.path().join("README.md"), "# Test Repo\n").unwrap();
        run_git(repo.path(), &["add", "README.md"]);
        run_git(repo.path(), &["commit", "-m", "Initial commit"]);
        repo
    }

    /// Create a repository with no commits at all (unborn HEAD).
    fn empty() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        run_git(dir.path(), &["init", "-b", "main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Open a Git interface to this repository.
    fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    /// Current branch per git itself.
    fn head_branch(&self) -> String {
        let output = Command::new("git")
            .args(["symbolic-ref", "--short", "HEAD"])
            .current_dir(self.path())
            .output()
            .expect("git symbolic-ref failed");
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    /// `git status --porcelain` output; empty means clean.
    fn status(&self) -> String {
        let output = Command::new("git")
            .args(["status", "--porcelain"])
            .current_dir(self.path())
            .output()
            .expect("git status failed");
        String::from_utf8(output.stdout).unwrap()
    }
}

/// Run a git command in the given directory.
fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

fn stamp(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn ticket(subject: &str, release: &str, priority: u8, day: u32) -> Ticket {
    Ticket::new(
        subject,
        "Test User <test@example.com>",
        TicketType::Issue,
        Priority::new(priority).unwrap(),
        Weight::new(3).unwrap(),
        release,
        "",
        stamp(day, 9),
    )
}

/// Initialize the store and return it alongside the repo handle.
fn init_store(git: &Git) -> TicketStore<'_> {
    let store = TicketStore::new(git);
    assert_eq!(store.init().unwrap(), InitOutcome::Created);
    store
}

// =============================================================================
// Initialization
// =============================================================================

#[test]
fn init_creates_hidden_branch_and_restores_head() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);

    assert!(store.exists(false).unwrap());
    assert!(git.branch_exists(TICKET_BRANCH));
    assert_eq!(repo.head_branch(), "main");
    assert_eq!(repo.status(), "");
    assert!(!repo.path().join("tickets").exists());
}

#[test]
fn init_is_idempotent() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);

    assert_eq!(store.init().unwrap(), InitOutcome::AlreadyInitialized);
}

#[test]
fn init_works_on_unborn_head() {
    let repo = TestRepo::empty();
    let git = repo.git();
    let store = init_store(&git);

    assert!(store.exists(false).unwrap());
    // The user's branch still has no commits.
    assert_eq!(repo.head_branch(), "main");
    assert_eq!(repo.status(), "");
}

#[test]
fn operations_before_init_fail() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = TicketStore::new(&git);

    assert!(matches!(
        store.list(&Status::DEFAULT_FILTER, &[], None),
        Err(StoreError::NotInitialized)
    ));
    assert!(matches!(
        store.create(ticket("x", UNCATEGORIZED, 2, 1)),
        Err(StoreError::NotInitialized)
    ));
}

// =============================================================================
// Create and Lookup
// =============================================================================

#[test]
fn create_then_get_round_trips() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);

    let created = store.create(ticket("fix the frobnicator", "1.0", 1, 2)).unwrap();
    assert_eq!(created.id.len(), 64);

    let located = store.get(&created.id[..7]).unwrap();
    assert_eq!(located.ticket, created);
    assert_eq!(located.ticket.release, "1.0");
    assert_eq!(located.ticket.status, Status::Open);
    assert_eq!(located.ticket.assigned_to, UNASSIGNED);

    // Nothing leaked into the user's checkout.
    assert_eq!(repo.head_branch(), "main");
    assert_eq!(repo.status(), "");
    assert!(!repo.path().join("tickets").exists());
}

#[test]
fn unknown_prefix_is_not_found() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);
    store.create(ticket("a", UNCATEGORIZED, 2, 1)).unwrap();

    assert!(matches!(
        store.get("zzzzzzz"),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn short_prefix_matching_many_is_ambiguous() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);
    store.create(ticket("a", UNCATEGORIZED, 2, 1)).unwrap();
    store.create(ticket("b", "1.0", 2, 2)).unwrap();

    // The empty prefix matches every ticket.
    match store.get("") {
        Err(StoreError::AmbiguousMatch { matches, .. }) => assert_eq!(matches.len(), 2),
        other => panic!("expected AmbiguousMatch, got {other:?}"),
    }
}

#[test]
fn creating_an_identical_ticket_is_a_duplicate() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);

    store.create(ticket("same", "1.0", 2, 1)).unwrap();
    assert!(matches!(
        store.create(ticket("same", "1.0", 2, 1)),
        Err(StoreError::Duplicate { .. })
    ));
}

#[test]
fn dirty_working_tree_aborts_before_any_commit() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);

    std::fs::write(repo.path().join("README.md"), "# changed\n").unwrap();
    assert!(matches!(
        store.create(ticket("x", "1.0", 2, 1)),
        Err(StoreError::DirtyWorkingTree { .. })
    ));

    // The user's edit survives and HEAD never moved.
    assert_eq!(repo.head_branch(), "main");
    let readme = std::fs::read_to_string(repo.path().join("README.md")).unwrap();
    assert_eq!(readme, "# changed\n");
}

#[test]
fn path_like_release_label_is_rejected_without_residue() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);

    assert!(matches!(
        store.create(ticket("escape", "../evil", 2, 1)),
        Err(StoreError::InvalidRelease { .. })
    ));
    // Nothing escaped the ticket root into the user's checkout.
    assert!(!repo.path().join("evil").exists());

    let created = store.create(ticket("movable", "1.0", 2, 1)).unwrap();
    assert!(matches!(
        store.move_ticket(&created.id[..7], "nested/label"),
        Err(StoreError::InvalidRelease { .. })
    ));
    assert_eq!(repo.head_branch(), "main");
    assert_eq!(repo.status(), "");
}

#[test]
fn failed_commit_inside_the_section_still_restores() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);
    let created = store.create(ticket("unchanged", "1.0", 2, 1)).unwrap();

    // A byte-identical re-encode makes the commit step fail after HEAD has
    // already moved to the hidden branch.
    let stored = store.get(&created.id[..7]).unwrap().ticket;
    match store.update(&stored) {
        Err(StoreError::Git(GitError::NothingToCommit)) => {}
        other => panic!("expected NothingToCommit, got {other:?}"),
    }

    assert_eq!(repo.head_branch(), "main");
    assert_eq!(repo.status(), "");
    assert!(!repo.path().join("tickets").exists());
}

// =============================================================================
// Moving
// =============================================================================

#[test]
fn move_relocates_and_leaves_no_stale_copy() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);
    let created = store.create(ticket("movable", "1.0", 2, 1)).unwrap();

    let outcome = store.move_ticket(&created.id[..7], "2.0").unwrap();
    assert!(matches!(outcome, MoveOutcome::Moved { .. }));

    let located = store.get(&created.id[..7]).unwrap();
    assert_eq!(located.ticket.release, "2.0");
    assert_eq!(located.path, format!("2.0/{}", created.id));

    // The old release directory holds nothing anymore.
    let listing = store.list(&Status::DEFAULT_FILTER, &[], None).unwrap();
    let names: Vec<&str> = listing
        .releases
        .iter()
        .filter(|r| !r.tickets.is_empty())
        .map(|r| r.release.as_str())
        .collect();
    assert_eq!(names, ["2.0"]);
    assert_eq!(repo.status(), "");
}

#[test]
fn move_to_same_release_commits_nothing() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);
    let created = store.create(ticket("stay", "1.0", 2, 1)).unwrap();

    let unchanged = store.get(&created.id[..7]).unwrap().ticket;
    let outcome = store.move_ticket(&created.id[..7], "1.0").unwrap();
    assert!(matches!(outcome, MoveOutcome::SameRelease { .. }));
    assert_eq!(store.get(&created.id[..7]).unwrap().ticket, unchanged);
}

// =============================================================================
// Status Workflow
// =============================================================================

#[test]
fn finish_and_reopen_cycle() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);
    let created = store.create(ticket("cycle", "1.0", 2, 1)).unwrap();
    let prefix = &created.id[..7];

    let fixed = store.set_status(prefix, Status::Fixed).unwrap();
    assert_eq!(fixed.status, Status::Fixed);
    assert!(fixed.last_modified >= fixed.created);

    // Redundant change is reported.
    assert!(matches!(
        store.set_status(prefix, Status::Fixed),
        Err(StoreError::AlreadyInStatus { .. })
    ));
    // Finished tickets only move through reopen.
    assert!(matches!(
        store.set_status(prefix, Status::Closed),
        Err(StoreError::InvalidTransition { .. })
    ));

    let reopened = store.reopen(prefix).unwrap();
    assert_eq!(reopened.status, Status::Open);
    assert!(matches!(
        store.reopen(prefix),
        Err(StoreError::AlreadyInStatus { .. })
    ));
}

#[test]
fn test_status_counts_as_active() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);
    let created = store.create(ticket("testable", "1.0", 2, 1)).unwrap();
    let prefix = &created.id[..7];

    store.set_status(prefix, Status::Test).unwrap();
    let closed = store.set_status(prefix, Status::Closed).unwrap();
    assert_eq!(closed.status, Status::Closed);
}

// =============================================================================
// Ownership
// =============================================================================

#[test]
fn assign_and_unassign() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);
    let created = store.create(ticket("owned", "1.0", 2, 1)).unwrap();
    let prefix = &created.id[..7];

    match store.assign(prefix, "Ada Lovelace").unwrap() {
        AssignOutcome::Updated(t) => assert_eq!(t.assigned_to, "Ada Lovelace"),
        other => panic!("expected Updated, got {other:?}"),
    }
    assert!(matches!(
        store.assign(prefix, "Ada Lovelace").unwrap(),
        AssignOutcome::Unchanged(_)
    ));

    assert!(matches!(
        store.unassign(prefix).unwrap(),
        AssignOutcome::Updated(_)
    ));
    assert_eq!(store.get(prefix).unwrap().ticket.assigned_to, UNASSIGNED);
    assert!(matches!(
        store.unassign(prefix).unwrap(),
        AssignOutcome::Unchanged(_)
    ));
}

// =============================================================================
// Removal
// =============================================================================

#[test]
fn remove_deletes_for_good() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);
    let created = store.create(ticket("doomed", "1.0", 2, 1)).unwrap();

    store.remove(&created.id[..7]).unwrap();
    assert!(matches!(
        store.get(&created.id[..7]),
        Err(StoreError::NotFound { .. })
    ));
    assert_eq!(repo.status(), "");
}

// =============================================================================
// Listing
// =============================================================================

#[test]
fn listing_orders_releases_and_tickets() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);

    store.create(ticket("uncategorized", UNCATEGORIZED, 2, 1)).unwrap();
    store.create(ticket("older high", "1.9", 1, 1)).unwrap();
    store.create(ticket("newer high", "1.9", 1, 2)).unwrap();
    store.create(ticket("low", "1.9", 3, 1)).unwrap();
    store.create(ticket("future", "2.10", 2, 1)).unwrap();
    store.create(ticket("near", "2.1", 2, 1)).unwrap();

    let listing = store.list(&Status::DEFAULT_FILTER, &[], None).unwrap();
    let names: Vec<&str> = listing.releases.iter().map(|r| r.release.as_str()).collect();
    // Uncategorized first, then numeric-aware descending.
    assert_eq!(names, [UNCATEGORIZED, "2.10", "2.1", "1.9"]);

    let subjects: Vec<&str> = listing.releases[3]
        .tickets
        .iter()
        .map(|t| t.subject.as_str())
        .collect();
    assert_eq!(subjects, ["older high", "newer high", "low"]);
}

#[test]
fn progress_counts_finished_weight() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);

    let done = store.create(ticket("done", "1.0", 2, 1)).unwrap();
    store.create(ticket("todo", "1.0", 2, 2)).unwrap();
    store.set_status(&done.id[..7], Status::Fixed).unwrap();

    let listing = store.list(&Status::DEFAULT_FILTER, &[], None).unwrap();
    let release = &listing.releases[0];
    assert_eq!(release.release, "1.0");
    assert_eq!(release.progress, Some(0.5));
    // The fixed ticket fell out of the default filter but still counted.
    assert_eq!(release.tickets.len(), 1);
}

#[test]
fn release_filter_narrows_the_listing() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);
    store.create(ticket("in", "1.0", 2, 1)).unwrap();
    store.create(ticket("out", "2.0", 2, 1)).unwrap();

    let listing = store
        .list(&Status::DEFAULT_FILTER, &["1.0".to_string()], None)
        .unwrap();
    assert_eq!(listing.releases.len(), 1);
    assert_eq!(listing.releases[0].release, "1.0");
}

#[test]
fn inbox_collects_open_tickets_for_the_user() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);

    let mine = store.create(ticket("mine", "1.0", 2, 1)).unwrap();
    let testing = store.create(ticket("mine in test", "2.0", 2, 2)).unwrap();
    store.create(ticket("not mine", "1.0", 2, 3)).unwrap();
    store.assign(&mine.id[..7], "Test User").unwrap();
    store.assign(&testing.id[..7], "Test User").unwrap();
    store.set_status(&testing.id[..7], Status::Test).unwrap();

    // Default filter narrows the inbox to open tickets only.
    let listing = store
        .list(&Status::DEFAULT_FILTER, &[], Some("Test User"))
        .unwrap();
    let subjects: Vec<&str> = listing.inbox.iter().map(|t| t.subject.as_str()).collect();
    assert_eq!(subjects, ["mine"]);

    // An explicit wider filter keeps the test ticket in the inbox.
    let listing = store
        .list(
            &[Status::Open, Status::Test, Status::Fixed],
            &[],
            Some("Test User"),
        )
        .unwrap();
    assert_eq!(listing.inbox.len(), 2);
}

// =============================================================================
// Sync
// =============================================================================

#[test]
fn sync_without_a_remote_fails_cleanly() {
    let repo = TestRepo::new();
    let git = repo.git();
    let store = init_store(&git);

    assert!(matches!(store.sync(), Err(StoreError::NoRemote)));
}

#[test]
fn sync_fast_forwards_from_a_remote() {
    let upstream = TestRepo::new();
    let upstream_git = upstream.git();
    let upstream_store = init_store(&upstream_git);
    upstream_store.create(ticket("shared", "1.0", 2, 1)).unwrap();

    let clone = TestRepo::new();
    run_git(
        clone.path(),
        &["remote", "add", "origin", &upstream.path().display().to_string()],
    );
    let git = clone.git();
    let store = TicketStore::new(&git);

    store.sync().unwrap();
    assert!(store.exists(false).unwrap());
    let listing = store.list(&Status::DEFAULT_FILTER, &[], None).unwrap();
    assert_eq!(listing.row_count(), 1);

    // A second sync with nothing new is a no-op.
    assert_eq!(store.sync().unwrap(), burrow::git::FastForward::UpToDate);
}
