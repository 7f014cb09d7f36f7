//! core::config
//!
//! Author identity and editor resolution from the repository's git config.
//!
//! Burrow keeps no configuration of its own: the author of a ticket is
//! whoever git says it is, and the editor is whatever git (or the
//! environment) is already set up to use.

use thiserror::Error;

use crate::git::{Git, GitError};

/// Errors from configuration lookups.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "author name not set; use `git config [--global] user.name \"John Smith\"` to set it"
    )]
    MissingName,

    #[error(
        "email address not set; use `git config [--global] user.email \"john@smith.org\"` to set it"
    )]
    MissingEmail,

    #[error(transparent)]
    Git(#[from] GitError),
}

/// The configured author of new tickets and owner of the inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    /// Read `user.name` / `user.email` from the repository config.
    ///
    /// # Errors
    ///
    /// Names the missing key, with the `git config` invocation to fix it.
    pub fn from_repo(git: &Git) -> Result<Self, ConfigError> {
        let name = git
            .config_value("user.name")?
            .ok_or(ConfigError::MissingName)?;
        let email = git
            .config_value("user.email")?
            .ok_or(ConfigError::MissingEmail)?;
        Ok(Identity { name, email })
    }

    /// The `Name <email>` form written into the `Issuer` field.
    pub fn issuer(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}

/// Resolve the editor to use for `bur edit`.
///
/// Order: `core.editor`, then `$EDITOR`, then `vi`.
pub fn editor(git: &Git) -> Result<String, GitError> {
    if let Some(editor) = git.config_value("core.editor")? {
        return Ok(editor);
    }
    if let Ok(editor) = std::env::var("EDITOR") {
        if !editor.trim().is_empty() {
            return Ok(editor);
        }
    }
    Ok("vi".to_string())
}
