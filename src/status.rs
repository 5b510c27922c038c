//! The status record left in the repository after every run.
//!
//! Plain `Key: value` lines, overwritten each time:
//!
//! ```text
//! Status: SUCCESS
//! Timestamp: 2026-10-18T09:12:44.118200
//! Repository Changed: Yes
//! Submodule Updates: libs/core
//! Current Commit:
//! 3f1c... (main)
//! Bump core
//! ```

use crate::constants::{DETACHED_LABEL, GIT_DIR};
use crate::git;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::path::Path;

/// Whether the run changed the repository, and whether a stash was left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoChange {
    No,
    Yes,
    /// Remote changes landed while local changes stayed stashed.
    YesWithStash,
}

impl RepoChange {
    #[must_use]
    pub fn from_flags(repo_changed: bool, stashed: bool) -> Self {
        match (repo_changed, stashed) {
            (false, _) => RepoChange::No,
            (true, false) => RepoChange::Yes,
            (true, true) => RepoChange::YesWithStash,
        }
    }

    fn label(self) -> &'static str {
        match self {
            RepoChange::No => "No",
            RepoChange::Yes => "Yes",
            RepoChange::YesWithStash => "Yes (with stashes)",
        }
    }
}

/// HEAD of the repository at the time the status is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub hash: String,
    /// `None` when HEAD is detached.
    pub branch: Option<String>,
    pub subject: String,
}

impl CommitInfo {
    /// Reads HEAD metadata. Any failure yields `None` and the status record
    /// simply omits the commit block.
    pub fn read(repo: &Path) -> Option<Self> {
        if !repo.join(GIT_DIR).exists() {
            return None;
        }
        let hash = git::get_current_commit(repo).ok()?;
        let branch = git::get_current_branch(repo).ok()?;
        let subject = git::get_commit_subject(repo).ok()?;
        Some(Self {
            hash,
            branch,
            subject,
        })
    }

    #[must_use]
    pub fn branch_label(&self) -> &str {
        self.branch.as_deref().unwrap_or(DETACHED_LABEL)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    Success {
        change: RepoChange,
        submodule_updates: Vec<String>,
    },
    Failure {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    pub outcome: StatusOutcome,
    pub timestamp: DateTime<Local>,
    pub commit: Option<CommitInfo>,
}

impl StatusRecord {
    #[must_use]
    pub fn new(outcome: StatusOutcome, commit: Option<CommitInfo>) -> Self {
        Self {
            outcome,
            timestamp: Local::now(),
            commit,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, StatusOutcome::Success { .. })
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let status = if self.is_success() { "SUCCESS" } else { "FAILURE" };
        let _ = writeln!(out, "Status: {}", status);
        let _ = writeln!(
            out,
            "Timestamp: {}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%.6f")
        );

        match &self.outcome {
            StatusOutcome::Success {
                change,
                submodule_updates,
            } => {
                let _ = writeln!(out, "Repository Changed: {}", change.label());
                let updates = if submodule_updates.is_empty() {
                    "None".to_string()
                } else {
                    submodule_updates.join(", ")
                };
                let _ = writeln!(out, "Submodule Updates: {}", updates);
            }
            StatusOutcome::Failure { error } => {
                let _ = writeln!(out, "Error: {}", error);
            }
        }

        if let Some(commit) = &self.commit {
            let _ = writeln!(out, "Current Commit:");
            let _ = writeln!(out, "{} ({})", commit.hash, commit.branch_label());
            let _ = writeln!(out, "{}", commit.subject);
        }
        out
    }

    /// Overwrites `path` with the rendered record.
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.render())?;
        tracing::info!(
            "Status written: {}",
            if self.is_success() { "SUCCESS" } else { "FAILURE" }
        );
        Ok(())
    }
}
