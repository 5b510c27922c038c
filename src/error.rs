//! Error taxonomy for a sync run.

use crate::git::GitError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of the orchestrator.
///
/// Stash and stash-pop failures are not represented here: they degrade to
/// warnings and never abort a run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The target path is missing or has no `.git` metadata.
    #[error("invalid repository {}: {reason}", path.display())]
    InvalidRepository { path: PathBuf, reason: String },

    #[error("failed to check out branch '{branch}'")]
    BranchResolution {
        branch: String,
        #[source]
        source: GitError,
    },

    #[error("failed to pull from origin")]
    Pull(#[source] GitError),

    #[error("failed to update submodules")]
    SubmoduleUpdate(#[source] GitError),

    #[error("failed to relocate into cache {}", cache.display())]
    CacheRelocation {
        cache: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The re-invoked program is not running from `<cache>/<program-name>`.
    #[error(
        "cache location mismatch: expected to run from {}, running from {}",
        expected.display(),
        actual.display()
    )]
    CacheLocationMismatch { expected: PathBuf, actual: PathBuf },

    #[error("failed to write status file {}", path.display())]
    StatusWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Renders `err` followed by each of its causes, separated by `: `.
pub fn chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
