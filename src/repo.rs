// Repository sync: validation, stash guard, branch resolution, pull, submodules

use crate::config::RunConfig;
use crate::constants::{BANNER_WIDTH, GIT_DIR, LOG_FILE, ORIGIN, STASH_LABEL, STATUS_FILE};
use crate::error::{self, SyncError};
use crate::git::{self, GitResult};
use crate::status::{CommitInfo, RepoChange, StatusOutcome, StatusRecord};
use crate::submodule::{self, SubmoduleSnapshot};
use chrono::Local;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStep {
    Started,
    Validating,
    CheckingChanges,
    Stashing,
    CheckingOut { branch: String },
    Pulling,
    UpdatingSubmodules,
    RestoringStash,
    WritingStatus,
    Completed,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStep::Started => write!(f, "started"),
            SyncStep::Validating => write!(f, "validating repository"),
            SyncStep::CheckingChanges => write!(f, "checking changes"),
            SyncStep::Stashing => write!(f, "stashing"),
            SyncStep::CheckingOut { branch } => write!(f, "checking out {}", branch),
            SyncStep::Pulling => write!(f, "pulling"),
            SyncStep::UpdatingSubmodules => write!(f, "updating submodules"),
            SyncStep::RestoringStash => write!(f, "restoring stash"),
            SyncStep::WritingStatus => write!(f, "writing status"),
            SyncStep::Completed => write!(f, "completed"),
        }
    }
}

/// Receives progress notifications while a sync runs.
pub trait SyncCallbacks {
    fn on_step(&self, step: &SyncStep);
}

/// What the pull from `origin` did to the current branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// No `origin`, detached HEAD, or nothing on `origin` to pull from.
    Skipped,
    UpToDate,
    Updated { from: String, to: String },
}

impl PullOutcome {
    #[must_use]
    pub fn is_change(&self) -> bool {
        matches!(self, PullOutcome::Updated { .. })
    }
}

#[derive(Debug)]
pub struct SyncReport {
    pub path: PathBuf,
    pub outcome: SyncOutcome,
    pub duration: Duration,
}

#[derive(Debug)]
pub struct SyncSuccess {
    /// Local changes are still sitting in the stash.
    pub stashed: bool,
    pub pull: PullOutcome,
    pub submodule_updates: Vec<String>,
    pub commit: Option<CommitInfo>,
}

impl SyncSuccess {
    #[must_use]
    pub fn repo_changed(&self) -> bool {
        self.pull.is_change()
    }

    #[must_use]
    pub fn change(&self) -> RepoChange {
        RepoChange::from_flags(self.repo_changed(), self.stashed)
    }
}

#[derive(Debug)]
pub struct SyncFailure {
    pub error: SyncError,
    pub step: SyncStep,
}

#[derive(Debug)]
pub enum SyncOutcome {
    Success(SyncSuccess),
    Failed(SyncFailure),
}

impl SyncOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Success(_))
    }
}

fn at_step<T>(step: SyncStep, result: Result<T, SyncError>) -> Result<T, SyncFailure> {
    result.map_err(|error| SyncFailure { error, step })
}

/// Fails with `InvalidRepository` unless `path` exists and holds git metadata.
pub fn validate_repository(path: &Path) -> Result<(), SyncError> {
    if !path.exists() {
        return Err(SyncError::InvalidRepository {
            path: path.to_path_buf(),
            reason: "path does not exist".to_string(),
        });
    }
    if !path.join(GIT_DIR).exists() {
        return Err(SyncError::InvalidRepository {
            path: path.to_path_buf(),
            reason: "not a git repository".to_string(),
        });
    }
    Ok(())
}

/// Adds the status and log file names to `.git/info/exclude` so the tool's
/// own artifacts never count as local changes.
pub fn exclude_artifacts(path: &Path) -> anyhow::Result<()> {
    let exclude = git::git_path(path, "info/exclude")?;
    let existing = match std::fs::read_to_string(&exclude) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err.into()),
    };

    let missing: Vec<&str> = [STATUS_FILE, LOG_FILE]
        .into_iter()
        .filter(|name| !existing.lines().any(|line| line.trim() == *name))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    for name in missing {
        content.push_str(name);
        content.push('\n');
    }
    if let Some(parent) = exclude.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&exclude, content)?;
    Ok(())
}

/// Runs one full sync of `config.repo_path` and writes the status record.
///
/// The status file is written on every path, success or failure, before this
/// returns. Nothing here transfers control away from the process.
pub fn sync<C: SyncCallbacks + ?Sized>(config: &RunConfig, callbacks: &C) -> SyncReport {
    let start = Instant::now();
    let path = config.repo_path.as_path();

    tracing::info!("{}", "=".repeat(BANNER_WIDTH));
    tracing::info!("Repository: {}", path.display());
    tracing::info!("Original directory: {}", config.original_dir.display());

    let outcome = match do_sync(config, callbacks) {
        Ok(success) => {
            callbacks.on_step(&SyncStep::WritingStatus);
            let record = StatusRecord::new(
                StatusOutcome::Success {
                    change: success.change(),
                    submodule_updates: success.submodule_updates.clone(),
                },
                success.commit.clone(),
            );
            match record.write(&config.status_file()) {
                Ok(()) => {
                    callbacks.on_step(&SyncStep::Completed);
                    tracing::info!("All operations completed successfully");
                    SyncOutcome::Success(success)
                }
                Err(source) => {
                    let error = SyncError::StatusWrite {
                        path: config.status_file(),
                        source,
                    };
                    tracing::error!("{}", error::chain(&error));
                    SyncOutcome::Failed(SyncFailure {
                        error,
                        step: SyncStep::WritingStatus,
                    })
                }
            }
        }
        Err(failure) => {
            tracing::error!("Failed while {}: {}", failure.step, error::chain(&failure.error));
            write_failure_status(config, &failure.error);
            SyncOutcome::Failed(failure)
        }
    };

    tracing::info!("{}", "=".repeat(BANNER_WIDTH));

    SyncReport {
        path: path.to_path_buf(),
        outcome,
        duration: start.elapsed(),
    }
}

/// Best effort: the repository may be missing or half-updated at this point.
pub fn write_failure_status(config: &RunConfig, error: &SyncError) {
    let record = StatusRecord::new(
        StatusOutcome::Failure {
            error: error::chain(error),
        },
        CommitInfo::read(&config.repo_path),
    );
    if let Err(err) = record.write(&config.status_file()) {
        tracing::warn!("Could not write failure status: {}", err);
    }
}

fn do_sync<C: SyncCallbacks + ?Sized>(
    config: &RunConfig,
    callbacks: &C,
) -> Result<SyncSuccess, SyncFailure> {
    let path = config.repo_path.as_path();
    callbacks.on_step(&SyncStep::Started);

    callbacks.on_step(&SyncStep::Validating);
    at_step(SyncStep::Validating, validate_repository(path))?;
    if let Err(err) = exclude_artifacts(path) {
        tracing::warn!("Could not exclude status and log files from git: {:#}", err);
    }

    callbacks.on_step(&SyncStep::CheckingChanges);
    let mut stashed = false;
    if is_dirty(path) {
        tracing::warn!("Repository has uncommitted changes");
        callbacks.on_step(&SyncStep::Stashing);
        stashed = stash_changes(path);
    }

    if let Some(branch) = &config.branch {
        let step = SyncStep::CheckingOut {
            branch: branch.clone(),
        };
        callbacks.on_step(&step);
        at_step(
            step,
            resolve_branch(path, branch).map_err(|source| SyncError::BranchResolution {
                branch: branch.clone(),
                source,
            }),
        )?;
        tracing::info!("Successfully checked out branch: {}", branch);
    }

    callbacks.on_step(&SyncStep::Pulling);
    let pull = at_step(
        SyncStep::Pulling,
        pull_from_origin(path).map_err(SyncError::Pull),
    )?;

    callbacks.on_step(&SyncStep::UpdatingSubmodules);
    let submodule_updates = at_step(
        SyncStep::UpdatingSubmodules,
        update_submodules(path).map_err(SyncError::SubmoduleUpdate),
    )?;

    if !pull.is_change() && stashed {
        callbacks.on_step(&SyncStep::RestoringStash);
        match git::stash_pop(path) {
            Ok(()) => {
                tracing::info!("Restored stashed changes");
                stashed = false;
            }
            Err(err) => {
                tracing::error!("Failed to restore stashed changes: {}", error::chain(&err));
                tracing::warn!("Local changes remain in the stash, resolve manually with 'git stash pop'");
            }
        }
    } else if stashed {
        tracing::info!("Remote changes pulled, leaving local changes in the stash");
    }

    Ok(SyncSuccess {
        stashed,
        pull,
        submodule_updates,
        commit: CommitInfo::read(path),
    })
}

fn is_dirty(path: &Path) -> bool {
    match git::has_uncommitted_changes(path) {
        Ok(dirty) => dirty,
        Err(err) => {
            tracing::warn!("Could not check for uncommitted changes: {}", error::chain(&err));
            false
        }
    }
}

/// Stash failures never abort the run; the pull is attempted regardless.
fn stash_changes(path: &Path) -> bool {
    let label = format!("{} {}", STASH_LABEL, Local::now().format("%Y-%m-%dT%H:%M:%S"));
    match git::stash(path, &label) {
        Ok(true) => {
            tracing::info!("Stashed local changes as '{}'", label);
            true
        }
        Ok(false) => {
            tracing::info!("Nothing to stash");
            false
        }
        Err(err) => {
            tracing::warn!("Failed to stash local changes, pulling anyway: {}", error::chain(&err));
            false
        }
    }
}

/// Switches to `branch`: the local branch if present, else a new branch
/// tracking `origin/<branch>`, else a new branch from the current HEAD.
fn resolve_branch(path: &Path, branch: &str) -> GitResult<()> {
    if git::local_branch_exists(path, branch)? {
        tracing::info!("Branch {} exists, checking out", branch);
        return git::checkout(path, branch);
    }

    if git::has_remote(path, ORIGIN)? {
        if let Err(err) = git::fetch(path, ORIGIN) {
            tracing::warn!("Failed to fetch remote: {}", error::chain(&err));
        }
    }

    let remote_branch = format!("{}/{}", ORIGIN, branch);
    if git::remote_ref_exists(path, &remote_branch)? {
        tracing::info!(
            "Branch {} exists on remote, creating local tracking branch",
            branch
        );
        git::checkout_tracking(path, branch, &remote_branch)
    } else {
        tracing::info!("Branch {} doesn't exist, creating new branch", branch);
        git::checkout_new_branch(path, branch)
    }
}

fn pull_from_origin(path: &Path) -> GitResult<PullOutcome> {
    if !git::has_remote(path, ORIGIN)? {
        tracing::warn!("No '{}' remote configured, skipping git pull", ORIGIN);
        return Ok(PullOutcome::Skipped);
    }

    let Some(branch) = git::get_current_branch(path)? else {
        tracing::warn!("HEAD is detached, skipping git pull");
        return Ok(PullOutcome::Skipped);
    };

    let origin_prefix = format!("{}/", ORIGIN);
    let upstream = git::get_upstream(path)?;
    let remote_branch = match upstream
        .as_deref()
        .and_then(|upstream| upstream.strip_prefix(origin_prefix.as_str()))
    {
        Some(remote_branch) => remote_branch.to_string(),
        None => {
            git::fetch(path, ORIGIN)?;
            if !git::remote_ref_exists(path, &format!("{}{}", origin_prefix, branch))? {
                tracing::warn!(
                    "Branch {} has no counterpart on '{}', skipping git pull",
                    branch,
                    ORIGIN
                );
                return Ok(PullOutcome::Skipped);
            }
            branch
        }
    };

    let before = git::get_current_commit(path)?;
    git::pull(path, ORIGIN, &remote_branch)?;
    let after = git::get_current_commit(path)?;

    if before == after {
        tracing::info!("Pulled {}/{}: already up to date", ORIGIN, remote_branch);
        Ok(PullOutcome::UpToDate)
    } else {
        tracing::info!(
            "Pulled {}/{}: {}..{}",
            ORIGIN,
            remote_branch,
            short_hash(&before),
            short_hash(&after)
        );
        Ok(PullOutcome::Updated {
            from: before,
            to: after,
        })
    }
}

/// Returns the names of submodules whose checked-out commit changed.
fn update_submodules(path: &Path) -> GitResult<Vec<String>> {
    let submodules = submodule::list(path)?;
    if submodules.is_empty() {
        tracing::info!("No submodules found");
        return Ok(Vec::new());
    }

    for submodule in &submodules {
        tracing::info!("Updating submodule: {}", submodule.name);
    }

    let before = SubmoduleSnapshot::capture(path, &submodules);
    git::submodule_update(path)?;
    let after = SubmoduleSnapshot::capture(path, &submodules);

    let updated = before.updated_since(&after);
    if updated.is_empty() {
        tracing::info!("Submodules already up to date");
    } else {
        tracing::info!("Submodules updated: {}", updated.join(", "));
    }
    Ok(updated)
}

#[must_use]
pub fn short_hash(hash: &str) -> &str {
    hash.get(..7).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_repository_rejects_missing_path() {
        let err = validate_repository(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, SyncError::InvalidRepository { .. }));
    }

    #[test]
    fn test_validate_repository_rejects_plain_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = validate_repository(dir.path()).unwrap_err();
        assert!(err.to_string().contains("not a git repository"));
    }

    #[test]
    fn test_only_updated_pull_counts_as_change() {
        assert!(!PullOutcome::Skipped.is_change());
        assert!(!PullOutcome::UpToDate.is_change());
        assert!(
            PullOutcome::Updated {
                from: "a".to_string(),
                to: "b".to_string()
            }
            .is_change()
        );
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0123456789abcdef"), "0123456");
        assert_eq!(short_hash("abc"), "abc");
    }

    #[test]
    fn test_step_display() {
        let step = SyncStep::CheckingOut {
            branch: "main".to_string(),
        };
        assert_eq!(step.to_string(), "checking out main");
        assert_eq!(SyncStep::Pulling.to_string(), "pulling");
    }
}
