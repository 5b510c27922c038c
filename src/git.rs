//! Git command wrappers.
//!
//! This module provides a thin wrapper around git CLI commands,
//! handling command execution and error formatting. Every call blocks
//! until git exits.

use std::path::{Path, PathBuf};
use std::process::Output;
use thiserror::Error;

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Git ran but exited unsuccessfully.
    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Git could not be spawned at all.
    #[error("failed to execute git")]
    Io(#[from] std::io::Error),

    #[error("invalid branch name: {0:?}")]
    InvalidBranchName(String),
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

fn exec_git(repo: &Path, args: &[&str]) -> GitResult<Output> {
    tracing::debug!("git {}", args.join(" "));
    let output = std::process::Command::new("git")
        .current_dir(repo)
        .args(args)
        .output()?;
    Ok(output)
}

/// Runs git in `repo` and returns trimmed stdout, failing on a non-zero exit.
pub fn run_git(repo: &Path, args: &[&str]) -> GitResult<String> {
    let output = exec_git(repo, args)?;

    if output.status.success() {
        let result = String::from_utf8_lossy(&output.stdout);
        Ok(result.as_ref().trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(GitError::CommandFailed {
            command: args.join(" "),
            stderr: stderr.trim().to_string(),
        })
    }
}

/// Runs a git predicate (`show-ref --verify --quiet` and friends).
/// Exit code 0 maps to `true`, any other exit code to `false`.
fn run_git_check(repo: &Path, args: &[&str]) -> GitResult<bool> {
    let output = exec_git(repo, args)?;
    Ok(output.status.success())
}

fn validate_branch_name(branch: &str) -> GitResult<()> {
    if branch.is_empty()
        || branch.starts_with('-')
        || branch.contains('\0')
        || branch.contains('\n')
    {
        return Err(GitError::InvalidBranchName(branch.to_string()));
    }
    Ok(())
}

/// Returns the short name of the checked-out branch, or `None` when HEAD is detached.
pub fn get_current_branch(repo: &Path) -> GitResult<Option<String>> {
    let output = exec_git(repo, &["symbolic-ref", "--short", "-q", "HEAD"])?;
    if output.status.success() {
        let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Some(branch))
    } else if output.status.code() == Some(1) {
        Ok(None)
    } else {
        Err(GitError::CommandFailed {
            command: "symbolic-ref --short -q HEAD".to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

pub fn get_current_commit(repo: &Path) -> GitResult<String> {
    run_git(repo, &["rev-parse", "HEAD"])
}

/// First line of the HEAD commit message.
///
/// `%s` would fold a multi-line first paragraph into one line, so the raw
/// body is read and cut at the first newline.
pub fn get_commit_subject(repo: &Path) -> GitResult<String> {
    let message = run_git(repo, &["log", "-1", "--format=%B"])?;
    Ok(message.lines().next().unwrap_or_default().to_string())
}

/// Tracked modifications and untracked files both count; ignored files do not.
pub fn has_uncommitted_changes(repo: &Path) -> GitResult<bool> {
    run_git(repo, &["status", "--porcelain"]).map(|output| !output.is_empty())
}

/// Stashes tracked and untracked changes under `label`.
/// Returns `false` when git found nothing to save.
pub fn stash(repo: &Path, label: &str) -> GitResult<bool> {
    let output = run_git(repo, &["stash", "push", "--include-untracked", "-m", label])?;
    Ok(!output.contains("No local changes to save"))
}

pub fn stash_pop(repo: &Path) -> GitResult<()> {
    run_git(repo, &["stash", "pop"])?;
    Ok(())
}

pub fn local_branch_exists(repo: &Path, branch: &str) -> GitResult<bool> {
    validate_branch_name(branch)?;
    let reference = format!("refs/heads/{}", branch);
    run_git_check(repo, &["show-ref", "--verify", "--quiet", &reference])
}

/// Checks for a remote-tracking ref such as `origin/main`.
pub fn remote_ref_exists(repo: &Path, remote_ref: &str) -> GitResult<bool> {
    let reference = format!("refs/remotes/{}", remote_ref);
    run_git_check(repo, &["show-ref", "--verify", "--quiet", &reference])
}

pub fn list_remotes(repo: &Path) -> GitResult<Vec<String>> {
    let output = run_git(repo, &["remote"])?;
    Ok(output.lines().map(str::to_string).collect())
}

pub fn has_remote(repo: &Path, remote: &str) -> GitResult<bool> {
    Ok(list_remotes(repo)?.iter().any(|name| name == remote))
}

pub fn fetch(repo: &Path, remote: &str) -> GitResult<()> {
    run_git(repo, &["fetch", remote])?;
    Ok(())
}

pub fn checkout(repo: &Path, branch: &str) -> GitResult<()> {
    validate_branch_name(branch)?;
    run_git(repo, &["checkout", branch])?;
    Ok(())
}

/// Creates `branch` tracking `upstream` (e.g. `origin/feature`) and switches to it.
pub fn checkout_tracking(repo: &Path, branch: &str, upstream: &str) -> GitResult<()> {
    validate_branch_name(branch)?;
    run_git(repo, &["checkout", "-b", branch, "--track", upstream])?;
    Ok(())
}

/// Creates `branch` from the current HEAD and switches to it.
pub fn checkout_new_branch(repo: &Path, branch: &str) -> GitResult<()> {
    validate_branch_name(branch)?;
    run_git(repo, &["checkout", "-b", branch])?;
    Ok(())
}

/// Returns the upstream of the current branch (e.g. `origin/main`), if configured.
pub fn get_upstream(repo: &Path) -> GitResult<Option<String>> {
    let output = exec_git(
        repo,
        &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
    )?;
    if output.status.success() {
        let upstream = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Some(upstream))
    } else {
        Ok(None)
    }
}

/// Merges `remote`/`branch` into the current branch.
pub fn pull(repo: &Path, remote: &str, branch: &str) -> GitResult<()> {
    validate_branch_name(branch)?;
    run_git(repo, &["pull", "--no-rebase", remote, branch])?;
    Ok(())
}

/// Lists `key value` entries of a config-format file (such as `.gitmodules`)
/// whose keys match `pattern`. A file without matching keys yields no entries.
pub fn config_file_entries(repo: &Path, file: &str, pattern: &str) -> GitResult<Vec<String>> {
    let args = ["config", "--file", file, "--get-regexp", pattern];
    let output = exec_git(repo, &args)?;
    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().map(str::to_string).collect())
    } else if output.status.code() == Some(1) {
        Ok(Vec::new())
    } else {
        Err(GitError::CommandFailed {
            command: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Resolves a path inside the repository's git directory (e.g. `info/exclude`).
/// Works for linked worktrees and submodules where `.git` is a file.
pub fn git_path(repo: &Path, name: &str) -> GitResult<PathBuf> {
    let path = PathBuf::from(run_git(repo, &["rev-parse", "--git-path", name])?);
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(repo.join(path))
    }
}

pub fn submodule_update(repo: &Path) -> GitResult<()> {
    run_git(repo, &["submodule", "update", "--init", "--recursive"])?;
    Ok(())
}
