//! Application-wide constants.
//!
//! Artifact names and git vocabulary shared across the orchestrator.

/// Status record written into the repository root after every run.
pub const STATUS_FILE: &str = ".git_pull_indep_status";

/// Append-only log file written into the repository root.
pub const LOG_FILE: &str = ".git_pull_indep.log";

/// Git directory name used to detect repositories.
pub const GIT_DIR: &str = ".git";

/// File declaring submodules, relative to the repository root.
pub const GITMODULES_FILE: &str = ".gitmodules";

/// The only remote the orchestrator pulls from.
pub const ORIGIN: &str = "origin";

/// Label attached to stashes created by the dirty-tree guard.
pub const STASH_LABEL: &str = "git-pull-indep auto-stash";

/// Branch name shown in the status record when HEAD is detached.
pub const DETACHED_LABEL: &str = "(detached)";

/// Hidden CLI flag that marks a re-invocation from the cache directory.
pub const FROM_CACHE_FLAG: &str = "--from-cache";

/// Width of the banner line framing each run in the log.
pub const BANNER_WIDTH: usize = 60;

/// Default name used when a repository name cannot be determined from its path.
pub const DEFAULT_REPO_NAME: &str = "repository";
