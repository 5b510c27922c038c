//! Command-line interface.

use crate::config::{LogLevel, RunConfig};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "git-pull-indep",
    version,
    about = "Pull a git repository and update its submodules, tolerating local changes",
    after_help = "Examples:\n  \
        git-pull-indep /path/to/repo\n  \
        git-pull-indep /path/to/repo --checkout main\n  \
        git-pull-indep /path/to/repo --checkout feature --cache-path /tmp/cache\n  \
        git-pull-indep /path/to/repo --initiator /path/to/caller"
)]
pub struct Cli {
    /// Path to the git repository.
    pub repo_path: PathBuf,

    /// Branch to check out before pulling (created if it doesn't exist).
    #[arg(long = "checkout", value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Copy the program here and run the copy, so updating the original checkout is safe.
    #[arg(long, alias = "cache_path", value_name = "DIR")]
    pub cache_path: Option<PathBuf>,

    /// Program to hand control to once the run finishes, whatever the outcome.
    #[arg(long, value_name = "PATH")]
    pub initiator: Option<PathBuf>,

    #[arg(long, value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Set by the program itself when re-invoked from the cache directory.
    #[arg(long, hide = true, value_name = "DIR")]
    pub from_cache: Option<PathBuf>,
}

impl Cli {
    /// Builds the run configuration, resolving relative paths against `cwd`.
    #[must_use]
    pub fn into_config(self, cwd: &Path) -> RunConfig {
        RunConfig {
            repo_path: absolutize(cwd, &self.repo_path),
            branch: self.branch,
            cache_path: self.cache_path.map(|p| absolutize(cwd, &p)),
            initiator: self.initiator.map(|p| absolutize(cwd, &p)),
            log_level: self.log_level,
            from_cache: self.from_cache.map(|p| absolutize(cwd, &p)),
            original_dir: cwd.to_path_buf(),
        }
    }
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
