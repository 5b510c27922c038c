//! Run configuration and log verbosity.

use crate::constants::{LOG_FILE, STATUS_FILE};
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

/// Immutable configuration for a single sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Absolute path of the repository to synchronize.
    pub repo_path: PathBuf,
    /// Branch to switch to before pulling.
    pub branch: Option<String>,
    /// Directory the program relocates itself into before running.
    pub cache_path: Option<PathBuf>,
    /// Program that receives control once the run is over.
    pub initiator: Option<PathBuf>,
    pub log_level: LogLevel,
    /// Set only on the re-invocation from the cache: the cache directory the
    /// previous invocation copied the program into.
    pub from_cache: Option<PathBuf>,
    /// Working directory at startup, restored after a run without hand-off.
    pub original_dir: PathBuf,
}

impl RunConfig {
    /// Minimal configuration for `repo_path` with every option unset.
    #[must_use]
    pub fn new(repo_path: impl Into<PathBuf>, original_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            branch: None,
            cache_path: None,
            initiator: None,
            log_level: LogLevel::default(),
            from_cache: None,
            original_dir: original_dir.into(),
        }
    }

    #[must_use]
    pub fn status_file(&self) -> PathBuf {
        self.repo_path.join(STATUS_FILE)
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.repo_path.join(LOG_FILE)
    }

    /// Whether this invocation should copy itself into the cache and re-exec.
    #[must_use]
    pub fn needs_relocation(&self) -> bool {
        self.cache_path.is_some() && self.from_cache.is_none()
    }

    #[must_use]
    pub fn repo_name(&self) -> &str {
        repo_name(&self.repo_path)
    }
}

fn repo_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(crate::constants::DEFAULT_REPO_NAME)
}

/// Log verbosity, spelled the way callers of the tool pass it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    #[value(name = "DEBUG")]
    Debug,
    #[default]
    #[value(name = "INFO")]
    Info,
    #[value(name = "WARNING")]
    Warning,
    #[value(name = "ERROR")]
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn as_arg(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }

    #[must_use]
    pub fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_paths_live_in_repo_root() {
        let config = RunConfig::new("/work/dep", "/work");
        assert_eq!(
            config.status_file(),
            PathBuf::from("/work/dep/.git_pull_indep_status")
        );
        assert_eq!(
            config.log_file(),
            PathBuf::from("/work/dep/.git_pull_indep.log")
        );
        assert_eq!(config.repo_name(), "dep");
    }

    #[test]
    fn test_needs_relocation_only_before_reinvocation() {
        let mut config = RunConfig::new("/work/dep", "/work");
        assert!(!config.needs_relocation());

        config.cache_path = Some(PathBuf::from("/cache"));
        assert!(config.needs_relocation());

        config.from_cache = Some(PathBuf::from("/cache"));
        assert!(!config.needs_relocation());
    }

    #[test]
    fn test_log_level_maps_to_filter_and_arg() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::Warning.level_filter(), LevelFilter::WARN);
        assert_eq!(LogLevel::Debug.level_filter(), LevelFilter::DEBUG);
        assert_eq!(LogLevel::Error.as_arg(), "ERROR");
    }
}
