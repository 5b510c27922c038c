//! Log setup: console mirror plus an append-only file in the repository.
//!
//! Initialized once per process. The log file is never rotated.

use crate::config::RunConfig;
use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber at the configured level.
///
/// When the log file cannot be opened (for instance because the repository
/// path is wrong) logging continues on the console only and a warning says why.
pub fn init(config: &RunConfig) -> anyhow::Result<()> {
    match open_log_file(&config.log_file()) {
        Ok(file) => install(config, Some(file)),
        Err(err) => {
            install(config, None)?;
            tracing::warn!("Logging to console only: {:#}", err);
            Ok(())
        }
    }
}

/// Installs a console-only subscriber, leaving the repository untouched.
pub fn init_console(config: &RunConfig) -> anyhow::Result<()> {
    install(config, None)
}

fn install(config: &RunConfig, log_file: Option<File>) -> anyhow::Result<()> {
    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(config.log_level.level_filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(std::io::stdout().is_terminal())
                .with_target(false),
        )
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}
