//! Step messages and colored summary output.
//!
//! The log carries the detail of a run; this module adds the step narration
//! and the one-line verdict printed when the process exits normally.

use crate::config::RunConfig;
use crate::error;
use crate::repo::{SyncCallbacks, SyncOutcome, SyncReport, SyncStep, short_hash};
use colored::Colorize;
use std::io::IsTerminal;
use std::time::Duration;

/// No-op callbacks for when progress tracking is not needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpCallbacks;

impl SyncCallbacks for NoOpCallbacks {
    fn on_step(&self, _step: &SyncStep) {}
}

/// Narrates each step into the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepLogger;

impl SyncCallbacks for StepLogger {
    fn on_step(&self, step: &SyncStep) {
        match step {
            SyncStep::Started | SyncStep::Completed => tracing::debug!("{}", format_step_message(step)),
            _ => tracing::info!("{}", format_step_message(step)),
        }
    }
}

fn format_step_message(step: &SyncStep) -> String {
    match step {
        SyncStep::Started => "Starting sync...".to_string(),
        SyncStep::Validating => "Validating repository...".to_string(),
        SyncStep::CheckingChanges => "Checking for uncommitted changes...".to_string(),
        SyncStep::Stashing => "Stashing uncommitted changes...".to_string(),
        SyncStep::CheckingOut { branch } => format!("Checking out branch {}...", branch),
        SyncStep::Pulling => "Pulling changes from origin...".to_string(),
        SyncStep::UpdatingSubmodules => "Updating submodules...".to_string(),
        SyncStep::RestoringStash => "Restoring stashed changes...".to_string(),
        SyncStep::WritingStatus => "Writing status file...".to_string(),
        SyncStep::Completed => "Completed".to_string(),
    }
}

/// Prints the final verdict of a run to the console.
pub fn print_summary(report: &SyncReport, config: &RunConfig) {
    match &report.outcome {
        SyncOutcome::Success(success) => {
            let head = success
                .commit
                .as_ref()
                .map(|c| format!("{}@{}", c.branch_label(), short_hash(&c.hash)))
                .unwrap_or_default();
            let change = if success.repo_changed() {
                "updated".green()
            } else {
                "up to date".normal()
            };
            let stash_msg = if success.stashed {
                " (changes left in stash)".yellow()
            } else {
                "".normal()
            };
            let submodules = if success.submodule_updates.is_empty() {
                String::new()
            } else {
                format!(" submodules: {}", success.submodule_updates.join(", "))
            };
            println!(
                "{} {} {} {}{}{} in {}",
                "OK".green().bold(),
                config.repo_name().white(),
                head.cyan(),
                change,
                stash_msg,
                submodules.dimmed(),
                format_duration(report.duration).dimmed(),
            );
        }
        SyncOutcome::Failed(failure) => {
            println!(
                "{} {} {} in {}",
                "FAIL".red().bold(),
                config.repo_name().white(),
                format!("at {}: {}", failure.step, error::chain(&failure.error)).red(),
                format_duration(report.duration).dimmed(),
            );
        }
    }
}

/// Disables colors when stdout is captured rather than shown in a terminal.
pub fn configure_color() {
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }
}

/// Reports an unhandled failure on stderr.
pub fn print_fatal(error: &anyhow::Error) {
    eprintln!("{} {:#}", "Fatal error:".red().bold(), error);
}

fn format_duration(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f32())
}
