use anyhow::Context;
use clap::Parser;
use git_pull_indep::cli::Cli;
use git_pull_indep::config::RunConfig;
use git_pull_indep::repo::{self, SyncOutcome};
use git_pull_indep::{cache, error, handoff, logging, output};
use std::path::Path;

fn main() {
    let cli = Cli::parse();
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            output::print_fatal(&anyhow::Error::new(err).context("Failed to read current directory"));
            std::process::exit(1);
        }
    };
    let config = cli.into_config(&cwd);
    output::configure_color();

    // A mismatched cache marker aborts before anything is written to the repository.
    let location = verify_cache_location(&config);
    let logging = if location.is_ok() {
        logging::init(&config)
    } else {
        logging::init_console(&config)
    };
    if let Err(err) = logging {
        eprintln!("warning: {:#}", err);
    }

    let result = location.and_then(|()| run(&config));

    // The status file is written by now; handing off is the last action.
    if let Some(initiator) = &config.initiator {
        let err = handoff::hand_off_to_initiator(initiator);
        tracing::error!(
            "Failed to hand off to initiator {}: {}",
            initiator.display(),
            err
        );
    }
    restore_directory(&config.original_dir);

    if let Err(err) = result {
        output::print_fatal(&err);
        std::process::exit(1);
    }
}

/// Checks that a relocated run is executing from the cache it was sent to.
fn verify_cache_location(config: &RunConfig) -> anyhow::Result<()> {
    let Some(cache) = &config.from_cache else {
        return Ok(());
    };
    let running_dir = cache::program_dir().context("Failed to locate the running program")?;
    cache::verify_location(cache, &running_dir)?;
    Ok(())
}

fn run(config: &RunConfig) -> anyhow::Result<()> {
    if let Some(cache) = &config.from_cache {
        tracing::info!("Running from cache: {}", cache.display());
    } else if let Some(cache) = &config.cache_path {
        match cache::relocate(config, cache) {
            Ok(never) => match never {},
            Err(err) => {
                tracing::error!("{}", error::chain(&err));
                repo::write_failure_status(config, &err);
                return Err(err.into());
            }
        }
    }

    enter_directory(&config.repo_path);
    let report = repo::sync(config, &output::StepLogger);
    output::print_summary(&report, config);

    match report.outcome {
        SyncOutcome::Success(_) => Ok(()),
        SyncOutcome::Failed(failure) => Err(anyhow::Error::from(failure.error)
            .context(format!("Sync failed while {}", failure.step))),
    }
}

fn enter_directory(path: &Path) {
    if let Err(err) = std::env::set_current_dir(path) {
        tracing::debug!("Staying in current directory, cannot enter {}: {}", path.display(), err);
    }
}

fn restore_directory(original: &Path) {
    match std::env::set_current_dir(original) {
        Ok(()) => tracing::info!("Returned to directory: {}", original.display()),
        Err(err) => tracing::warn!(
            "Could not return to directory {}: {}",
            original.display(),
            err
        ),
    }
}
