//! Cache relocation.
//!
//! Running from a copy keeps the program safe from the very checkout it may
//! be updating. The first invocation copies its own directory into
//! `<cache>/<program-name>/` and re-executes the copy with `--from-cache`;
//! the copy verifies it really runs from there before touching anything.

use crate::config::RunConfig;
use crate::constants::FROM_CACHE_FLAG;
use crate::error::{SyncError, SyncResult};
use crate::handoff;
use std::convert::Infallible;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

/// Directory containing the running executable.
pub fn program_dir() -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?.canonicalize()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| io::Error::other("executable has no parent directory"))
}

/// `<cache>/<program-name>` for a program living in `program_dir`.
#[must_use]
pub fn cached_program_dir(cache: &Path, program_dir: &Path) -> PathBuf {
    match program_dir.file_name() {
        Some(name) => cache.join(name),
        None => cache.to_path_buf(),
    }
}

/// Copies the program into the cache and re-executes the copy.
///
/// Returns only on failure; on success the process image is replaced.
pub fn relocate(config: &RunConfig, cache: &Path) -> SyncResult<Infallible> {
    let fail = |source: io::Error| SyncError::CacheRelocation {
        cache: cache.to_path_buf(),
        source,
    };

    tracing::info!("Copying program to cache path: {}", cache.display());
    let exe = std::env::current_exe().and_then(|p| p.canonicalize()).map_err(fail)?;
    let source_dir = program_dir().map_err(fail)?;
    std::fs::create_dir_all(cache).map_err(fail)?;
    let cache = cache.canonicalize().map_err(fail)?;
    if cache.starts_with(&source_dir) {
        return Err(fail(io::Error::other(
            "cache directory lies inside the program directory",
        )));
    }

    let target_dir = cached_program_dir(&cache, &source_dir);
    // Copying onto itself would delete the running program first.
    if target_dir == source_dir {
        tracing::info!("Program already in cache: {}", target_dir.display());
    } else {
        copy_dir(&source_dir, &target_dir).map_err(fail)?;
        tracing::info!("Program copied to: {}", target_dir.display());
    }

    let exe_name = exe
        .file_name()
        .ok_or_else(|| fail(io::Error::other("executable has no file name")))?;
    let cached_exe = target_dir.join(exe_name);
    let args = reexec_args(config, &cache);
    tracing::info!(
        "Re-executing from cache: {} {}",
        cached_exe.display(),
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let mut command = Command::new(&cached_exe);
    command.args(&args);
    Err(fail(handoff::replace_process(&mut command)))
}

/// Arguments for the cached copy: everything that shapes the run, plus the marker.
fn reexec_args(config: &RunConfig, cache: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![config.repo_path.clone().into()];
    if let Some(branch) = &config.branch {
        args.push("--checkout".into());
        args.push(branch.into());
    }
    if let Some(initiator) = &config.initiator {
        args.push("--initiator".into());
        args.push(initiator.clone().into());
    }
    args.push("--log-level".into());
    args.push(config.log_level.as_arg().into());
    args.push(FROM_CACHE_FLAG.into());
    args.push(cache.to_path_buf().into());
    args
}

/// Checks that a program re-invoked with the cache marker is running from
/// `<cache>/<program-name>`.
pub fn verify_location(cache: &Path, running_dir: &Path) -> SyncResult<()> {
    let cache = cache.canonicalize().unwrap_or_else(|_| cache.to_path_buf());
    let actual = running_dir
        .canonicalize()
        .unwrap_or_else(|_| running_dir.to_path_buf());
    let expected = cached_program_dir(&cache, &actual);

    if expected == actual {
        Ok(())
    } else {
        Err(SyncError::CacheLocationMismatch { expected, actual })
    }
}

/// Replaces `target` with a copy of `source`.
fn copy_dir(source: &Path, target: &Path) -> io::Result<()> {
    if target.exists() {
        std::fs::remove_dir_all(target)?;
    }

    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let destination = target.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&destination)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &destination)?;
        } else {
            std::fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(source: &Path, destination: &Path) -> io::Result<()> {
    let link = std::fs::read_link(source)?;
    std::os::unix::fs::symlink(link, destination)
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, destination: &Path) -> io::Result<()> {
    std::fs::copy(source, destination).map(|_| ())
}
