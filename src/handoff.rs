//! Terminal transfer of control.
//!
//! Replacing the process image is the last thing a run does: nothing in this
//! process executes afterwards, so the status write and any directory
//! restoration must already have happened when these functions are called.
//! They return only when the replacement itself failed.

use std::io;
use std::path::Path;
use std::process::Command;

/// Replaces the current process with `command`.
///
/// On Unix this is `exec`. Elsewhere the command is run to completion and the
/// process exits with its code, which looks the same to the caller.
#[cfg(unix)]
pub fn replace_process(command: &mut Command) -> io::Error {
    use std::os::unix::process::CommandExt;
    command.exec()
}

#[cfg(not(unix))]
pub fn replace_process(command: &mut Command) -> io::Error {
    match command.status() {
        Ok(status) => std::process::exit(status.code().unwrap_or(1)),
        Err(err) => err,
    }
}

/// Hands control to the initiator, whatever the outcome of the run.
pub fn hand_off_to_initiator(initiator: &Path) -> io::Error {
    tracing::info!("Handing off to initiator: {}", initiator.display());
    replace_process(&mut Command::new(initiator))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_off_to_missing_initiator_returns_error() {
        let err = hand_off_to_initiator(Path::new("/definitely/not/an/initiator"));
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
