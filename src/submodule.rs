//! Submodule discovery and change detection.
//!
//! Commit lookups are best effort: anything that cannot be read is recorded
//! as [`SubmoduleCommit::Unknown`] and treated as needing an update.

use crate::constants::{GIT_DIR, GITMODULES_FILE};
use crate::git::{self, GitResult};
use std::path::{Path, PathBuf};

/// A submodule declared in `.gitmodules`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submodule {
    pub name: String,
    /// Path relative to the superproject root.
    pub path: PathBuf,
}

/// Checked-out commit of a submodule at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmoduleCommit {
    Known(String),
    Unknown,
}

/// Commits of every declared submodule, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmoduleSnapshot {
    entries: Vec<(String, SubmoduleCommit)>,
}

impl SubmoduleSnapshot {
    /// Reads the current commit of each submodule under `repo`.
    pub fn capture(repo: &Path, submodules: &[Submodule]) -> Self {
        let entries = submodules
            .iter()
            .map(|submodule| {
                let commit = read_commit(repo, submodule);
                if commit == SubmoduleCommit::Unknown {
                    tracing::debug!(
                        "Commit of submodule {} unknown, assuming it needs an update",
                        submodule.name
                    );
                }
                (submodule.name.clone(), commit)
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&SubmoduleCommit> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, commit)| commit)
    }

    /// Names whose commit changed between `self` (before) and `after`.
    ///
    /// A submodule whose commit is unknown afterwards is always reported.
    #[must_use]
    pub fn updated_since(&self, after: &SubmoduleSnapshot) -> Vec<String> {
        after
            .entries
            .iter()
            .filter(|(name, after_commit)| match after_commit {
                SubmoduleCommit::Unknown => true,
                SubmoduleCommit::Known(_) => self.get(name) != Some(after_commit),
            })
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Submodules declared by the repository. Missing `.gitmodules` means none.
pub fn list(repo: &Path) -> GitResult<Vec<Submodule>> {
    if !repo.join(GITMODULES_FILE).is_file() {
        return Ok(Vec::new());
    }
    let entries =
        git::config_file_entries(repo, GITMODULES_FILE, r"^submodule\..*\.path$")?;
    Ok(entries.iter().filter_map(|line| parse_path_entry(line)).collect())
}

/// Parses `submodule.<name>.path <path>`.
fn parse_path_entry(line: &str) -> Option<Submodule> {
    let (key, path) = line.split_once(' ')?;
    let name = key.strip_prefix("submodule.")?.strip_suffix(".path")?;
    Some(Submodule {
        name: name.to_string(),
        path: PathBuf::from(path.trim()),
    })
}

fn read_commit(repo: &Path, submodule: &Submodule) -> SubmoduleCommit {
    let dir = repo.join(&submodule.path);
    // An uninitialized submodule directory would resolve to the superproject.
    if !dir.join(GIT_DIR).exists() {
        return SubmoduleCommit::Unknown;
    }
    match git::get_current_commit(&dir) {
        Ok(hash) => SubmoduleCommit::Known(hash),
        Err(err) => {
            tracing::debug!("Failed to read commit of submodule {}: {}", submodule.name, err);
            SubmoduleCommit::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entries: &[(&str, Option<&str>)]) -> SubmoduleSnapshot {
        SubmoduleSnapshot {
            entries: entries
                .iter()
                .map(|(name, hash)| {
                    let commit = match hash {
                        Some(h) => SubmoduleCommit::Known((*h).to_string()),
                        None => SubmoduleCommit::Unknown,
                    };
                    ((*name).to_string(), commit)
                })
                .collect(),
        }
    }

    #[test]
    fn test_parse_path_entry() {
        assert_eq!(
            parse_path_entry("submodule.libs/core.path vendor/core"),
            Some(Submodule {
                name: "libs/core".to_string(),
                path: PathBuf::from("vendor/core"),
            })
        );
        assert_eq!(parse_path_entry("submodule.x.url https://example"), None);
        assert_eq!(parse_path_entry("garbage"), None);
    }

    #[test]
    fn test_updated_since_reports_only_changed_commits() {
        let before = snapshot(&[("a", Some("111")), ("b", Some("222"))]);
        let after = snapshot(&[("a", Some("111")), ("b", Some("333"))]);
        assert_eq!(before.updated_since(&after), vec!["b".to_string()]);
    }

    #[test]
    fn test_updated_since_over_reports_unknown_commits() {
        let before = snapshot(&[("a", None), ("b", Some("222")), ("c", Some("444"))]);
        let after = snapshot(&[("a", Some("111")), ("b", None), ("c", Some("444"))]);
        assert_eq!(
            before.updated_since(&after),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
