//! Test infrastructure for git-pull-indep integration tests.
#![allow(dead_code)]

use anyhow::Result;
use git_pull_indep::config::RunConfig;
use git_pull_indep::constants::STATUS_FILE;
use git_pull_indep::git::run_git;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary git repository for testing, optionally with a bare `origin`.
/// Automatically cleaned up when dropped.
pub struct TestRepo {
    _temp_dir: TempDir,
    path: PathBuf,
    remote: Option<TempDir>,
}

impl TestRepo {
    /// Creates a new test repository with an initial commit on the master branch.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("work");
        std::fs::create_dir_all(&path)?;

        init_repo(&path)?;
        std::fs::write(path.join("README.md"), "# Test Repo\n")?;
        run_git(&path, &["add", "README.md"])?;
        run_git(&path, &["commit", "-m", "Initial commit"])?;

        Ok(Self {
            _temp_dir: temp_dir,
            path,
            remote: None,
        })
    }

    /// Creates a test repository whose master branch tracks a bare `origin`.
    pub fn with_remote() -> Result<Self> {
        let remote_dir = TempDir::new()?;
        run_git(remote_dir.path(), &["init", "--bare", "-b", "master"])?;

        let mut local = Self::new()?;
        run_git(
            &local.path,
            &["remote", "add", "origin", path_str(remote_dir.path())],
        )?;
        run_git(&local.path, &["push", "-u", "origin", "master"])?;

        local.remote = Some(remote_dir);
        Ok(local)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remote_path(&self) -> &Path {
        self.remote
            .as_ref()
            .expect("test repo has no remote")
            .path()
    }

    pub fn config(&self) -> RunConfig {
        RunConfig::new(&self.path, &self.path)
    }

    pub fn git(&self, args: &[&str]) -> Result<String> {
        Ok(run_git(&self.path, args)?)
    }

    pub fn create_branch(&self, name: &str) -> Result<()> {
        self.git(&["branch", name])?;
        Ok(())
    }

    /// Modifies a tracked file.
    pub fn make_dirty(&self) -> Result<()> {
        std::fs::write(self.path.join("README.md"), "# Local edit\n")?;
        Ok(())
    }

    pub fn make_untracked(&self) -> Result<()> {
        std::fs::write(self.path.join("untracked.txt"), "scratch\n")?;
        Ok(())
    }

    pub fn has_stash(&self) -> Result<bool> {
        Ok(!self.git(&["stash", "list"])?.is_empty())
    }

    pub fn file_exists(&self, name: &str) -> bool {
        self.path.join(name).exists()
    }

    pub fn read_file(&self, name: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.path.join(name))?)
    }

    pub fn read_status(&self) -> Result<String> {
        self.read_file(STATUS_FILE)
    }

    pub fn head(&self) -> Result<String> {
        self.git(&["rev-parse", "HEAD"])
    }

    /// Opens a second clone of `origin` to make changes "someone else" pushes.
    pub fn upstream_clone(&self) -> Result<UpstreamClone> {
        UpstreamClone::new(self.remote_path())
    }
}

/// A throwaway clone of the remote used to push commits upstream.
pub struct UpstreamClone {
    _temp_dir: TempDir,
    path: PathBuf,
}

impl UpstreamClone {
    fn new(remote: &Path) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("upstream");
        run_git(
            temp_dir.path(),
            &["clone", "-b", "master", path_str(remote), path_str(&path)],
        )?;
        set_identity(&path)?;
        Ok(Self {
            _temp_dir: temp_dir,
            path,
        })
    }

    pub fn git(&self, args: &[&str]) -> Result<String> {
        Ok(run_git(&self.path, args)?)
    }

    /// Commits a file on the current branch and pushes it.
    pub fn push_commit(&self, file: &str, content: &str) -> Result<()> {
        std::fs::write(self.path.join(file), content)?;
        self.git(&["add", file])?;
        self.git(&["commit", "-m", &format!("Update {}", file)])?;
        self.git(&["push", "origin", "HEAD"])?;
        Ok(())
    }

    /// Points the gitlink at `path` to `commit` without checking it out.
    pub fn push_gitlink(&self, path: &str, commit: &str) -> Result<()> {
        let cacheinfo = format!("160000,{},{}", commit, path);
        self.git(&["update-index", "--cacheinfo", &cacheinfo])?;
        self.git(&["commit", "-m", &format!("Bump {}", path)])?;
        self.git(&["push", "origin", "HEAD"])?;
        Ok(())
    }
}

/// A standalone repository with two commits, used as a submodule source.
pub struct SubmoduleSource {
    _temp_dir: TempDir,
    pub path: PathBuf,
    pub first: String,
    pub second: String,
}

impl SubmoduleSource {
    pub fn new(name: &str) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join(name);
        std::fs::create_dir_all(&path)?;
        init_repo(&path)?;

        std::fs::write(path.join("lib.txt"), "v1\n")?;
        run_git(&path, &["add", "lib.txt"])?;
        run_git(&path, &["commit", "-m", "v1"])?;
        let first = run_git(&path, &["rev-parse", "HEAD"])?;

        std::fs::write(path.join("lib.txt"), "v2\n")?;
        run_git(&path, &["commit", "-am", "v2"])?;
        let second = run_git(&path, &["rev-parse", "HEAD"])?;

        Ok(Self {
            _temp_dir: temp_dir,
            path,
            first,
            second,
        })
    }
}

/// Adds `source` as a submodule at `sub_path`, pinned to its first commit,
/// commits and pushes.
///
/// The submodule is cloned with a plain `git clone` and then registered, so
/// no submodule transport of local paths is needed. The clone holds both
/// commits, so later updates to the second one need no fetch.
pub fn add_submodule(repo: &TestRepo, source: &SubmoduleSource, sub_path: &str) -> Result<()> {
    let target = repo.path().join(sub_path);
    run_git(
        repo.path(),
        &["clone", path_str(&source.path), path_str(&target)],
    )?;
    run_git(&target, &["checkout", "--detach", &source.first])?;
    repo.git(&["submodule", "add", path_str(&source.path), sub_path])?;
    repo.git(&["commit", "-m", &format!("Add submodule {}", sub_path)])?;
    if repo.remote.is_some() {
        repo.git(&["push", "origin", "master"])?;
    }
    Ok(())
}

fn init_repo(path: &Path) -> Result<()> {
    run_git(path, &["init", "-b", "master"])?;
    set_identity(path)
}

fn set_identity(path: &Path) -> Result<()> {
    run_git(path, &["config", "user.email", "test@example.com"])?;
    run_git(path, &["config", "user.name", "Test User"])?;
    Ok(())
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are valid UTF-8")
}
