//! Git repository synchronizer.
//!
//! This crate brings a git working copy up to date with its remote by:
//! - Stashing uncommitted changes (untracked files included)
//! - Optionally switching to a requested branch, creating it if needed
//! - Pulling from `origin`
//! - Updating submodules recursively and reporting which ones moved
//! - Restoring the stash when nothing was pulled
//! - Writing a status record for the caller to read

pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod git;
pub mod handoff;
pub mod logging;
pub mod output;
pub mod repo;
pub mod status;
pub mod submodule;
