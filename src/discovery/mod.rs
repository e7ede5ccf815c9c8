//! Source discovery around the scan engine.
//!
//! This module handles:
//! - Repository checkout (local path or shallow clone)
//! - Collecting and reading files to scan
//! - Loading declared dependencies from package.json

pub mod files;
pub mod git;
pub mod manifest;

pub use files::{collect_repo_files, is_structured_path, read_file_list, read_sources};
pub use git::RepoCheckout;
pub use manifest::{LockfileKind, Manifest};
