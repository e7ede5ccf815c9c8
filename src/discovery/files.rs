//! File lists, repository walking and reading sources.

use crate::types::{Result, Source};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

/// Extensions parsed as JavaScript/TypeScript before the text scan.
const STRUCTURED_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs"];

/// Extensions of text files where install commands and imports show up:
/// docs, CI workflows, compose files and shell scripts.
const TEXT_EXTENSIONS: &[&str] = &["md", "yml", "yaml", "sh", "bash"];

/// Directories never worth walking into.
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "dist", "build", "coverage", ".next"];

/// Whether a path should be parsed as JS/TS.
pub fn is_structured_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| STRUCTURED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Whether a repository file belongs to the scan set.
fn is_scan_candidate(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    // Dockerfile, Dockerfile.dev, api.Dockerfile
    if file_name.starts_with("Dockerfile") || file_name.ends_with(".Dockerfile") {
        return true;
    }

    if is_structured_path(path) {
        return true;
    }

    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| SKIPPED_DIRS.contains(&name))
            .unwrap_or(false)
}

/// Collect scan candidates under a repository root, in a stable order.
pub fn collect_repo_files(root: &Path) -> Vec<PathBuf> {
    let files: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_scan_candidate(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    debug!("Collected {} candidate files under {}", files.len(), root.display());
    files
}

/// Read a newline-delimited list of files; blank lines are ignored.
pub async fn read_file_list(list_path: &Path) -> Result<Vec<PathBuf>> {
    let content = tokio::fs::read_to_string(list_path).await?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Read files into sources; read failures become unreadable sources.
///
/// Source ids are relative to `root` when the path lies beneath it.
pub async fn read_sources(paths: &[PathBuf], root: Option<&Path>) -> Vec<Source> {
    let mut sources = Vec::with_capacity(paths.len());

    for path in paths {
        let id = root
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path.as_path())
            .to_string_lossy()
            .into_owned();

        let source = match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                trace!("Read {} ({} bytes)", id, content.len());
                Source::text(id, content, is_structured_path(path))
            }
            Err(e) => Source::unreadable(id, e.to_string()),
        };
        sources.push(source);
    }

    sources
}
