//! Repository acquisition: local paths pass through, URLs are shallow-cloned.

use crate::types::{DepconfuseError, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

/// A repository ready to be scanned.
///
/// Clones live in a temporary directory removed when this is dropped.
#[derive(Debug)]
pub struct RepoCheckout {
    root: PathBuf,
    temp: Option<TempDir>,
}

impl RepoCheckout {
    /// Use a local path as-is or clone a remote repository.
    pub async fn acquire(repo_or_path: &str, token: Option<&str>) -> Result<Self> {
        if !is_remote(repo_or_path) {
            let root = PathBuf::from(repo_or_path);
            if !root.is_dir() {
                return Err(DepconfuseError::ConfigError(format!(
                    "{} is not a directory",
                    root.display()
                )));
            }
            return Ok(Self { root, temp: None });
        }

        let temp = tempfile::Builder::new().prefix("depconfuse-").tempdir()?;
        let clone_url = with_token(repo_or_path, token);

        info!("Cloning {} into {}", repo_or_path, temp.path().display());
        let output = Command::new("git")
            .args(["clone", "--depth", "1", "--quiet"])
            .arg(&clone_url)
            .arg(temp.path())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = match token {
                Some(token) if !token.is_empty() => stderr.replace(token, "***"),
                _ => stderr.into_owned(),
            };
            return Err(DepconfuseError::GitError(format!(
                "clone of {} failed: {}",
                repo_or_path,
                stderr.trim()
            )));
        }

        debug!("Clone of {} complete", repo_or_path);
        Ok(Self {
            root: temp.path().to_path_buf(),
            temp: Some(temp),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the checkout is a temporary clone.
    pub fn is_clone(&self) -> bool {
        self.temp.is_some()
    }
}

/// URLs and `.git` remotes are cloned; everything else is a local path.
fn is_remote(repo_or_path: &str) -> bool {
    repo_or_path.starts_with("http://")
        || repo_or_path.starts_with("https://")
        || repo_or_path.starts_with("git@")
        || repo_or_path.ends_with(".git")
}

/// Inject a token as the user of an HTTPS clone URL.
fn with_token(repo_url: &str, token: Option<&str>) -> String {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return repo_url.to_string();
    };

    match Url::parse(repo_url) {
        Ok(mut url) if url.scheme() == "https" => {
            if url.set_username(token).is_ok() {
                url.to_string()
            } else {
                repo_url.to_string()
            }
        }
        _ => repo_url.to_string(),
    }
}
