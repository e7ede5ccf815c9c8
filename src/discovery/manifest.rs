//! package.json loading.

use crate::types::DeclaredSet;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Dependency tables whose keys count as declared.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    #[serde(default)]
    private: Option<bool>,
    #[serde(default)]
    dependencies: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    dev_dependencies: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    peer_dependencies: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    optional_dependencies: Option<BTreeMap<String, serde_json::Value>>,
}

/// Lockfile found next to the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockfileKind {
    Npm,
    Yarn,
    Pnpm,
}

impl LockfileKind {
    pub fn file_name(self) -> &'static str {
        match self {
            LockfileKind::Npm => "package-lock.json",
            LockfileKind::Yarn => "yarn.lock",
            LockfileKind::Pnpm => "pnpm-lock.yaml",
        }
    }
}

/// What the scan needs to know about a project manifest.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// Union of all dependency table keys.
    pub declared: DeclaredSet,
    /// Whether a package.json was found and parsed.
    pub found: bool,
    /// `"private": true` in package.json.
    pub private: bool,
    pub lockfile: Option<LockfileKind>,
}

impl Manifest {
    /// Load `package.json` from a project root.
    ///
    /// A missing or malformed manifest yields an empty declared set.
    pub async fn load(project_root: &Path) -> Self {
        let lockfile = detect_lockfile(project_root).await;
        let path = project_root.join("package.json");

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                debug!("No manifest at {}: {}", path.display(), e);
                return Self {
                    lockfile,
                    ..Self::default()
                };
            }
        };

        match Self::parse(&text) {
            Some(mut manifest) => {
                manifest.lockfile = lockfile;
                debug!(
                    "Loaded {} declared dependencies from {}",
                    manifest.declared.len(),
                    path.display()
                );
                manifest
            }
            None => {
                warn!(
                    "Could not parse {}, treating all references as undeclared",
                    path.display()
                );
                Self {
                    lockfile,
                    ..Self::default()
                }
            }
        }
    }

    /// Parse manifest text; `None` when it is not a JSON object.
    pub fn parse(text: &str) -> Option<Self> {
        let package: PackageJson = serde_json::from_str(text).ok()?;

        let declared = [
            package.dependencies,
            package.dev_dependencies,
            package.peer_dependencies,
            package.optional_dependencies,
        ]
        .into_iter()
        .flatten()
        .flat_map(|table| table.into_keys())
        .collect();

        Some(Self {
            declared,
            found: true,
            private: package.private.unwrap_or(false),
            lockfile: None,
        })
    }
}

async fn detect_lockfile(project_root: &Path) -> Option<LockfileKind> {
    for kind in [LockfileKind::Npm, LockfileKind::Yarn, LockfileKind::Pnpm] {
        if tokio::fs::try_exists(project_root.join(kind.file_name()))
            .await
            .unwrap_or(false)
        {
            return Some(kind);
        }
    }
    None
}
