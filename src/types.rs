//! Core types and errors for the dependency confusion scanner.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised by the collaborators around the scan engine.
///
/// The engine itself never fails: unreadable sources, parse failures and
/// registry errors all degrade to a classification.
#[derive(Error, Debug)]
pub enum DepconfuseError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error("AST parse error: {0}")]
    AstParseError(String),

    #[error("Git error: {0}")]
    GitError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, DepconfuseError>;

/// Names the project intentionally depends on.
pub type DeclaredSet = HashSet<String>;

/// Synthetic source id used for the declared names of a manifest.
pub const DECLARED_MANIFEST_SOURCE: &str = "declared-manifest";

/// A unit of input handed to the engine by the file access layer.
#[derive(Debug, Clone)]
pub struct Source {
    /// File path or synthetic identifier.
    pub id: String,
    pub content: SourceContent,
    /// Whether the content should be parsed as JS/TS before the text scan.
    pub structured: bool,
}

/// What the file access layer managed to produce for a source.
#[derive(Debug, Clone)]
pub enum SourceContent {
    /// Raw text to extract references from.
    Text(String),
    /// Names that are already known, skipping extraction.
    Specifiers(Vec<String>),
    /// The source could not be read.
    Unreadable(String),
}

impl Source {
    /// A text source.
    pub fn text(id: impl Into<String>, content: impl Into<String>, structured: bool) -> Self {
        Self {
            id: id.into(),
            content: SourceContent::Text(content.into()),
            structured,
        }
    }

    /// A source whose read failed.
    pub fn unreadable(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: SourceContent::Unreadable(reason.into()),
            structured: false,
        }
    }

    /// Synthetic source listing every declared name, sorted.
    pub fn declared_manifest(declared: &DeclaredSet) -> Self {
        let mut names: Vec<String> = declared.iter().cloned().collect();
        names.sort();
        Self {
            id: DECLARED_MANIFEST_SOURCE.to_string(),
            content: SourceContent::Specifiers(names),
            structured: false,
        }
    }
}

/// Where a registry answer came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Answered by a live registry query during this call.
    Live,
    /// Served from the per-scan cache.
    Cached,
    /// Live query failed or was ambiguous; conservative answer applied.
    Fallback,
}

/// Answer to "does this name exist on the public registry?".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExistenceResult {
    pub exists: bool,
    pub provenance: Provenance,
    /// Set when the answer stems from the conservative fallback, even when
    /// later served from cache.
    pub conservative: bool,
}

/// Classification of a (source, specifier) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCategory {
    /// Not declared, but a public package of that name exists.
    UndeclaredAndPublic,
    /// Registry answer was ambiguous and the operator asked to see those.
    RegistryUnresolved,
    /// Not declared and not on the registry.
    UndeclaredPrivate,
    /// The source could not be read.
    UnreadableSource,
    /// Declared, and also published publicly.
    DeclaredAndPublic,
}

impl FindingCategory {
    /// Sort rank, most severe first.
    pub fn rank(self) -> u8 {
        match self {
            FindingCategory::UndeclaredAndPublic => 0,
            FindingCategory::RegistryUnresolved => 1,
            FindingCategory::UndeclaredPrivate => 2,
            FindingCategory::UnreadableSource => 3,
            FindingCategory::DeclaredAndPublic => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FindingCategory::UndeclaredAndPublic => "UNDECLARED_AND_PUBLIC",
            FindingCategory::RegistryUnresolved => "REGISTRY_UNRESOLVED",
            FindingCategory::UndeclaredPrivate => "UNDECLARED_PRIVATE",
            FindingCategory::UnreadableSource => "UNREADABLE_SOURCE",
            FindingCategory::DeclaredAndPublic => "DECLARED_AND_PUBLIC",
        }
    }
}

/// A classified reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    /// Where the specifier was found.
    pub source: String,
    /// Absent for `UNREADABLE_SOURCE`.
    pub specifier: Option<String>,
    pub category: FindingCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Result of a whole scan, handed to the reporting layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    /// Findings ordered by severity, then specifier.
    pub findings: Vec<Finding>,
    /// Number of sources processed, unreadable ones included.
    pub sources_scanned: usize,
    /// Number of external (source, specifier) pairs classified.
    pub candidates_checked: usize,
}

impl ScanReport {
    /// Number of findings in a category.
    pub fn count(&self, category: FindingCategory) -> usize {
        self.findings.iter().filter(|f| f.category == category).count()
    }
}
