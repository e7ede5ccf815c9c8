//! Per-scan memo of registry answers.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// A stored registry answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedAnswer {
    pub exists: bool,
    /// The answer came from the conservative fallback.
    pub conservative: bool,
}

/// Thread-safe memo keyed by exact package name.
///
/// Each name owns a once-cell, so concurrent callers for an unknown name
/// share a single initialisation. Entries are never evicted.
#[derive(Debug, Clone, Default)]
pub struct RegistryCache {
    entries: Arc<DashMap<String, Arc<OnceCell<CachedAnswer>>>>,
}

impl RegistryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cell for a name, created empty on first use.
    pub fn slot(&self, package_name: &str) -> Arc<OnceCell<CachedAnswer>> {
        if let Some(slot) = self.entries.get(package_name) {
            return slot.clone();
        }
        self.entries
            .entry(package_name.to_string())
            .or_default()
            .clone()
    }

    /// A resolved answer, if any.
    pub fn get(&self, package_name: &str) -> Option<CachedAnswer> {
        self.entries
            .get(package_name)
            .and_then(|slot| slot.get().copied())
    }

    /// Number of resolved names.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
