//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::error::StoreResult;
use crate::traits::store::StateStore;
use crate::types::config::{MonitorConfig, DEFAULT_MAX_VERSIONS};
use crate::types::version::PageVersion;

/// In-memory state store.
///
/// Each URL's history lives in one map entry, kept sorted newest first.
/// Appending and pruning happen under that entry's lock.
pub struct MemoryStore {
    data: DashMap<String, Value>,
    versions: DashMap<String, Vec<PageVersion>>,
    max_versions: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a store with the default retention bound.
    pub fn new() -> Self {
        Self::with_max_versions(DEFAULT_MAX_VERSIONS)
    }

    /// Create a store keeping at most `max_versions` snapshots per URL.
    pub fn with_max_versions(max_versions: usize) -> Self {
        Self {
            data: DashMap::new(),
            versions: DashMap::new(),
            max_versions,
        }
    }

    /// Create a store with the configured retention bound.
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::with_max_versions(config.max_versions)
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.data.clear();
        self.versions.clear();
    }

    /// Number of URLs with at least one snapshot.
    pub fn url_count(&self) -> usize {
        self.versions.len()
    }

    /// Number of snapshots held across all URLs.
    pub fn version_count(&self) -> usize {
        self.versions.iter().map(|entry| entry.value().len()).sum()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get_value(&self, key: &str) -> Option<Value> {
        self.data.get(key).map(|v| v.value().clone())
    }

    async fn set_value(&self, key: &str, value: Value) -> StoreResult<()> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_latest_version(&self, url: &str) -> Option<PageVersion> {
        self.versions
            .get(url)
            .and_then(|history| history.first().cloned())
    }

    async fn save_version(&self, version: &PageVersion) -> StoreResult<()> {
        version.validate()?;

        let mut history = self.versions.entry(version.url.clone()).or_default();
        // Equal timestamps go in front: the latest save reads as newest.
        let position = history.partition_point(|v| v.captured_at > version.captured_at);
        history.insert(position, version.clone());
        history.truncate(self.max_versions);

        Ok(())
    }

    async fn get_version_history(&self, url: &str, max_versions: usize) -> Vec<PageVersion> {
        self.versions
            .get(url)
            .map(|history| history.iter().take(max_versions).cloned().collect())
            .unwrap_or_default()
    }

    fn max_versions(&self) -> usize {
        self.max_versions
    }
}
