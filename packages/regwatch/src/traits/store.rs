//! Versioned state storage.
//!
//! One trait covers both halves of persistence:
//! - a generic JSON key/value area with no versioning
//! - a per-URL snapshot history with bounded retention
//!
//! Every backend keeps at most [`StateStore::max_versions`] snapshots per URL,
//! newest first by capture time, and makes append + prune atomic per URL.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::StoreResult;
use crate::types::version::PageVersion;

/// Storage backend for key/value data and page version history.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read a raw JSON value. Absent keys and read failures yield `None`.
    async fn get_value(&self, key: &str) -> Option<Value>;

    /// Store a raw JSON value, replacing any previous one.
    async fn set_value(&self, key: &str, value: Value) -> StoreResult<()>;

    /// Most recent snapshot for a URL. Read failures yield `None`.
    async fn get_latest_version(&self, url: &str) -> Option<PageVersion>;

    /// Append a snapshot and prune the URL's history to the retention bound.
    ///
    /// Fails with `StoreError::InvalidArgument` when the version has no url
    /// or content hash.
    async fn save_version(&self, version: &PageVersion) -> StoreResult<()>;

    /// Up to `max_versions` snapshots for a URL, newest first.
    /// Read failures yield an empty history.
    async fn get_version_history(&self, url: &str, max_versions: usize) -> Vec<PageVersion>;

    /// Retention bound applied on every save.
    fn max_versions(&self) -> usize;
}

/// Typed access to the key/value area.
#[async_trait]
pub trait KeyValueExt: StateStore {
    /// Read and decode a value. Undecodable values read as absent.
    async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned + Send,
    {
        let value = self.get_value(key).await?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Stored value has unexpected shape");
                None
            }
        }
    }

    /// Read a value, falling back to `T::default()`.
    async fn get_or_default<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default + Send,
    {
        self.get(key).await.unwrap_or_default()
    }

    /// Encode and store a value.
    async fn set<T>(&self, key: &str, value: &T) -> StoreResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let encoded = serde_json::to_value(value)?;
        self.set_value(key, encoded).await
    }
}

impl<S: StateStore + ?Sized> KeyValueExt for S {}

/// Collapse a failed read into its absent value, logging the failure.
pub(crate) fn or_absent<T: Default>(op: &str, key: &str, result: StoreResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(op = op, key = %key, error = %e, "Store read failed, treating as absent");
            T::default()
        }
    }
}
