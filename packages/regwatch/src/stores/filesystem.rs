//! Filesystem storage implementation.
//!
//! Layout under the base directory:
//!
//! ```text
//! data/<name(key)>.json                          generic key/value
//! versions/<name(url)>/<yyyymmddHHMMSS>.json     version metadata
//! versions/<name(url)>/<stamp>.content.txt       raw content (optional)
//! versions/<name(url)>/<stamp>.text.txt          plain text (optional)
//! ```
//!
//! Names are unpadded base64url; stamps sort chronologically by filename.
//! Two captures of one URL within the same second share a stamp and the
//! later write replaces the earlier one.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::StoreResult;
use crate::traits::store::{or_absent, StateStore};
use crate::types::config::{MonitorConfig, DEFAULT_MAX_VERSIONS};
use crate::types::version::PageVersion;

/// Longest encoded name used as-is; longer ones are hashed.
const MAX_NAME_LEN: usize = 200;

const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const METADATA_EXT: &str = ".json";
const CONTENT_EXT: &str = ".content.txt";
const TEXT_EXT: &str = ".text.txt";

/// Filesystem-safe name for a key or URL.
pub fn safe_name(raw: &str) -> String {
    let encoded = URL_SAFE_NO_PAD.encode(raw.as_bytes());
    if encoded.len() <= MAX_NAME_LEN {
        encoded
    } else {
        format!("h-{}", hex::encode(Sha256::digest(raw.as_bytes())))
    }
}

/// File-based state store.
///
/// Writers to the same URL are serialised by a per-URL async mutex, so
/// append + prune cannot interleave. A URL's mutex is dropped once no
/// writer holds or waits on it.
pub struct FilesystemStore {
    base: PathBuf,
    max_versions: usize,
    url_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FilesystemStore {
    /// Open (creating if needed) a store rooted at `base`.
    pub async fn new(base: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::with_max_versions(base, DEFAULT_MAX_VERSIONS).await
    }

    /// Open a store keeping at most `max_versions` snapshots per URL.
    pub async fn with_max_versions(
        base: impl Into<PathBuf>,
        max_versions: usize,
    ) -> StoreResult<Self> {
        let base = base.into();
        fs::create_dir_all(base.join("data")).await?;
        fs::create_dir_all(base.join("versions")).await?;

        Ok(Self {
            base,
            max_versions,
            url_locks: DashMap::new(),
        })
    }

    /// Open a store with the configured retention bound.
    pub async fn from_config(base: impl Into<PathBuf>, config: &MonitorConfig) -> StoreResult<Self> {
        Self::with_max_versions(base, config.max_versions).await
    }

    /// Root directory of the store.
    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    fn data_path(&self, key: &str) -> PathBuf {
        self.base
            .join("data")
            .join(format!("{}{METADATA_EXT}", safe_name(key)))
    }

    /// Directory holding a URL's snapshots.
    pub fn version_dir(&self, url: &str) -> PathBuf {
        self.base.join("versions").join(safe_name(url))
    }

    fn url_lock(&self, url: &str) -> Arc<Mutex<()>> {
        self.url_locks
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn read_value(&self, key: &str) -> StoreResult<Option<Value>> {
        match fs::read_to_string(self.data_path(key)).await {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_history(&self, url: &str, max_versions: usize) -> StoreResult<Vec<PageVersion>> {
        let dir = self.version_dir(url);
        let stamps = list_stamps(&dir).await?;

        let mut history = Vec::with_capacity(stamps.len().min(max_versions));
        for stamp in stamps.iter().take(max_versions) {
            history.push(load_version(&dir, stamp).await?);
        }
        Ok(history)
    }

    async fn write_version(&self, version: &PageVersion) -> StoreResult<()> {
        let dir = self.version_dir(&version.url);
        fs::create_dir_all(&dir).await?;

        let stamp = version.captured_at.format(STAMP_FORMAT).to_string();

        write_or_remove(
            &dir.join(format!("{stamp}{CONTENT_EXT}")),
            version.full_content.as_deref(),
        )
        .await?;
        write_or_remove(
            &dir.join(format!("{stamp}{TEXT_EXT}")),
            version.text_content.as_deref(),
        )
        .await?;

        // Metadata last: a version exists once its .json does.
        let metadata = serde_json::to_string_pretty(&version.without_payloads())?;
        fs::write(dir.join(format!("{stamp}{METADATA_EXT}")), metadata).await?;

        self.prune(&dir).await
    }

    async fn prune(&self, dir: &Path) -> StoreResult<()> {
        let stamps = list_stamps(dir).await?;
        for stamp in stamps.iter().skip(self.max_versions) {
            for ext in [METADATA_EXT, CONTENT_EXT, TEXT_EXT] {
                remove_if_exists(&dir.join(format!("{stamp}{ext}"))).await?;
            }
            tracing::debug!(dir = %dir.display(), stamp = %stamp, "Pruned version");
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for FilesystemStore {
    async fn get_value(&self, key: &str) -> Option<Value> {
        or_absent("get_value", key, self.read_value(key).await)
    }

    async fn set_value(&self, key: &str, value: Value) -> StoreResult<()> {
        let encoded = serde_json::to_string_pretty(&value)?;
        fs::write(self.data_path(key), encoded).await?;
        Ok(())
    }

    async fn get_latest_version(&self, url: &str) -> Option<PageVersion> {
        let history = or_absent("get_latest_version", url, self.read_history(url, 1).await);
        history.into_iter().next()
    }

    async fn save_version(&self, version: &PageVersion) -> StoreResult<()> {
        version.validate()?;

        let lock = self.url_lock(&version.url);
        let result = {
            let _guard = lock.lock().await;
            self.write_version(version).await
        };

        // Only the map and this call hold it: no writer is waiting.
        self.url_locks
            .remove_if(&version.url, |_, l| Arc::strong_count(l) == 2);
        result
    }

    async fn get_version_history(&self, url: &str, max_versions: usize) -> Vec<PageVersion> {
        or_absent(
            "get_version_history",
            url,
            self.read_history(url, max_versions).await,
        )
    }

    fn max_versions(&self) -> usize {
        self.max_versions
    }
}

/// Snapshot stamps in a version directory, newest first.
async fn list_stamps(dir: &Path) -> StoreResult<Vec<String>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut stamps = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if let Some(stamp) = name.to_str().and_then(|n| n.strip_suffix(METADATA_EXT)) {
            stamps.push(stamp.to_string());
        }
    }

    stamps.sort_unstable_by(|a, b| b.cmp(a));
    Ok(stamps)
}

async fn load_version(dir: &Path, stamp: &str) -> StoreResult<PageVersion> {
    let raw = fs::read_to_string(dir.join(format!("{stamp}{METADATA_EXT}"))).await?;
    let mut version: PageVersion = serde_json::from_str(&raw)?;
    version.full_content = read_optional(&dir.join(format!("{stamp}{CONTENT_EXT}"))).await?;
    version.text_content = read_optional(&dir.join(format!("{stamp}{TEXT_EXT}"))).await?;
    Ok(version)
}

async fn read_optional(path: &Path) -> StoreResult<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_or_remove(path: &Path, content: Option<&str>) -> StoreResult<()> {
    match content {
        Some(content) => Ok(fs::write(path, content).await?),
        None => remove_if_exists(path).await,
    }
}

async fn remove_if_exists(path: &Path) -> StoreResult<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
