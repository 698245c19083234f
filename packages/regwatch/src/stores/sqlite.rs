//! SQLite storage implementation.
//!
//! A file-based relational backend. Good for:
//! - Single-node deployments
//! - Audit queries over version history with plain SQL
//! - Testing with persistent data
//!
//! Timestamps are stored as RFC 3339 strings with nanosecond precision and
//! a `Z` suffix, so lexical order on `CapturedAt` is chronological.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::collections::HashMap;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::{or_absent, StateStore};
use crate::types::change::ChangeType;
use crate::types::config::{MonitorConfig, DEFAULT_MAX_VERSIONS};
use crate::types::version::PageVersion;

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(Box::new(e))
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// SQLite-based state store.
pub struct SqliteStore {
    pool: SqlitePool,
    max_versions: usize,
}

impl SqliteStore {
    /// Create a new SQLite store with the given connection URL.
    ///
    /// # Example URLs
    /// - `sqlite::memory:` - In-memory database (ephemeral)
    /// - `sqlite://./regwatch.db?mode=rwc` - Create if not exists
    pub async fn new(database_url: &str) -> StoreResult<Self> {
        Self::connect(database_url, 5, DEFAULT_MAX_VERSIONS).await
    }

    /// Connect with the configured retention bound.
    pub async fn from_config(database_url: &str, config: &MonitorConfig) -> StoreResult<Self> {
        Self::connect(database_url, 5, config.max_versions).await
    }

    /// Create an in-memory SQLite store (for testing).
    ///
    /// Uses a single connection: each in-memory connection is its own database.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::connect("sqlite::memory:", 1, DEFAULT_MAX_VERSIONS).await
    }

    /// Set the retention bound.
    pub fn with_max_versions(mut self, max_versions: usize) -> Self {
        self.max_versions = max_versions;
        self
    }

    async fn connect(
        database_url: &str,
        max_connections: u32,
        max_versions: usize,
    ) -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(db_err)?;

        let store = Self { pool, max_versions };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run database migrations.
    async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS KeyValueData (
                Key TEXT PRIMARY KEY,
                Value TEXT NOT NULL,
                UpdatedAt TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS PageVersions (
                Id INTEGER PRIMARY KEY AUTOINCREMENT,
                Url TEXT NOT NULL,
                Hash TEXT NOT NULL,
                CapturedAt TEXT NOT NULL,
                ChangeType TEXT NOT NULL,
                Summary TEXT NOT NULL DEFAULT '',
                Metadata TEXT NOT NULL DEFAULT '{}',
                FullContent TEXT,
                TextContent TEXT
            );

            CREATE INDEX IF NOT EXISTS IX_PageVersions_Url_CapturedAt
                ON PageVersions(Url, CapturedAt);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn read_value(&self, key: &str) -> StoreResult<Option<Value>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT Value FROM KeyValueData WHERE Key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match row {
            Some((raw,)) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn read_history(&self, url: &str, max_versions: usize) -> StoreResult<Vec<PageVersion>> {
        let rows = sqlx::query_as::<_, VersionRow>(
            r#"
            SELECT Url AS url, Hash AS hash, CapturedAt AS captured_at,
                   ChangeType AS change_type, Summary AS summary, Metadata AS metadata,
                   FullContent AS full_content, TextContent AS text_content
            FROM PageVersions
            WHERE Url = ?
            ORDER BY CapturedAt DESC, Id DESC
            LIMIT ?
            "#,
        )
        .bind(url)
        .bind(max_versions as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(VersionRow::into_version).collect()
    }
}

// Row types for sqlx queries
#[derive(Debug, FromRow)]
struct VersionRow {
    url: String,
    hash: String,
    captured_at: String,
    change_type: String,
    summary: String,
    metadata: String,
    full_content: Option<String>,
    text_content: Option<String>,
}

impl VersionRow {
    fn into_version(self) -> StoreResult<PageVersion> {
        let captured_at = DateTime::parse_from_rfc3339(&self.captured_at)
            .map_err(|e| StoreError::Database(format!("Invalid date: {}", e).into()))?
            .with_timezone(&Utc);

        let metadata: HashMap<String, String> = serde_json::from_str(&self.metadata)?;

        Ok(PageVersion {
            url: self.url,
            content_hash: self.hash,
            captured_at,
            change_type: ChangeType::parse(&self.change_type),
            summary: self.summary,
            metadata,
            full_content: self.full_content,
            text_content: self.text_content,
        })
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn get_value(&self, key: &str) -> Option<Value> {
        or_absent("get_value", key, self.read_value(key).await)
    }

    async fn set_value(&self, key: &str, value: Value) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO KeyValueData (Key, Value, UpdatedAt)
            VALUES (?, ?, ?)
            ON CONFLICT(Key) DO UPDATE SET
                Value = excluded.Value,
                UpdatedAt = excluded.UpdatedAt
            "#,
        )
        .bind(key)
        .bind(serde_json::to_string(&value)?)
        .bind(timestamp(&Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_latest_version(&self, url: &str) -> Option<PageVersion> {
        let history = or_absent("get_latest_version", url, self.read_history(url, 1).await);
        history.into_iter().next()
    }

    async fn save_version(&self, version: &PageVersion) -> StoreResult<()> {
        version.validate()?;

        let metadata = serde_json::to_string(&version.metadata)?;
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO PageVersions
                (Url, Hash, CapturedAt, ChangeType, Summary, Metadata, FullContent, TextContent)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&version.url)
        .bind(&version.content_hash)
        .bind(timestamp(&version.captured_at))
        .bind(version.change_type.as_str())
        .bind(&version.summary)
        .bind(metadata)
        .bind(&version.full_content)
        .bind(&version.text_content)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let pruned = sqlx::query(
            r#"
            DELETE FROM PageVersions
            WHERE Url = ?
              AND Id NOT IN (
                SELECT Id FROM PageVersions
                WHERE Url = ?
                ORDER BY CapturedAt DESC, Id DESC
                LIMIT ?
              )
            "#,
        )
        .bind(&version.url)
        .bind(&version.url)
        .bind(self.max_versions as i64)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        if pruned.rows_affected() > 0 {
            tracing::debug!(url = %version.url, pruned = pruned.rows_affected(), "Pruned versions");
        }

        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn test_set_value_upserts() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.set_value("k", serde_json::json!({"a": 1})).await.unwrap();
        store.set_value("k", serde_json::json!({"a": 2})).await.unwrap();

        assert_eq!(store.get_value("k").await, Some(serde_json::json!({"a": 2})));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM KeyValueData")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_prune_keeps_rows_for_other_urls() {
        let store = SqliteStore::in_memory().await.unwrap().with_max_versions(1);
        let base = Utc::now();

        for (url, offset) in [("a", 0), ("b", 1), ("a", 2), ("a", 3)] {
            let version = PageVersion::new(url, format!("{url}{offset}"))
                .with_captured_at(base + Duration::seconds(offset));
            store.save_version(&version).await.unwrap();
        }

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM PageVersions")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 2);

        let latest_a = store.get_latest_version("a").await.unwrap();
        assert_eq!(latest_a.text_content.as_deref(), Some("a3"));
        assert!(store.get_latest_version("b").await.is_some());
    }

    #[tokio::test]
    async fn test_unknown_change_type_reads_as_none() {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .save_version(&PageVersion::new("u", "text"))
            .await
            .unwrap();
        sqlx::query("UPDATE PageVersions SET ChangeType = 'Sideways'")
            .execute(store.pool())
            .await
            .unwrap();

        let latest = store.get_latest_version("u").await.unwrap();
        assert_eq!(latest.change_type, ChangeType::None);
    }
}
