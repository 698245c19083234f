//! Page version types - persisted snapshots of a monitored URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::error::{StoreError, StoreResult};
use crate::types::change::ChangeType;

/// Length of the generated content summary, in characters.
const SUMMARY_CHARS: usize = 200;

/// One captured snapshot of a URL.
///
/// Immutable once persisted. The large payloads (`full_content`,
/// `text_content`) are optional and stored apart from the metadata by the
/// backends that care about space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageVersion {
    /// URL this snapshot belongs to
    pub url: String,

    /// SHA-256 hex of the normalised text
    pub content_hash: String,

    /// When the page was captured
    pub captured_at: DateTime<Utc>,

    /// Change relative to the previous snapshot
    pub change_type: ChangeType,

    /// Short leading excerpt of the text
    pub summary: String,

    /// Application-provided metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Raw content (usually rendered HTML)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,

    /// Extracted plain text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
}

impl PageVersion {
    /// Create a snapshot from extracted text, capturing now.
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();

        Self {
            url: url.into(),
            content_hash: Self::hash_content(&text),
            captured_at: Utc::now(),
            change_type: ChangeType::New,
            summary: summarize(&text),
            metadata: HashMap::new(),
            full_content: None,
            text_content: Some(text),
        }
    }

    /// Calculate SHA-256 hash of whitespace-normalised content.
    pub fn hash_content(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(normalize_content(content).as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Set the captured timestamp.
    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = captured_at;
        self
    }

    /// Set the change classification.
    pub fn with_change_type(mut self, change_type: ChangeType) -> Self {
        self.change_type = change_type;
        self
    }

    /// Attach the raw content.
    pub fn with_full_content(mut self, content: impl Into<String>) -> Self {
        self.full_content = Some(content.into());
        self
    }

    /// Add a metadata key-value pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Check if content has changed by comparing hashes.
    pub fn content_changed(&self, new_text: &str) -> bool {
        Self::hash_content(new_text) != self.content_hash
    }

    /// Reject snapshots that lack identifying data.
    pub fn validate(&self) -> StoreResult<()> {
        if self.url.trim().is_empty() {
            return Err(StoreError::invalid("page version has no url"));
        }
        if self.content_hash.is_empty() {
            return Err(StoreError::invalid(format!(
                "page version for {} has no content hash",
                self.url
            )));
        }
        Ok(())
    }

    /// Copy without the large payloads.
    pub fn without_payloads(&self) -> Self {
        Self {
            full_content: None,
            text_content: None,
            ..self.clone()
        }
    }
}

/// Normalize content for consistent hashing
fn normalize_content(content: &str) -> String {
    content
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn summarize(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(SUMMARY_CHARS) {
        Some((idx, _)) => format!("{}...", &collapsed[..idx]),
        None => collapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash() {
        let version = PageVersion::new("https://example.gov", "Hello, world!");
        assert_eq!(version.content_hash.len(), 64); // SHA-256 hex
    }

    #[test]
    fn test_hash_ignores_whitespace_layout() {
        let a = PageVersion::hash_content("Line one\n\n   Line two  \n");
        let b = PageVersion::hash_content("Line one\nLine two");
        assert_eq!(a, b);
    }

    #[test]
    fn test_content_changed() {
        let version = PageVersion::new("https://example.gov", "Hello, world!");
        assert!(!version.content_changed("Hello, world!"));
        assert!(version.content_changed("Hello, universe!"));
    }

    #[test]
    fn test_summary_is_truncated() {
        let text = "word ".repeat(100);
        let version = PageVersion::new("https://example.gov", text);
        assert!(version.summary.ends_with("..."));
        assert_eq!(version.summary.chars().count(), SUMMARY_CHARS + 3);
    }

    #[test]
    fn test_summary_respects_char_boundaries() {
        let text = "£".repeat(300);
        let version = PageVersion::new("https://example.gov", text);
        assert!(version.summary.starts_with("££"));
    }

    #[test]
    fn test_validate_rejects_missing_url() {
        let version = PageVersion::new("", "text");
        assert!(matches!(
            version.validate(),
            Err(StoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_missing_hash() {
        let mut version = PageVersion::new("https://example.gov", "text");
        version.content_hash.clear();
        assert!(version.validate().is_err());
    }

    #[test]
    fn test_without_payloads() {
        let version = PageVersion::new("https://example.gov", "text").with_full_content("<p>text</p>");
        let bare = version.without_payloads();
        assert!(bare.full_content.is_none());
        assert!(bare.text_content.is_none());
        assert_eq!(bare.content_hash, version.content_hash);
    }
}
