//! Configuration types for monitoring and prioritization.

use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::types::classification::DocumentType;

/// Default number of versions retained per URL.
pub const DEFAULT_MAX_VERSIONS: usize = 10;

/// Configuration for a monitoring cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Versions kept per URL before pruning.
    ///
    /// Default: 10.
    pub max_versions: usize,

    /// Maximum fetches in flight at once.
    ///
    /// Default: 5.
    pub max_concurrent_requests: usize,

    /// Per-fetch timeout in seconds.
    ///
    /// Default: 30.
    pub request_timeout_secs: u64,

    /// URLs selected from the frontier per cycle.
    ///
    /// Default: 50.
    pub batch_size: usize,

    /// Skip persisting a snapshot whose content hash matches the latest one.
    ///
    /// Default: true.
    pub skip_unchanged: bool,

    /// Domain rules for the crawl prioritizer
    pub prioritizer: PrioritizerRules,

    /// Extra classifier keywords per document type
    pub custom_keywords: HashMap<DocumentType, Vec<String>>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_versions: DEFAULT_MAX_VERSIONS,
            max_concurrent_requests: 5,
            request_timeout_secs: 30,
            batch_size: 50,
            skip_unchanged: true,
            prioritizer: PrioritizerRules::default(),
            custom_keywords: HashMap::new(),
        }
    }
}

impl MonitorConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables on top of the defaults.
    ///
    /// Reads `.env` when present. Recognised variables:
    /// `REGWATCH_MAX_VERSIONS`, `REGWATCH_MAX_CONCURRENT_REQUESTS`,
    /// `REGWATCH_REQUEST_TIMEOUT_SECS`, `REGWATCH_BATCH_SIZE`,
    /// `REGWATCH_SKIP_UNCHANGED`.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        let _ = dotenv();

        let mut config = Self::default();
        if let Some(v) = env_var("REGWATCH_MAX_VERSIONS")? {
            config.max_versions = v;
        }
        if let Some(v) = env_var("REGWATCH_MAX_CONCURRENT_REQUESTS")? {
            config.max_concurrent_requests = v;
        }
        if let Some(v) = env_var("REGWATCH_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout_secs = v;
        }
        if let Some(v) = env_var("REGWATCH_BATCH_SIZE")? {
            config.batch_size = v;
        }
        if let Some(v) = env_var("REGWATCH_SKIP_UNCHANGED")? {
            config.skip_unchanged = v;
        }
        Ok(config)
    }

    /// Set the retention bound.
    pub fn with_max_versions(mut self, max: usize) -> Self {
        self.max_versions = max;
        self
    }

    /// Set the concurrency limit.
    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    /// Set the per-fetch timeout.
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Persist every capture, even when content is unchanged.
    pub fn keep_unchanged(mut self) -> Self {
        self.skip_unchanged = false;
        self
    }

    /// Set prioritizer rules.
    pub fn with_prioritizer(mut self, rules: PrioritizerRules) -> Self {
        self.prioritizer = rules;
        self
    }

    /// Add classifier keywords for a document type.
    pub fn with_keywords(
        mut self,
        doc_type: DocumentType,
        keywords: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.custom_keywords
            .entry(doc_type)
            .or_default()
            .extend(keywords.into_iter().map(|k| k.into()));
        self
    }

    /// Per-fetch timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_var<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value: raw,
            }),
        Err(_) => Ok(None),
    }
}

/// Domain rules applied on top of the base crawl ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrioritizerRules {
    /// Path prefixes of high-value site sections (+3.0)
    pub priority_sections: Vec<String>,

    /// Tokens marking high-value content types (+2.0)
    pub priority_content_types: Vec<String>,

    /// Regex patterns for low-value URLs (-3.0)
    pub low_priority_patterns: Vec<String>,
}

impl Default for PrioritizerRules {
    fn default() -> Self {
        Self {
            priority_sections: [
                "/guidance",
                "/regulation",
                "/legislation",
                "/consultations",
                "/enforcement",
                "/licensing",
                "/publications",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            priority_content_types: [
                "consultation",
                "guidance",
                "policy",
                "notice",
                "decision",
                "statement",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            low_priority_patterns: [
                r"/search",
                r"/tags?/",
                r"[?&]page=\d+",
                r"[?&]sort=",
                r"/(?:login|signin|register)",
                r"/(?:cookies|accessibility|privacy)",
                r"/(?:feed|rss)\b",
                r"/print/",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl PrioritizerRules {
    /// Rules with no entries (base ranking only).
    pub fn empty() -> Self {
        Self {
            priority_sections: vec![],
            priority_content_types: vec![],
            low_priority_patterns: vec![],
        }
    }

    /// Add a priority section.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.priority_sections.push(section.into());
        self
    }

    /// Add a priority content-type token.
    pub fn with_content_type(mut self, token: impl Into<String>) -> Self {
        self.priority_content_types.push(token.into());
        self
    }

    /// Add a low-priority pattern.
    pub fn with_low_priority(mut self, pattern: impl Into<String>) -> Self {
        self.low_priority_patterns.push(pattern.into());
        self
    }
}
