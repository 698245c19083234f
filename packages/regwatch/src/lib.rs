//! Regulatory Website Monitoring Core
//!
//! Watches regulator and government websites, classifies what it finds,
//! scores how material each change is, and keeps a bounded, queryable
//! version history for audit and alerting.
//!
//! # Subsystems
//!
//! - **Prioritizer** - re-ranks the crawl frontier with domain rules
//! - **Classifier** - scores pages by regulatory document type
//! - **Detector** - diffs snapshots and assigns a regulatory impact
//! - **State store** - per-URL snapshot history with retention, over
//!   memory, filesystem or SQLite backends
//!
//! Fetching, DOM parsing and binary document decoding are left to the
//! application, which plugs them in through [`PageSource`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use regwatch::{MemoryStore, Monitor, MonitorConfig};
//! use regwatch::testing::MockPageSource;
//!
//! let config = MonitorConfig::from_env()?;
//! let store = MemoryStore::from_config(&config);
//! let source = MockPageSource::new().with_text("https://example.gov/guidance", "...");
//! let monitor = Monitor::new(store, source, config)?;
//!
//! let report = monitor.run_cycle(&frontier).await;
//! for alert in report.alerts(RegulatoryImpact::High) {
//!     println!("{}", alert.change.as_ref().unwrap().impact_summary());
//! }
//! ```
//!
//! # Modules
//!
//! - [`types`] - Classification, change, version and config types
//! - [`traits`] - Collaborator seams (StateStore, PageSource, ContentDiffer, BaseRanker)
//! - [`classifier`] - Content classifier and keyword taxonomy
//! - [`detector`] - Change and impact detector, default line differ
//! - [`prioritizer`] - Crawl prioritizer, default depth ranking
//! - [`stores`] - Storage implementations
//! - [`pipeline`] - Monitoring cycle orchestration
//! - [`testing`] - Mock implementations for testing

pub mod classifier;
pub mod detector;
pub mod error;
pub mod pipeline;
pub mod prioritizer;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ConfigError, FetchError, MonitorError, StoreError};
pub use traits::{
    diff::ContentDiffer,
    ranker::BaseRanker,
    source::{FetchedPage, PageSource},
    store::{KeyValueExt, StateStore},
};
pub use types::{
    change::{ChangeType, ContentDiff, RegulatoryChangeResult, RegulatoryImpact, RegulatoryPattern},
    classification::{ClassificationResult, DocumentType},
    config::{MonitorConfig, PrioritizerRules},
    structure::{DocumentMetadata, DocumentStructure},
    version::PageVersion,
};

// Re-export engines
pub use classifier::{ClassifierRules, ContentClassifier};
pub use detector::{ChangeImpactDetector, LineDiffer};
pub use prioritizer::{CrawlPrioritizer, DepthRanker};

// Re-export pipeline components
pub use pipeline::{
    assess_importance, CycleReport, CycleSummary, FailedUrl, Monitor, MonitorOutcome, UrlStatus,
};

// Re-export stores
pub use stores::{FilesystemStore, MemoryStore};

#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;
