//! Monitoring cycle - prioritize, fetch, classify, diff and persist.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use crate::classifier::ContentClassifier;
use crate::detector::{ChangeImpactDetector, LineDiffer};
use crate::error::{ConfigError, FetchError, FetchResult, MonitorError, Result};
use crate::prioritizer::{CrawlPrioritizer, DepthRanker};
use crate::traits::diff::ContentDiffer;
use crate::traits::ranker::BaseRanker;
use crate::traits::source::{FetchedPage, PageSource};
use crate::traits::store::{KeyValueExt, StateStore};
use crate::types::change::{ChangeType, ContentDiff, RegulatoryChangeResult, RegulatoryImpact};
use crate::types::classification::{ClassificationResult, DocumentType};
use crate::types::config::MonitorConfig;
use crate::types::version::PageVersion;

/// Key under which the last cycle summary is kept in the store.
pub const LAST_CYCLE_KEY: &str = "monitor:last_cycle";

/// Confidence the classifier must reach before a high-impact change to a
/// regulation or enforcement page is escalated.
pub const CRITICAL_CONFIDENCE: f64 = 0.5;

/// Importance of a change once the document type is taken into account.
///
/// High-impact changes to pages confidently classified as regulation or
/// enforcement are `Critical`; everything else keeps the detector's level.
pub fn assess_importance(
    classification: &ClassificationResult,
    change: &RegulatoryChangeResult,
) -> RegulatoryImpact {
    let sensitive = matches!(
        classification.primary_type,
        DocumentType::Regulation | DocumentType::EnforcementAction
    );

    if change.impact == RegulatoryImpact::High
        && sensitive
        && classification.confidence >= CRITICAL_CONFIDENCE
    {
        RegulatoryImpact::Critical
    } else {
        change.impact
    }
}

/// What happened to one URL during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UrlStatus {
    /// First snapshot stored
    New,
    /// Content differs from the latest snapshot; new snapshot stored
    Changed,
    /// Content hash matches the latest snapshot; nothing stored
    Unchanged,
}

/// Outcome for one successfully processed URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorOutcome {
    pub url: String,
    pub status: UrlStatus,
    pub classification: ClassificationResult,

    /// Change analysis, absent when the page was unchanged
    pub change: Option<RegulatoryChangeResult>,

    /// Impact after weighing the document type
    pub importance: RegulatoryImpact,
}

/// A URL that could not be processed.
#[derive(Debug)]
pub struct FailedUrl {
    pub url: String,
    pub error: MonitorError,
}

/// Result of a monitoring cycle.
#[derive(Debug)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// URLs chosen by the prioritizer, in priority order
    pub selected: Vec<String>,

    /// Successfully processed URLs, in priority order
    pub outcomes: Vec<MonitorOutcome>,

    /// URLs that failed to fetch or persist
    pub failed: Vec<FailedUrl>,
}

impl CycleReport {
    /// Check if every selected URL was processed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Outcomes with the given status.
    pub fn with_status(&self, status: UrlStatus) -> impl Iterator<Item = &MonitorOutcome> {
        self.outcomes.iter().filter(move |o| o.status == status)
    }

    /// Outcomes at or above an importance level, most important first.
    pub fn alerts(&self, min: RegulatoryImpact) -> Vec<&MonitorOutcome> {
        let mut alerts: Vec<_> = self
            .outcomes
            .iter()
            .filter(|o| o.importance >= min && o.importance > RegulatoryImpact::None)
            .collect();
        alerts.sort_by(|a, b| b.importance.cmp(&a.importance));
        alerts
    }

    /// Compact, serializable view of the cycle.
    pub fn summary(&self) -> CycleSummary {
        CycleSummary {
            started_at: self.started_at,
            finished_at: self.finished_at,
            selected: self.selected.len(),
            new: self.with_status(UrlStatus::New).count(),
            changed: self.with_status(UrlStatus::Changed).count(),
            unchanged: self.with_status(UrlStatus::Unchanged).count(),
            failed: self.failed.iter().map(|f| f.url.clone()).collect(),
        }
    }
}

/// Cycle counters persisted under [`LAST_CYCLE_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub selected: usize,
    pub new: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub failed: Vec<String>,
}

/// Runs monitoring cycles over a crawl frontier.
pub struct Monitor<S, F, D = LineDiffer, R = DepthRanker>
where
    S: StateStore,
    F: PageSource,
    D: ContentDiffer,
    R: BaseRanker,
{
    store: S,
    source: F,
    classifier: ContentClassifier,
    detector: ChangeImpactDetector<D>,
    prioritizer: CrawlPrioritizer<R>,
    config: MonitorConfig,
    permits: Semaphore,
}

impl<S: StateStore, F: PageSource> Monitor<S, F> {
    /// Build a monitor with the default differ and base ranking.
    ///
    /// Fails when the store's retention bound differs from
    /// `config.max_versions`; build the store with its `from_config`
    /// constructor to keep them in step.
    pub fn new(store: S, source: F, config: MonitorConfig) -> std::result::Result<Self, ConfigError> {
        let classifier = ContentClassifier::from_config(&config);
        let prioritizer = CrawlPrioritizer::with_rules(&config.prioritizer);
        Self::with_components(
            store,
            source,
            classifier,
            ChangeImpactDetector::new(),
            prioritizer,
            config,
        )
    }
}

impl<S, F, D, R> Monitor<S, F, D, R>
where
    S: StateStore,
    F: PageSource,
    D: ContentDiffer,
    R: BaseRanker,
{
    /// Build a monitor from explicit components.
    pub fn with_components(
        store: S,
        source: F,
        classifier: ContentClassifier,
        detector: ChangeImpactDetector<D>,
        prioritizer: CrawlPrioritizer<R>,
        config: MonitorConfig,
    ) -> std::result::Result<Self, ConfigError> {
        if store.max_versions() != config.max_versions {
            return Err(ConfigError::RetentionMismatch {
                configured: config.max_versions,
                store: store.max_versions(),
            });
        }

        Ok(Self {
            permits: Semaphore::new(config.max_concurrent_requests.max(1)),
            store,
            source,
            classifier,
            detector,
            prioritizer,
            config,
        })
    }

    /// The underlying state store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The active configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run one cycle over the candidate frontier.
    ///
    /// Per-URL failures are collected in the report; the cycle itself never
    /// fails.
    pub async fn run_cycle(&self, candidates: &[String]) -> CycleReport {
        let started_at = Utc::now();
        let selected = self
            .prioritizer
            .prioritize(candidates, self.config.batch_size);

        info!(
            candidates = candidates.len(),
            selected = selected.len(),
            "Starting monitoring cycle"
        );

        let results = join_all(selected.iter().map(|url| self.process_url(url))).await;

        let mut outcomes = Vec::new();
        let mut failed = Vec::new();
        for (url, result) in selected.iter().zip(results) {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => {
                    warn!(url = %url, error = %error, "Failed to process URL");
                    failed.push(FailedUrl {
                        url: url.clone(),
                        error,
                    });
                }
            }
        }

        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            selected,
            outcomes,
            failed,
        };

        let summary = report.summary();
        info!(
            new = summary.new,
            changed = summary.changed,
            unchanged = summary.unchanged,
            failed = summary.failed.len(),
            "Monitoring cycle complete"
        );

        if let Err(e) = self.store.set(LAST_CYCLE_KEY, &summary).await {
            warn!(error = %e, "Failed to record cycle summary");
        }

        report
    }

    /// Summary of the most recent cycle, if one was recorded.
    pub async fn last_cycle(&self) -> Option<CycleSummary> {
        self.store.get(LAST_CYCLE_KEY).await
    }

    /// Fetch, classify, diff and persist a single URL.
    pub async fn process_url(&self, url: &str) -> Result<MonitorOutcome> {
        let page = self.fetch(url).await?;

        let structure = page.classification_structure();
        let classification = self.classifier.classify(url, &page.text, structure.as_ref());

        let previous = self.store.get_latest_version(url).await;
        let content_hash = PageVersion::hash_content(&page.text);

        if let Some(prev) = &previous {
            if self.config.skip_unchanged && prev.content_hash == content_hash {
                debug!(url = %url, "Content unchanged");
                return Ok(MonitorOutcome {
                    url: url.to_string(),
                    status: UrlStatus::Unchanged,
                    classification,
                    change: None,
                    importance: RegulatoryImpact::None,
                });
            }
        }

        let change = match &previous {
            Some(prev) => self.detector.detect_changes(
                url,
                prev.text_content.as_deref().unwrap_or(""),
                &page.text,
            ),
            None => RegulatoryChangeResult::unscored(url, ContentDiff::new(ChangeType::New)),
        };
        let importance = assess_importance(&classification, &change);

        let version = build_version(&page, &classification, &change, importance);
        self.store.save_version(&version).await?;

        let status = if previous.is_some() {
            UrlStatus::Changed
        } else {
            UrlStatus::New
        };

        debug!(
            url = %url,
            status = ?status,
            document_type = %classification.primary_type,
            importance = %importance,
            "Stored snapshot"
        );

        Ok(MonitorOutcome {
            url: url.to_string(),
            status,
            classification,
            change: Some(change),
            importance,
        })
    }

    /// Fetch under the concurrency limit and request timeout.
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;

        // The semaphore is never closed, so acquisition only waits.
        let _permit = self.permits.acquire().await.ok();

        match tokio::time::timeout(self.config.request_timeout(), self.source.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}

fn build_version(
    page: &FetchedPage,
    classification: &ClassificationResult,
    change: &RegulatoryChangeResult,
    importance: RegulatoryImpact,
) -> PageVersion {
    let mut version = PageVersion::new(&page.url, page.text.clone())
        .with_captured_at(page.fetched_at)
        .with_change_type(change.change_type)
        .with_metadata("document_type", classification.primary_type.as_str())
        .with_metadata("confidence", format!("{:.2}", classification.confidence))
        .with_metadata("impact", change.impact.as_str())
        .with_metadata("importance", importance.as_str());

    if let Some(secondary) = classification.secondary_type {
        version = version.with_metadata("secondary_type", secondary.as_str());
    }
    if let Some(html) = &page.html {
        version = version.with_full_content(html.clone());
    }
    if let Some(document) = &page.document {
        for (key, value) in document.to_pairs() {
            version = version.with_metadata(key, value);
        }
    }

    version
}
