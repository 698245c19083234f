//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the monitoring core
//! without making real network calls or depending on a real diff engine.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::traits::diff::ContentDiffer;
use crate::traits::source::{FetchedPage, PageSource};
use crate::types::change::ContentDiff;

/// A mock page source for testing.
///
/// Returns predefined pages without making network requests. Clones share
/// state, so a test can keep a handle while the monitor owns another.
#[derive(Default, Clone)]
pub struct MockPageSource {
    /// Predefined pages by URL
    pages: Arc<RwLock<HashMap<String, FetchedPage>>>,

    /// URLs that should fail
    fail_urls: Arc<RwLock<Vec<String>>>,

    /// Per-URL response delays
    delays: Arc<RwLock<HashMap<String, Duration>>>,

    /// Delay applied to every other URL
    latency: Option<Duration>,

    /// Call tracking
    calls: Arc<RwLock<Vec<String>>>,

    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockPageSource {
    /// Create a new mock page source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predefined page.
    pub fn with_page(self, page: FetchedPage) -> Self {
        self.pages.write().unwrap().insert(page.url.clone(), page);
        self
    }

    /// Add a plain-text page.
    pub fn with_text(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        let url = url.into();
        self.with_page(FetchedPage::new(url, text))
    }

    /// Replace a page's text (simulates the site changing between cycles).
    pub fn set_text(&self, url: &str, text: impl Into<String>) {
        let mut pages = self.pages.write().unwrap();
        match pages.get_mut(url) {
            Some(page) => page.text = text.into(),
            None => {
                pages.insert(url.to_string(), FetchedPage::new(url, text));
            }
        }
    }

    /// Mark a URL as failing.
    pub fn fail_url(self, url: impl Into<String>) -> Self {
        self.fail_urls.write().unwrap().push(url.into());
        self
    }

    /// Delay responses for one URL.
    pub fn with_delay(self, url: impl Into<String>, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(url.into(), delay);
        self
    }

    /// Delay every response without a per-URL delay.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Highest number of fetches observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        self.calls.write().unwrap().push(url.to_string());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight(&self.in_flight);
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = self.delays.read().unwrap().get(url).copied().or(self.latency);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        // Check if should fail
        if self.fail_urls.read().unwrap().iter().any(|u| u == url) {
            return Err(FetchError::Http(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Mock connection refused",
            ))));
        }

        let page = self.pages.read().unwrap().get(url).cloned();
        match page {
            Some(mut page) => {
                page.fetched_at = Utc::now();
                Ok(page)
            }
            None => Err(FetchError::NotFound {
                url: url.to_string(),
            }),
        }
    }
}

/// A diff primitive that always reports the same diff.
///
/// Lets detector tests pin the base magnitude and added text exactly.
#[derive(Debug, Clone)]
pub struct StaticDiffer {
    diff: ContentDiff,
}

impl StaticDiffer {
    pub fn new(diff: ContentDiff) -> Self {
        Self { diff }
    }
}

impl ContentDiffer for StaticDiffer {
    fn diff(&self, _old_text: &str, _new_text: &str) -> ContentDiff {
        self.diff.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_source_serves_pages() {
        let source = MockPageSource::new()
            .with_text("https://x.gov/a", "hello")
            .fail_url("https://x.gov/broken");

        let page = source.fetch("https://x.gov/a").await.unwrap();
        assert_eq!(page.text, "hello");

        assert!(matches!(
            source.fetch("https://x.gov/missing").await,
            Err(FetchError::NotFound { .. })
        ));
        assert!(matches!(
            source.fetch("https://x.gov/broken").await,
            Err(FetchError::Http(_))
        ));
        assert_eq!(source.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_set_text_updates_shared_state() {
        let source = MockPageSource::new().with_text("https://x.gov/a", "v1");
        let handle = source.clone();
        handle.set_text("https://x.gov/a", "v2");

        let page = source.fetch("https://x.gov/a").await.unwrap();
        assert_eq!(page.text, "v2");
    }
}
