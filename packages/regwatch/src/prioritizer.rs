//! Crawl frontier prioritization.
//!
//! A generic [`BaseRanker`] picks the initial batch. The domain rules then
//! compute an extra score per candidate, and strong candidates the base
//! ranking left out are promoted into the batch.

use indexmap::IndexSet;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

use crate::traits::ranker::BaseRanker;
use crate::types::config::PrioritizerRules;
use crate::types::structure::is_pdf_url;

const SECTION_SCORE: f64 = 3.0;
const CONTENT_TYPE_SCORE: f64 = 2.0;
const LOW_PRIORITY_SCORE: f64 = -3.0;
const DATE_SCORE: f64 = 1.5;
const PDF_SCORE: f64 = 2.0;

/// Extra score a candidate needs to be promoted.
pub const PROMOTION_THRESHOLD: f64 = 2.0;

static RE_URL_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}[-/]\d{2}[-/]\d{2}").unwrap());

/// Lowercased path of a URL, or the whole lowercased string when it does
/// not parse.
fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        Err(_) => url.to_lowercase(),
    }
}

/// Breadth-first base ranking: shallower paths first, input order on ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthRanker;

impl DepthRanker {
    fn depth(url: &str) -> usize {
        url_path(url).split('/').filter(|s| !s.is_empty()).count()
    }
}

impl BaseRanker for DepthRanker {
    fn rank(&self, candidates: &[String], max_count: usize) -> Vec<String> {
        let unique: IndexSet<&String> = candidates.iter().collect();
        let mut ranked: Vec<&String> = unique.into_iter().collect();
        ranked.sort_by_key(|url| Self::depth(url));
        ranked.into_iter().take(max_count).cloned().collect()
    }
}

/// Re-ranks crawl candidates using regulator-site rules.
#[derive(Debug, Clone)]
pub struct CrawlPrioritizer<R: BaseRanker = DepthRanker> {
    base: R,
    priority_sections: Vec<String>,
    priority_content_types: Vec<String>,
    low_priority: Vec<Regex>,
}

impl Default for CrawlPrioritizer<DepthRanker> {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlPrioritizer<DepthRanker> {
    /// Prioritizer with default rules over the depth ranker.
    pub fn new() -> Self {
        Self::with_rules(&PrioritizerRules::default())
    }

    /// Prioritizer with explicit rules over the depth ranker.
    pub fn with_rules(rules: &PrioritizerRules) -> Self {
        Self::with_ranker(DepthRanker, rules)
    }
}

impl<R: BaseRanker> CrawlPrioritizer<R> {
    /// Wrap an external base ranking.
    ///
    /// Low-priority patterns that fail to compile are logged and skipped.
    pub fn with_ranker(base: R, rules: &PrioritizerRules) -> Self {
        let low_priority = rules
            .low_priority_patterns
            .iter()
            .filter_map(|p| match Regex::new(&format!("(?i){p}")) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!(pattern = %p, error = %e, "Skipping low-priority pattern that does not compile");
                    None
                }
            })
            .collect();

        Self {
            base,
            priority_sections: rules
                .priority_sections
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            priority_content_types: rules
                .priority_content_types
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            low_priority,
        }
    }

    /// Domain score for one URL. Every rule applies independently.
    pub fn extra_score(&self, url: &str) -> f64 {
        let lowered = url.to_lowercase();
        let path = url_path(url);
        let mut score = 0.0;

        if self
            .priority_sections
            .iter()
            .any(|section| path.contains(section.as_str()))
        {
            score += SECTION_SCORE;
        }

        if self
            .priority_content_types
            .iter()
            .any(|token| lowered.contains(token.as_str()))
        {
            score += CONTENT_TYPE_SCORE;
        }

        if self.low_priority.iter().any(|re| re.is_match(&lowered)) {
            score += LOW_PRIORITY_SCORE;
        }

        if RE_URL_DATE.is_match(&lowered) {
            score += DATE_SCORE;
        }

        if is_pdf_url(&lowered) {
            score += PDF_SCORE;
        }

        score
    }

    /// Select up to `max_count` candidates, best first.
    ///
    /// Starts from the base ranking, then walks candidates by extra score
    /// (descending, input order on ties). Each candidate above the
    /// promotion threshold that the base ranking left out is appended, or
    /// replaces the lowest-ranked base entry still in the batch. Base
    /// entries that get replaced are never promoted back.
    pub fn prioritize(&self, candidates: &[String], max_count: usize) -> Vec<String> {
        if max_count == 0 || candidates.is_empty() {
            return Vec::new();
        }

        let unique: Vec<String> = candidates
            .iter()
            .collect::<IndexSet<_>>()
            .into_iter()
            .cloned()
            .collect();

        let mut selected: Vec<String> = self
            .base
            .rank(&unique, max_count)
            .into_iter()
            .collect::<IndexSet<_>>()
            .into_iter()
            .take(max_count)
            .collect();
        let base: HashSet<String> = selected.iter().cloned().collect();

        let mut scored: Vec<(&String, f64)> = unique
            .iter()
            .map(|url| (url, self.extra_score(url)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        for (url, extra) in scored {
            if extra <= PROMOTION_THRESHOLD {
                break;
            }
            if base.contains(url) {
                continue;
            }

            if selected.len() < max_count {
                selected.push(url.clone());
                continue;
            }

            let Some(slot) = selected.iter().rposition(|u| base.contains(u)) else {
                break;
            };
            let evicted = std::mem::replace(&mut selected[slot], url.clone());
            tracing::debug!(url = %url, evicted = %evicted, extra_score = extra, "Promoted crawl candidate");
        }

        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Base ranking that keeps input order and returns at most `.0` URLs.
    struct TakeFirst(usize);

    const INPUT_ORDER: TakeFirst = TakeFirst(usize::MAX);

    impl BaseRanker for TakeFirst {
        fn rank(&self, candidates: &[String], max_count: usize) -> Vec<String> {
            candidates
                .iter()
                .take(self.0.min(max_count))
                .cloned()
                .collect()
        }
    }

    #[test]
    fn test_depth_ranker_is_stable() {
        let ranked = DepthRanker.rank(
            &urls(&[
                "https://x.gov/a/b/c",
                "https://x.gov/a",
                "https://x.gov/b",
                "https://x.gov/a/b",
            ]),
            3,
        );
        assert_eq!(
            ranked,
            urls(&["https://x.gov/a", "https://x.gov/b", "https://x.gov/a/b"])
        );
    }

    #[test]
    fn test_extra_score_rules_are_independent() {
        let prioritizer = CrawlPrioritizer::new();

        assert_eq!(prioritizer.extra_score("https://x.gov/about"), 0.0);
        // section + "guidance" content-type token
        assert_eq!(prioritizer.extra_score("https://x.gov/guidance/fees"), 5.0);
        // section + token + low priority
        assert_eq!(prioritizer.extra_score("https://x.gov/guidance/search"), 2.0);
        assert_eq!(
            prioritizer.extra_score("https://x.gov/files/2024-03-01/report.pdf"),
            3.5
        );
        assert_eq!(prioritizer.extra_score("https://x.gov/about?sort=asc"), -3.0);
    }

    #[test]
    fn test_priority_url_survives_base_exclusion() {
        let prioritizer = CrawlPrioritizer::new();
        let candidates = urls(&[
            "https://x.gov/a",
            "https://x.gov/b",
            "https://x.gov/c",
            "https://x.gov/enforcement/notices/acme",
        ]);

        let selected = prioritizer.prioritize(&candidates, 2);

        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0], "https://x.gov/a");
        assert!(selected.contains(&"https://x.gov/enforcement/notices/acme".to_string()));
    }

    #[test]
    fn test_promotion_appends_when_room() {
        let prioritizer = CrawlPrioritizer::with_ranker(
            TakeFirst(1),
            &PrioritizerRules::empty().with_section("/consultations"),
        );
        let candidates = urls(&[
            "https://x.gov/a",
            "https://x.gov/b",
            "https://x.gov/consultations/fees",
        ]);

        let selected = prioritizer.prioritize(&candidates, 3);
        assert_eq!(
            selected,
            urls(&["https://x.gov/a", "https://x.gov/consultations/fees"])
        );
    }

    #[test]
    fn test_promoted_urls_do_not_evict_each_other() {
        let prioritizer = CrawlPrioritizer::with_ranker(
            INPUT_ORDER,
            &PrioritizerRules::empty().with_section("/guidance"),
        );
        let candidates = urls(&[
            "https://x.gov/a",
            "https://x.gov/b",
            "https://x.gov/c",
            "https://x.gov/guidance/one",
            "https://x.gov/guidance/two",
        ]);

        let selected = prioritizer.prioritize(&candidates, 3);

        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0], "https://x.gov/a");
        assert!(selected.contains(&"https://x.gov/guidance/one".to_string()));
        assert!(selected.contains(&"https://x.gov/guidance/two".to_string()));
    }

    #[test]
    fn test_replaced_base_entry_is_not_promoted_back() {
        let prioritizer = CrawlPrioritizer::with_ranker(
            INPUT_ORDER,
            &PrioritizerRules::empty()
                .with_section("/x")
                .with_section("/guidance")
                .with_content_type("policy"),
        );
        let candidates = urls(&[
            "https://x.gov/a",
            "https://x.gov/x/foo",
            "https://x.gov/guidance/policy",
        ]);

        assert_eq!(prioritizer.extra_score("https://x.gov/x/foo"), 3.0);
        assert_eq!(prioritizer.extra_score("https://x.gov/guidance/policy"), 5.0);
        assert_eq!(
            prioritizer.prioritize(&candidates, 2),
            urls(&["https://x.gov/a", "https://x.gov/guidance/policy"])
        );
    }

    #[test]
    fn test_duplicate_candidates_are_selected_once() {
        let ranked = DepthRanker.rank(
            &urls(&["https://x.gov/a", "https://x.gov/b", "https://x.gov/a"]),
            5,
        );
        assert_eq!(ranked, urls(&["https://x.gov/a", "https://x.gov/b"]));

        let prioritizer = CrawlPrioritizer::with_ranker(
            INPUT_ORDER,
            &PrioritizerRules::empty().with_section("/guidance"),
        );
        let candidates = urls(&[
            "https://x.gov/a",
            "https://x.gov/a",
            "https://x.gov/guidance/fees",
            "https://x.gov/guidance/fees",
        ]);
        assert_eq!(
            prioritizer.prioritize(&candidates, 5),
            urls(&["https://x.gov/a", "https://x.gov/guidance/fees"])
        );
    }

    #[test]
    fn test_below_threshold_is_not_promoted() {
        let prioritizer = CrawlPrioritizer::with_ranker(
            INPUT_ORDER,
            &PrioritizerRules::empty().with_content_type("policy"),
        );
        let candidates = urls(&["https://x.gov/a", "https://x.gov/policy"]);
        assert_eq!(
            prioritizer.prioritize(&candidates, 1),
            urls(&["https://x.gov/a"])
        );
    }

    #[test]
    fn test_zero_capacity() {
        let prioritizer = CrawlPrioritizer::new();
        let candidates = urls(&["https://x.gov/guidance"]);
        assert!(prioritizer.prioritize(&candidates, 0).is_empty());
        assert!(prioritizer.prioritize(&[], 5).is_empty());
    }

    #[test]
    fn test_bad_low_priority_pattern_is_skipped() {
        let prioritizer = CrawlPrioritizer::with_rules(
            &PrioritizerRules::empty()
                .with_low_priority("(")
                .with_low_priority("/print/"),
        );
        assert_eq!(prioritizer.extra_score("https://x.gov/print/page"), -3.0);
    }
}
