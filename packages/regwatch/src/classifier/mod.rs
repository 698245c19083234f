//! Multi-signal content classifier.
//!
//! Scores accumulate additively per document type across three passes:
//!
//! 1. **URL** - keywords as path segments or substrings, fixed path checks,
//!    `.pdf` suffix
//! 2. **Text** - word-boundary keyword counts, per-type patterns, date,
//!    currency and percentage heuristics
//! 3. **Structure** - title and meta description keywords, tables, forms,
//!    PDF links (only when a parsed page or document is available)
//!
//! The highest total wins. Classification is pure: the tables are compiled
//! once and only [`ContentClassifier::add_keywords`] mutates them.

pub mod taxonomy;

use indexmap::IndexSet;
use regex::Regex;
use std::collections::BTreeMap;

use crate::types::classification::{ClassificationResult, DocumentType};
use crate::types::config::MonitorConfig;
use crate::types::structure::{is_pdf_url, DocumentStructure};

pub use taxonomy::ClassifierRules;
use taxonomy::{RE_CURRENCY, RE_DATE, RE_PERCENT, URL_PATTERNS};

const URL_SEGMENT_SCORE: f64 = 1.5;
const URL_SUBSTRING_SCORE: f64 = 0.5;
const URL_PATTERN_SCORE: f64 = 2.0;
const PDF_SCORE: f64 = 0.5;
const TITLE_SCORE: f64 = 1.5;
const META_SCORE: f64 = 0.5;

/// A keyword compiled for all three passes.
#[derive(Debug, Clone)]
struct Keyword {
    text: String,
    url_form: String,
    pattern: Regex,
}

impl Keyword {
    fn compile(raw: &str) -> Option<Self> {
        let text = raw.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }

        let pattern = match Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&text))) {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!(keyword = %text, error = %e, "Skipping keyword that does not compile");
                return None;
            }
        };

        Some(Self {
            url_form: text.split_whitespace().collect::<Vec<_>>().join("-"),
            text,
            pattern,
        })
    }

    fn url_score(&self, url: &str) -> f64 {
        let segment = &self.url_form;
        if url.contains(&format!("/{segment}"))
            || url.contains(&format!("-{segment}"))
            || url.contains(&format!("{segment}/"))
        {
            URL_SEGMENT_SCORE
        } else if url.contains(segment.as_str()) {
            URL_SUBSTRING_SCORE
        } else {
            0.0
        }
    }
}

/// Scores pages and documents by regulatory document type.
#[derive(Debug, Clone)]
pub struct ContentClassifier {
    keywords: BTreeMap<DocumentType, Vec<Keyword>>,
    text_patterns: BTreeMap<DocumentType, Vec<Regex>>,
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentClassifier {
    /// Create a classifier with the default regulator-site tables.
    pub fn new() -> Self {
        Self::with_rules(ClassifierRules::default())
    }

    /// Create a classifier from explicit rules.
    ///
    /// Patterns that fail to compile are logged and skipped.
    pub fn with_rules(rules: ClassifierRules) -> Self {
        let mut classifier = Self {
            keywords: BTreeMap::new(),
            text_patterns: BTreeMap::new(),
        };

        for (doc_type, keywords) in &rules.keywords {
            classifier.add_keywords(*doc_type, keywords);
        }

        for (doc_type, patterns) in &rules.text_patterns {
            let compiled = patterns
                .iter()
                .filter_map(|p| match Regex::new(&format!("(?i){p}")) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        tracing::warn!(pattern = %p, error = %e, "Skipping text pattern that does not compile");
                        None
                    }
                })
                .collect();
            classifier.text_patterns.insert(*doc_type, compiled);
        }

        classifier
    }

    /// Default tables plus the custom keywords from a monitor config.
    pub fn from_config(config: &MonitorConfig) -> Self {
        let mut classifier = Self::new();
        for (doc_type, keywords) in &config.custom_keywords {
            classifier.add_keywords(*doc_type, keywords);
        }
        classifier
    }

    /// Append keywords to a type's list.
    ///
    /// Intended for setup; takes `&mut self` so it cannot race classification.
    pub fn add_keywords<I, S>(&mut self, doc_type: DocumentType, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.keywords.entry(doc_type).or_default();
        entry.extend(keywords.into_iter().filter_map(|k| Keyword::compile(k.as_ref())));
    }

    /// Keywords currently registered for a type.
    pub fn keywords(&self, doc_type: DocumentType) -> Vec<&str> {
        self.keywords
            .get(&doc_type)
            .map(|list| list.iter().map(|k| k.text.as_str()).collect())
            .unwrap_or_default()
    }

    /// Classify a page from its URL, extracted text and optional structure.
    pub fn classify(
        &self,
        url: &str,
        text: &str,
        structure: Option<&DocumentStructure>,
    ) -> ClassificationResult {
        let mut scores: BTreeMap<DocumentType, f64> =
            DocumentType::ALL.iter().map(|t| (*t, 0.0)).collect();
        let mut matched = IndexSet::new();

        self.score_url(url, &mut scores);
        self.score_text(text, &mut scores, &mut matched);
        if let Some(structure) = structure {
            self.score_structure(structure, &mut scores);
        }

        let result = ClassificationResult::from_scores(scores, matched);

        tracing::debug!(
            url = %url,
            primary = %result.primary_type,
            confidence = result.confidence,
            "Classified content"
        );

        result
    }

    fn score_url(&self, url: &str, scores: &mut BTreeMap<DocumentType, f64>) {
        let url = url.to_lowercase();

        for (doc_type, keywords) in &self.keywords {
            let total: f64 = keywords.iter().map(|k| k.url_score(&url)).sum();
            add(scores, *doc_type, total);
        }

        if is_pdf_url(&url) {
            add(scores, DocumentType::Regulation, PDF_SCORE);
            add(scores, DocumentType::Guidance, PDF_SCORE);
        }

        for (doc_type, pattern) in URL_PATTERNS.iter() {
            if pattern.is_match(&url) {
                add(scores, *doc_type, URL_PATTERN_SCORE);
            }
        }
    }

    fn score_text(
        &self,
        text: &str,
        scores: &mut BTreeMap<DocumentType, f64>,
        matched: &mut IndexSet<String>,
    ) {
        if text.trim().is_empty() {
            return;
        }

        for (doc_type, keywords) in &self.keywords {
            for keyword in keywords {
                let count = keyword.pattern.find_iter(text).count();
                if count > 0 {
                    add(scores, *doc_type, (count as f64 * 0.2).min(2.0));
                    matched.insert(keyword.text.clone());
                }
            }
        }

        for (doc_type, patterns) in &self.text_patterns {
            let count: usize = patterns.iter().map(|p| p.find_iter(text).count()).sum();
            if count > 0 {
                add(scores, *doc_type, (count as f64 * 0.5).min(2.5));
            }
        }

        let dates = RE_DATE.find_iter(text).count();
        if dates > 5 {
            add(scores, DocumentType::Regulation, 0.5);
            add(scores, DocumentType::Statistics, 1.0);
        }

        let amounts = RE_CURRENCY.find_iter(text).count();
        if amounts > 0 {
            add(
                scores,
                DocumentType::EnforcementAction,
                (amounts as f64 * 0.3).min(1.5),
            );
        }

        let percentages = RE_PERCENT.find_iter(text).count();
        if percentages > 3 {
            add(
                scores,
                DocumentType::Statistics,
                (percentages as f64 * 0.2).min(1.0),
            );
        }
    }

    fn score_structure(
        &self,
        structure: &DocumentStructure,
        scores: &mut BTreeMap<DocumentType, f64>,
    ) {
        let title = structure.title.as_deref().unwrap_or("");
        let description = structure.meta_description.as_deref().unwrap_or("");

        for (doc_type, keywords) in &self.keywords {
            for keyword in keywords {
                if !title.is_empty() && keyword.pattern.is_match(title) {
                    add(scores, *doc_type, TITLE_SCORE);
                }
                if !description.is_empty() && keyword.pattern.is_match(description) {
                    add(scores, *doc_type, META_SCORE);
                }
            }
        }

        if structure.table_count > 0 {
            add(
                scores,
                DocumentType::Statistics,
                (structure.table_count as f64 * 0.5).min(1.5),
            );
        }

        if structure.form_count > 0 {
            add(scores, DocumentType::LicensingInfo, 1.0);
        }

        if structure.links_to_pdf() {
            add(scores, DocumentType::Regulation, PDF_SCORE);
            add(scores, DocumentType::Guidance, PDF_SCORE);
        }
    }
}

fn add(scores: &mut BTreeMap<DocumentType, f64>, doc_type: DocumentType, amount: f64) {
    if amount != 0.0 {
        *scores.entry(doc_type).or_insert(0.0) += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_enforcement_scenario() {
        let classifier = ContentClassifier::new();
        let text = "The regulator took enforcement action against Acme Ltd. \
                    This enforcement action follows a review. \
                    Acme was fined £50,000 after the enforcement action concluded.";

        let result = classifier.classify(
            "https://example.gov/enforcement-action/acme-fine",
            text,
            None,
        );

        assert_eq!(result.primary_type, DocumentType::EnforcementAction);
        assert!(result.confidence > 0.3);
        assert!(result.matched_keywords.contains("enforcement"));
        assert!(result.matched_keywords.contains("enforcement action"));
    }

    #[test]
    fn test_empty_input_is_other() {
        let classifier = ContentClassifier::new();
        let result = classifier.classify("", "", None);
        assert_eq!(result.primary_type, DocumentType::Other);
        assert_eq!(result.confidence, 0.0);
        assert!(result.matched_keywords.is_empty());
        assert_eq!(result.scores.len(), DocumentType::ALL.len());
    }

    #[test]
    fn test_url_segment_beats_substring() {
        let classifier = ContentClassifier::with_rules(
            ClassifierRules::empty().with_keywords(DocumentType::Statistics, ["survey"]),
        );

        let segment = classifier.classify("https://x.org/survey", "", None);
        let substring = classifier.classify("https://x.org/oursurveyresults", "", None);

        assert_eq!(segment.score(DocumentType::Statistics), 1.5);
        assert_eq!(substring.score(DocumentType::Statistics), 0.5);
    }

    #[test]
    fn test_multi_word_keyword_matches_hyphenated_segment() {
        let classifier = ContentClassifier::with_rules(
            ClassifierRules::empty().with_keywords(DocumentType::Consultation, ["call for papers"]),
        );
        let result = classifier.classify("https://x.org/call-for-papers/2024", "", None);
        assert_eq!(result.score(DocumentType::Consultation), 1.5);
    }

    #[test]
    fn test_pdf_suffix_boosts_regulation_and_guidance() {
        let classifier = ContentClassifier::with_rules(ClassifierRules::empty());
        let result = classifier.classify("https://x.org/files/doc.pdf", "", None);
        assert_eq!(result.score(DocumentType::Regulation), 0.5);
        assert_eq!(result.score(DocumentType::Guidance), 0.5);
    }

    #[test]
    fn test_keyword_counts_are_capped() {
        let classifier = ContentClassifier::with_rules(
            ClassifierRules::empty().with_keywords(DocumentType::Guidance, ["advice"]),
        );
        let text = "advice ".repeat(40);
        let result = classifier.classify("https://x.org", &text, None);
        assert_eq!(result.score(DocumentType::Guidance), 2.0);
        assert_eq!(result.matched_keywords.len(), 1);
    }

    #[test]
    fn test_word_boundaries() {
        let classifier = ContentClassifier::with_rules(
            ClassifierRules::empty().with_keywords(DocumentType::EnforcementAction, ["fine"]),
        );
        let result = classifier.classify("https://x.org", "We refined the process", None);
        assert_eq!(result.score(DocumentType::EnforcementAction), 0.0);
    }

    #[test]
    fn test_statistics_heuristics() {
        let classifier = ContentClassifier::with_rules(ClassifierRules::empty());
        let text = "Rates rose 4% in 2024-01-01, 5% in 2024-02-01, 6% in 2024-03-01, \
                    7% in 2024-04-01, 8% in 2024-05-01 and 9% in 2024-06-01.";
        let result = classifier.classify("https://x.org", text, None);

        // 1.0 from dates plus min(6 * 0.2, 1.0) from percentages
        assert!((result.score(DocumentType::Statistics) - 2.0).abs() < 1e-9);
        assert!((result.score(DocumentType::Regulation) - 0.5).abs() < 1e-9);
        assert_eq!(result.primary_type, DocumentType::Statistics);
    }

    #[test]
    fn test_structure_pass() {
        let classifier = ContentClassifier::with_rules(
            ClassifierRules::empty().with_keywords(DocumentType::LicensingInfo, ["permit"]),
        );
        let structure = DocumentStructure::new()
            .with_title("Apply for a permit")
            .with_meta_description("Permit applications")
            .with_tables(5)
            .with_forms(1)
            .with_link("/files/form.pdf");

        let result = classifier.classify("https://x.org", "", Some(&structure));

        assert_eq!(result.score(DocumentType::LicensingInfo), 1.5 + 0.5 + 1.0);
        assert_eq!(result.score(DocumentType::Statistics), 1.5);
        assert_eq!(result.score(DocumentType::Regulation), 0.5);
        assert_eq!(result.primary_type, DocumentType::LicensingInfo);
    }

    #[test]
    fn test_add_keywords_appends() {
        let mut classifier = ContentClassifier::new();
        let before = classifier.keywords(DocumentType::Guidance).len();
        classifier.add_keywords(DocumentType::Guidance, ["primer", "  "]);
        let after = classifier.keywords(DocumentType::Guidance);
        assert_eq!(after.len(), before + 1);
        assert_eq!(after.last(), Some(&"primer"));
    }

    #[test]
    fn test_from_config_uses_custom_keywords() {
        let config = MonitorConfig::new().with_keywords(DocumentType::Statistics, ["dashboard"]);
        let classifier = ContentClassifier::from_config(&config);
        assert!(classifier.keywords(DocumentType::Statistics).contains(&"dashboard"));
    }

    #[test]
    fn test_bad_pattern_is_skipped() {
        let classifier = ContentClassifier::with_rules(
            ClassifierRules::empty()
                .with_pattern(DocumentType::Guidance, "([unclosed")
                .with_pattern(DocumentType::Guidance, r"\bstep \d+\b"),
        );
        let result = classifier.classify("https://x.org", "Step 1: read this.", None);
        assert_eq!(result.score(DocumentType::Guidance), 0.5);
    }

    proptest! {
        #[test]
        fn prop_confidence_in_range_and_primary_is_argmax(
            url in "https://[a-z]{1,8}\\.gov(/[a-z-]{1,12}){0,3}",
            text in "[a-zA-Z0-9 £%.,/-]{0,300}",
        ) {
            let classifier = ContentClassifier::new();
            let result = classifier.classify(&url, &text, None);

            prop_assert!((0.0..=1.0).contains(&result.confidence));

            let top = result.scores.values().cloned().fold(0.0_f64, f64::max);
            if top > 0.0 {
                prop_assert_eq!(result.score(result.primary_type), top);
            } else {
                prop_assert_eq!(result.primary_type, DocumentType::Other);
                prop_assert_eq!(result.confidence, 0.0);
            }
        }

        #[test]
        fn prop_classification_is_idempotent(
            url in "https://[a-z]{1,8}\\.gov(/[a-z-]{1,12}){0,3}",
            text in "[a-zA-Z0-9 £%.,/-]{0,300}",
        ) {
            let classifier = ContentClassifier::new();
            let first = classifier.classify(&url, &text, None);
            let second = classifier.classify(&url, &text, None);
            prop_assert_eq!(first, second);
        }
    }
}
