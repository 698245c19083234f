//! Change and regulatory impact detection.
//!
//! The base differ decides whether two snapshots differ and by how much.
//! Cosmetic diffs (`None`/`Minor`) stop there. Anything larger has its added
//! text scanned for regulatory patterns and important phrases, and the
//! counts are mapped to an impact level.

pub mod line_diff;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use std::sync::LazyLock;

use crate::traits::diff::ContentDiffer;
use crate::types::change::{ContentDiff, RegulatoryChangeResult, RegulatoryImpact, RegulatoryPattern};

pub use line_diff::LineDiffer;

/// Sentences kept per pattern category.
const EXCERPTS_PER_PATTERN: usize = 3;

/// Sentences kept per result.
const MAX_EXCERPTS: usize = 5;

/// Phrases that flag a change as material wherever they appear.
pub const IMPORTANT_PHRASES: &[&str] = &[
    "new requirement",
    "license condition",
    "licence condition",
    "compliance deadline",
    "must comply",
    "with immediate effect",
    "enforcement action",
    "penalty",
    "revoked",
    "suspended",
    "amended",
];

static PATTERNS: LazyLock<Vec<(RegulatoryPattern, Regex)>> = LazyLock::new(|| {
    RegulatoryPattern::ALL
        .into_iter()
        .map(|p| (p, Regex::new(pattern_source(p)).unwrap()))
        .collect()
});

fn pattern_source(pattern: RegulatoryPattern) -> &'static str {
    match pattern {
        RegulatoryPattern::RequirementChange => {
            r"(?i)\b(?:must|required|mandatory|shall|conditions?|obligations?)\b"
        }
        RegulatoryPattern::DateChange => {
            r"(?i)\b(?:deadlines?|effective (?:from|date)|comes? into (?:force|effect)|no later than|with effect from)\b"
        }
        RegulatoryPattern::FeeChange => {
            r"(?i)(?:\b(?:fees?|charges?|costs?|levy|levies)\b|[£$€]\s?\d[\d,]*(?:\.\d+)?)"
        }
        RegulatoryPattern::PenaltyChange => {
            r"(?i)\b(?:penalt(?:y|ies)|fines?|sanctions?|enforcement|prosecut\w*)\b"
        }
        RegulatoryPattern::ProcessChange => {
            r"(?i)\b(?:process|procedures?|applications?|submit(?:ted)?|notify|notification)\b"
        }
    }
}

/// Detects changes between snapshots and scores their regulatory impact.
#[derive(Debug, Clone, Default)]
pub struct ChangeImpactDetector<D: ContentDiffer = LineDiffer> {
    differ: D,
}

impl ChangeImpactDetector<LineDiffer> {
    /// Create a detector backed by the line differ.
    pub fn new() -> Self {
        Self { differ: LineDiffer }
    }
}

impl<D: ContentDiffer> ChangeImpactDetector<D> {
    /// Create a detector over an external diff primitive.
    pub fn with_differ(differ: D) -> Self {
        Self { differ }
    }

    /// Diff two snapshots and score the change.
    pub fn detect_changes(&self, url: &str, old_text: &str, new_text: &str) -> RegulatoryChangeResult {
        let diff = self.differ.diff(old_text, new_text);
        self.analyze(url, diff)
    }

    /// Score a diff produced elsewhere.
    pub fn analyze(&self, url: &str, diff: ContentDiff) -> RegulatoryChangeResult {
        if diff.change_type.is_cosmetic() {
            tracing::debug!(url = %url, change_type = %diff.change_type, "Cosmetic change, skipping scan");
            return RegulatoryChangeResult::unscored(url, diff);
        }

        let added = diff.added().to_string();
        let mut result = RegulatoryChangeResult::unscored(url, diff);

        let (pattern_matches, excerpts) = scan_patterns(&added);
        result.pattern_matches = pattern_matches;
        result.excerpts = excerpts;
        result.important_keywords = find_important_phrases(&added);
        result.impact = score_impact(
            result.total_pattern_matches(),
            result.important_keywords.len(),
            result.pattern_count(RegulatoryPattern::RequirementChange),
        );

        tracing::debug!(
            url = %url,
            change_type = %result.change_type,
            impact = %result.impact,
            pattern_matches = result.total_pattern_matches(),
            important_keywords = result.important_keywords.len(),
            "Scored change"
        );

        result
    }
}

fn scan_patterns(added: &str) -> (IndexMap<String, usize>, Vec<String>) {
    let mut counts = IndexMap::new();
    let mut excerpts = IndexSet::new();

    for (pattern, regex) in PATTERNS.iter() {
        let matches: Vec<_> = regex.find_iter(added).collect();
        if matches.is_empty() {
            continue;
        }
        counts.insert(pattern.name().to_string(), matches.len());

        for m in matches.iter().take(EXCERPTS_PER_PATTERN) {
            let sentence = enclosing_sentence(added, m.start(), m.end());
            if !sentence.is_empty() {
                excerpts.insert(sentence);
            }
        }
    }

    (counts, excerpts.into_iter().take(MAX_EXCERPTS).collect())
}

/// Text between the nearest period before `start` and the nearest period at
/// or after `end`, inclusive of the latter.
fn enclosing_sentence(text: &str, start: usize, end: usize) -> String {
    let from = text[..start].rfind('.').map(|i| i + 1).unwrap_or(0);
    let to = text[end..].find('.').map(|i| end + i + 1).unwrap_or(text.len());
    text[from..to].split_whitespace().collect::<Vec<_>>().join(" ")
}

fn find_important_phrases(added: &str) -> Vec<String> {
    let lowered = added.to_lowercase();
    IMPORTANT_PHRASES
        .iter()
        .filter(|phrase| lowered.contains(*phrase))
        .map(|phrase| phrase.to_string())
        .collect()
}

/// Map scan counts to an impact level; first matching rule wins.
pub fn score_impact(
    total_matches: usize,
    important_keywords: usize,
    requirement_matches: usize,
) -> RegulatoryImpact {
    if total_matches > 10 || important_keywords > 3 || requirement_matches > 5 {
        RegulatoryImpact::High
    } else if total_matches > 5 || important_keywords > 1 {
        RegulatoryImpact::Medium
    } else if total_matches > 0 || important_keywords > 0 {
        RegulatoryImpact::Low
    } else {
        RegulatoryImpact::None
    }
}
