//! Change types - diff magnitude, regulatory impact and detection results.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the diff section holding newly introduced text.
pub const ADDED_SECTION: &str = "Added";

/// Name of the diff section holding text that disappeared.
pub const REMOVED_SECTION: &str = "Removed";

/// Overall magnitude of a content change, as reported by a differ.
///
/// `New` marks a first capture with nothing to compare against; differs
/// never produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    None,
    Minor,
    Moderate,
    Major,
    New,
}

impl ChangeType {
    /// Too small to be worth a regulatory scan.
    pub fn is_cosmetic(&self) -> bool {
        matches!(self, Self::None | Self::Minor)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Minor => "Minor",
            Self::Moderate => "Moderate",
            Self::Major => "Major",
            Self::New => "New",
        }
    }

    /// Parse the stored name back (unknown names read as `None`).
    pub fn parse(s: &str) -> Self {
        match s {
            "Minor" => Self::Minor,
            "Moderate" => Self::Moderate,
            "Major" => Self::Major,
            "New" => Self::New,
            _ => Self::None,
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the base diff primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDiff {
    pub change_type: ChangeType,

    /// Named changed sections ("Added" / "Removed") → text
    #[serde(default)]
    pub sections: IndexMap<String, String>,
}

impl ContentDiff {
    /// A diff with no changes.
    pub fn unchanged() -> Self {
        Self {
            change_type: ChangeType::None,
            sections: IndexMap::new(),
        }
    }

    /// Create a diff of the given magnitude.
    pub fn new(change_type: ChangeType) -> Self {
        Self {
            change_type,
            sections: IndexMap::new(),
        }
    }

    /// Set the added text.
    pub fn with_added(mut self, text: impl Into<String>) -> Self {
        self.sections.insert(ADDED_SECTION.to_string(), text.into());
        self
    }

    /// Set the removed text.
    pub fn with_removed(mut self, text: impl Into<String>) -> Self {
        self.sections.insert(REMOVED_SECTION.to_string(), text.into());
        self
    }

    /// Newly introduced text (empty when none).
    pub fn added(&self) -> &str {
        self.sections
            .get(ADDED_SECTION)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Regulatory pattern categories scanned in added text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegulatoryPattern {
    RequirementChange,
    DateChange,
    FeeChange,
    PenaltyChange,
    ProcessChange,
}

impl RegulatoryPattern {
    pub const ALL: [RegulatoryPattern; 5] = [
        RegulatoryPattern::RequirementChange,
        RegulatoryPattern::DateChange,
        RegulatoryPattern::FeeChange,
        RegulatoryPattern::PenaltyChange,
        RegulatoryPattern::ProcessChange,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::RequirementChange => "RequirementChange",
            Self::DateChange => "DateChange",
            Self::FeeChange => "FeeChange",
            Self::PenaltyChange => "PenaltyChange",
            Self::ProcessChange => "ProcessChange",
        }
    }
}

/// Materiality of a detected change.
///
/// The detector emits at most `High`; `Critical` is assigned by consumers
/// that also weigh the document type.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RegulatoryImpact {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl RegulatoryImpact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for RegulatoryImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of comparing two snapshots of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryChangeResult {
    pub url: String,

    /// Magnitude reported by the base differ
    pub change_type: ChangeType,

    pub detected_at: DateTime<Utc>,

    /// "Added" / "Removed" → text
    #[serde(default)]
    pub changed_sections: IndexMap<String, String>,

    /// Pattern category name → match count (only categories that matched)
    #[serde(default)]
    pub pattern_matches: IndexMap<String, usize>,

    /// Distinct important phrases found in the added text
    #[serde(default)]
    pub important_keywords: Vec<String>,

    /// Up to five sentences illustrating the matches
    #[serde(default)]
    pub excerpts: Vec<String>,

    pub impact: RegulatoryImpact,
}

impl RegulatoryChangeResult {
    /// A result that carries the diff but no regulatory analysis.
    pub fn unscored(url: impl Into<String>, diff: ContentDiff) -> Self {
        Self {
            url: url.into(),
            change_type: diff.change_type,
            detected_at: Utc::now(),
            changed_sections: diff.sections,
            pattern_matches: IndexMap::new(),
            important_keywords: Vec::new(),
            excerpts: Vec::new(),
            impact: RegulatoryImpact::None,
        }
    }

    /// Total matches across all pattern categories.
    pub fn total_pattern_matches(&self) -> usize {
        self.pattern_matches.values().sum()
    }

    /// Match count for one category.
    pub fn pattern_count(&self, pattern: RegulatoryPattern) -> usize {
        self.pattern_matches
            .get(pattern.name())
            .copied()
            .unwrap_or(0)
    }

    /// Human-readable summary for alerting.
    pub fn impact_summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Regulatory change detected: {}\n", self.url));
        out.push_str(&format!("Change type: {}\n", self.change_type));
        out.push_str(&format!("Impact level: {}\n", self.impact));

        if !self.pattern_matches.is_empty() {
            out.push_str("\nPattern matches:\n");
            for (name, count) in &self.pattern_matches {
                out.push_str(&format!("- {}: {}\n", name, count));
            }
        }

        if !self.important_keywords.is_empty() {
            out.push_str(&format!(
                "\nImportant keywords: {}\n",
                self.important_keywords.join(", ")
            ));
        }

        if !self.excerpts.is_empty() {
            out.push_str("\nExcerpts:\n");
            for excerpt in self.excerpts.iter().take(5) {
                out.push_str(&format!("> {}\n", excerpt));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_type_ordering() {
        assert!(ChangeType::None < ChangeType::Minor);
        assert!(ChangeType::Minor < ChangeType::Moderate);
        assert!(ChangeType::Moderate < ChangeType::Major);
        assert!(ChangeType::None.is_cosmetic());
        assert!(ChangeType::Minor.is_cosmetic());
        assert!(!ChangeType::Major.is_cosmetic());
    }

    #[test]
    fn test_change_type_parse() {
        for t in [
            ChangeType::None,
            ChangeType::Minor,
            ChangeType::Moderate,
            ChangeType::Major,
            ChangeType::New,
        ] {
            assert_eq!(ChangeType::parse(t.as_str()), t);
        }
        assert_eq!(ChangeType::parse("garbage"), ChangeType::None);
    }

    #[test]
    fn test_impact_ordering() {
        assert!(RegulatoryImpact::None < RegulatoryImpact::Low);
        assert!(RegulatoryImpact::Medium < RegulatoryImpact::High);
        assert!(RegulatoryImpact::High < RegulatoryImpact::Critical);
    }

    #[test]
    fn test_impact_summary_lists_findings() {
        let mut result = RegulatoryChangeResult::unscored(
            "https://example.gov/rules",
            ContentDiff::new(ChangeType::Major).with_added("Firms must register."),
        );
        result.pattern_matches.insert("RequirementChange".into(), 1);
        result.important_keywords.push("new requirement".into());
        result.excerpts.push("Firms must register.".into());
        result.impact = RegulatoryImpact::Low;

        let summary = result.impact_summary();
        assert!(summary.contains("https://example.gov/rules"));
        assert!(summary.contains("Change type: Major"));
        assert!(summary.contains("Impact level: Low"));
        assert!(summary.contains("RequirementChange: 1"));
        assert!(summary.contains("new requirement"));
        assert!(summary.contains("> Firms must register."));
    }
}
