//! Classification types - document types and scored results.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Regulatory document category assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    Guidance,
    Regulation,
    Consultation,
    EnforcementAction,
    PressRelease,
    Statistics,
    LicensingInfo,
    Other,
}

impl DocumentType {
    /// Every type, in tie-break order (earlier wins on equal score).
    pub const ALL: [DocumentType; 8] = [
        DocumentType::Guidance,
        DocumentType::Regulation,
        DocumentType::Consultation,
        DocumentType::EnforcementAction,
        DocumentType::PressRelease,
        DocumentType::Statistics,
        DocumentType::LicensingInfo,
        DocumentType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guidance => "Guidance",
            Self::Regulation => "Regulation",
            Self::Consultation => "Consultation",
            Self::EnforcementAction => "EnforcementAction",
            Self::PressRelease => "PressRelease",
            Self::Statistics => "Statistics",
            Self::LicensingInfo => "LicensingInfo",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one page or document.
///
/// `primary_type` is always the arg-max of `scores`; `confidence` is the top
/// score divided by 10, clamped to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Highest-scoring type
    pub primary_type: DocumentType,

    /// Runner-up, only when it scored above zero
    pub secondary_type: Option<DocumentType>,

    /// Certainty of the primary type (0.0 to 1.0)
    pub confidence: f64,

    /// Accumulated score for every type
    pub scores: BTreeMap<DocumentType, f64>,

    /// Keywords that matched, in first-seen order, each once
    pub matched_keywords: IndexSet<String>,
}

impl ClassificationResult {
    /// Resolve accumulated scores into a result.
    pub fn from_scores(
        scores: BTreeMap<DocumentType, f64>,
        matched_keywords: IndexSet<String>,
    ) -> Self {
        let mut ranked: Vec<(DocumentType, f64)> = DocumentType::ALL
            .iter()
            .map(|t| (*t, scores.get(t).copied().unwrap_or(0.0)))
            .collect();

        // Stable sort keeps ALL order for equal scores.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let (top_type, top_score) = ranked[0];
        let (primary_type, confidence) = if top_score > 0.0 {
            (top_type, (top_score / 10.0).clamp(0.0, 1.0))
        } else {
            (DocumentType::Other, 0.0)
        };

        let secondary_type = ranked
            .iter()
            .filter(|(t, _)| *t != primary_type)
            .find(|(_, s)| *s > 0.0)
            .map(|(t, _)| *t)
            .filter(|_| top_score > 0.0);

        Self {
            primary_type,
            secondary_type,
            confidence,
            scores,
            matched_keywords,
        }
    }

    /// Score recorded for a type (0.0 when absent).
    pub fn score(&self, doc_type: DocumentType) -> f64 {
        self.scores.get(&doc_type).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(DocumentType, f64)]) -> BTreeMap<DocumentType, f64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_primary_and_secondary() {
        let result = ClassificationResult::from_scores(
            scores(&[
                (DocumentType::Guidance, 2.0),
                (DocumentType::Regulation, 5.0),
                (DocumentType::Statistics, 0.0),
            ]),
            IndexSet::new(),
        );

        assert_eq!(result.primary_type, DocumentType::Regulation);
        assert_eq!(result.secondary_type, Some(DocumentType::Guidance));
        assert!((result.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_no_secondary_when_runner_up_is_zero() {
        let result = ClassificationResult::from_scores(
            scores(&[(DocumentType::Consultation, 3.0)]),
            IndexSet::new(),
        );
        assert_eq!(result.primary_type, DocumentType::Consultation);
        assert_eq!(result.secondary_type, None);
    }

    #[test]
    fn test_confidence_is_capped() {
        let result = ClassificationResult::from_scores(
            scores(&[(DocumentType::Statistics, 42.0)]),
            IndexSet::new(),
        );
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_all_zero_is_other() {
        let result = ClassificationResult::from_scores(BTreeMap::new(), IndexSet::new());
        assert_eq!(result.primary_type, DocumentType::Other);
        assert_eq!(result.secondary_type, None);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_ties_follow_declaration_order() {
        let result = ClassificationResult::from_scores(
            scores(&[
                (DocumentType::PressRelease, 1.0),
                (DocumentType::Guidance, 1.0),
            ]),
            IndexSet::new(),
        );
        assert_eq!(result.primary_type, DocumentType::Guidance);
        assert_eq!(result.secondary_type, Some(DocumentType::PressRelease));
    }
}
