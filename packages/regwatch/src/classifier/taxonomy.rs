//! Default keyword and pattern tables for regulator websites.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::types::classification::DocumentType;

/// Keyword lists and text patterns per document type.
///
/// Plain data: the classifier compiles it once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierRules {
    /// Lowercase keywords matched on word boundaries in text and titles,
    /// and as path segments in URLs
    pub keywords: BTreeMap<DocumentType, Vec<String>>,

    /// Case-insensitive regex patterns counted in the body text
    pub text_patterns: BTreeMap<DocumentType, Vec<String>>,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            keywords: table(DEFAULT_KEYWORDS),
            text_patterns: table(DEFAULT_TEXT_PATTERNS),
        }
    }
}

impl ClassifierRules {
    /// Rules with no keywords or patterns.
    pub fn empty() -> Self {
        Self {
            keywords: BTreeMap::new(),
            text_patterns: BTreeMap::new(),
        }
    }

    /// Add keywords for a type.
    pub fn with_keywords(
        mut self,
        doc_type: DocumentType,
        keywords: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.keywords
            .entry(doc_type)
            .or_default()
            .extend(keywords.into_iter().map(Into::into));
        self
    }

    /// Add a text pattern for a type.
    pub fn with_pattern(mut self, doc_type: DocumentType, pattern: impl Into<String>) -> Self {
        self.text_patterns
            .entry(doc_type)
            .or_default()
            .push(pattern.into());
        self
    }
}

fn table(rows: &[(DocumentType, &[&str])]) -> BTreeMap<DocumentType, Vec<String>> {
    rows.iter()
        .map(|(t, items)| (*t, items.iter().map(|s| s.to_string()).collect()))
        .collect()
}

const DEFAULT_KEYWORDS: &[(DocumentType, &[&str])] = &[
    (
        DocumentType::Guidance,
        &[
            "guidance",
            "guide",
            "how to",
            "best practice",
            "advice",
            "faq",
            "help",
            "handbook",
            "toolkit",
        ],
    ),
    (
        DocumentType::Regulation,
        &[
            "regulation",
            "regulations",
            "legislation",
            "statutory",
            "rules",
            "directive",
            "statutory instrument",
        ],
    ),
    (
        DocumentType::Consultation,
        &[
            "consultation",
            "consult",
            "call for evidence",
            "proposal",
            "proposals",
            "feedback",
            "have your say",
            "draft",
        ],
    ),
    (
        DocumentType::EnforcementAction,
        &[
            "enforcement",
            "enforcement action",
            "penalty",
            "fine",
            "fined",
            "sanction",
            "prosecution",
            "warning notice",
            "breach",
        ],
    ),
    (
        DocumentType::PressRelease,
        &[
            "press release",
            "news",
            "announcement",
            "media",
            "statement",
        ],
    ),
    (
        DocumentType::Statistics,
        &[
            "statistics",
            "data",
            "figures",
            "survey",
            "annual report",
            "dataset",
        ],
    ),
    (
        DocumentType::LicensingInfo,
        &[
            "licence",
            "license",
            "licensing",
            "permit",
            "application",
            "registration",
            "authorisation",
            "renewal",
        ],
    ),
];

const DEFAULT_TEXT_PATTERNS: &[(DocumentType, &[&str])] = &[
    (
        DocumentType::Guidance,
        &[r"\bstep \d+\b", r"\byou (?:should|must|can|need to)\b"],
    ),
    (
        DocumentType::Regulation,
        &[
            r"\b(?:section|article|regulation)\s+\d+[a-z]?\b",
            r"\bschedule\s+\d+\b",
            r"\bstatutory instrument\s+\d{4}/\d+\b",
        ],
    ),
    (
        DocumentType::Consultation,
        &[
            r"\b(?:closes|closing date|deadline for responses)\b",
            r"\bquestion\s+\d+\b",
            r"\brespond(?:ing)? (?:to|by)\b",
        ],
    ),
    (
        DocumentType::EnforcementAction,
        &[
            r"\b(?:fined|penalised|penalized|prosecuted|convicted)\b",
            r"\bnotice of (?:intent|decision)\b",
        ],
    ),
    (
        DocumentType::PressRelease,
        &[r"\bfor immediate release\b", r"\b(?:announced|said) today\b"],
    ),
    (
        DocumentType::Statistics,
        &[
            r"\b(?:quarter|q[1-4])\s+\d{4}\b",
            r"\b(?:year on year|per cent|percentage points?)\b",
        ],
    ),
    (
        DocumentType::LicensingInfo,
        &[
            r"\bapply (?:for|online)\b",
            r"\b(?:licen[cs]e|permit) (?:number|holder|fee)s?\b",
        ],
    ),
];

/// URL path checks, +2.0 each.
pub(crate) static URL_PATTERNS: LazyLock<Vec<(DocumentType, Regex)>> = LazyLock::new(|| {
    [
        (DocumentType::Regulation, r"/(?:regulations?|legislation|laws)\b"),
        (DocumentType::Guidance, r"/(?:guide|guidance|help)\b"),
        (DocumentType::Consultation, r"/(?:consultations?|call-for-evidence|have-your-say)\b"),
        (DocumentType::EnforcementAction, r"/(?:enforcement|penalties|sanctions|prosecutions)\b"),
        (DocumentType::PressRelease, r"/(?:news|press|media|announcements)\b"),
        (DocumentType::Statistics, r"/(?:statistics|data|research)\b"),
        (DocumentType::LicensingInfo, r"/(?:licen[cs]ing|licen[cs]es?|permits?|apply)\b"),
    ]
    .into_iter()
    .map(|(t, p)| (t, Regex::new(&format!("(?i){p}")).unwrap()))
    .collect()
});

pub(crate) static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:\d{4}-\d{2}-\d{2}|\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4}|\d{1,2}\s+(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\s+\d{4})\b",
    )
    .unwrap()
});

pub(crate) static RE_CURRENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[£$€]\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:m|bn|k)\b)?").unwrap());

pub(crate) static RE_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?\s?%").unwrap());
