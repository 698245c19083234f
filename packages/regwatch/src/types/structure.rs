//! Structural signals supplied by the page parsing and document extraction layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signals taken from a parsed HTML page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentStructure {
    /// Contents of the `<title>` element
    pub title: Option<String>,

    /// Contents of `<meta name="description">`
    pub meta_description: Option<String>,

    /// Number of `<table>` elements
    pub table_count: usize,

    /// Number of `<form>` elements
    pub form_count: usize,

    /// Link targets (`href` values)
    #[serde(default)]
    pub links: Vec<String>,
}

impl DocumentStructure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the meta description.
    pub fn with_meta_description(mut self, description: impl Into<String>) -> Self {
        self.meta_description = Some(description.into());
        self
    }

    /// Set the table count.
    pub fn with_tables(mut self, count: usize) -> Self {
        self.table_count = count;
        self
    }

    /// Set the form count.
    pub fn with_forms(mut self, count: usize) -> Self {
        self.form_count = count;
        self
    }

    /// Add a link target.
    pub fn with_link(mut self, href: impl Into<String>) -> Self {
        self.links.push(href.into());
        self
    }

    /// Whether any link points at a PDF.
    pub fn links_to_pdf(&self) -> bool {
        self.links.iter().any(|l| is_pdf_url(l))
    }
}

/// Basic metadata extracted from a linked binary document (PDF, Word, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub page_count: Option<u32>,
}

impl DocumentMetadata {
    /// Structural view of the document (binary formats only expose a title).
    pub fn to_structure(&self) -> DocumentStructure {
        DocumentStructure {
            title: self.title.clone(),
            ..Default::default()
        }
    }

    /// Flatten into string pairs for version metadata.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(title) = &self.title {
            pairs.push(("doc_title".to_string(), title.clone()));
        }
        if let Some(author) = &self.author {
            pairs.push(("doc_author".to_string(), author.clone()));
        }
        if let Some(created) = self.created_at {
            pairs.push(("doc_created_at".to_string(), created.to_rfc3339()));
        }
        if let Some(modified) = self.modified_at {
            pairs.push(("doc_modified_at".to_string(), modified.to_rfc3339()));
        }
        if let Some(pages) = self.page_count {
            pairs.push(("doc_page_count".to_string(), pages.to_string()));
        }
        pairs
    }
}

/// Whether a URL path ends in `.pdf` (query and fragment ignored).
pub fn is_pdf_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.to_ascii_lowercase().ends_with(".pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf_url() {
        assert!(is_pdf_url("https://example.gov/docs/rules.pdf"));
        assert!(is_pdf_url("https://example.gov/docs/RULES.PDF?download=1"));
        assert!(!is_pdf_url("https://example.gov/docs/pdf-guide"));
    }

    #[test]
    fn test_metadata_pairs() {
        let meta = DocumentMetadata {
            title: Some("Annual report".into()),
            page_count: Some(12),
            ..Default::default()
        };
        let pairs = meta.to_pairs();
        assert!(pairs.contains(&("doc_title".to_string(), "Annual report".to_string())));
        assert!(pairs.contains(&("doc_page_count".to_string(), "12".to_string())));
        assert_eq!(meta.to_structure().title.as_deref(), Some("Annual report"));
    }
}
