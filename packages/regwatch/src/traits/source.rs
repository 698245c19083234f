//! Page source trait for the fetch/render/extract layer.
//!
//! The monitoring core never performs HTTP, DOM parsing or binary document
//! decoding itself. A `PageSource` hands it already-extracted text plus
//! whatever structural signals the source could recover.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::FetchResult;
use crate::types::structure::{DocumentMetadata, DocumentStructure};

/// Content produced for one URL by the fetch layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedPage {
    /// URL that was fetched
    pub url: String,

    /// Rendered HTML, when the source is a web page
    pub html: Option<String>,

    /// Extracted plain text
    pub text: String,

    /// Parsed page signals, when the source is a web page
    pub structure: Option<DocumentStructure>,

    /// Metadata of a binary document (PDF, Word, ...)
    pub document: Option<DocumentMetadata>,

    /// When the content was fetched
    pub fetched_at: DateTime<Utc>,
}

impl FetchedPage {
    /// Create a page with plain text only.
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: None,
            text: text.into(),
            structure: None,
            document: None,
            fetched_at: Utc::now(),
        }
    }

    /// Set the rendered HTML.
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Set the parsed page structure.
    pub fn with_structure(mut self, structure: DocumentStructure) -> Self {
        self.structure = Some(structure);
        self
    }

    /// Set binary document metadata.
    pub fn with_document(mut self, document: DocumentMetadata) -> Self {
        self.document = Some(document);
        self
    }

    /// Structural signals for classification: the page structure if parsed,
    /// otherwise whatever the document metadata provides.
    pub fn classification_structure(&self) -> Option<DocumentStructure> {
        self.structure
            .clone()
            .or_else(|| self.document.as_ref().map(DocumentMetadata::to_structure))
    }
}

/// Fetches and extracts content for a URL.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage>;
}

#[async_trait]
impl<P: PageSource + ?Sized> PageSource for Arc<P> {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        (**self).fetch(url).await
    }
}
