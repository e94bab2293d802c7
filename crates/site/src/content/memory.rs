//! In-memory content source for tests and offline runs.
//!
//! Documents are stored in their projected shape, so a fixture file looks
//! exactly like query API results:
//!
//! ```json
//! {
//!   "settings": { "title": "Hope Ministries" },
//!   "documents": [ { "_type": "page", "_id": "home", "slug": "home", "modules": [] } ],
//!   "drafts": []
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::models::{Document, Settings};
use super::source::{ContentError, ContentSource, Perspective};

#[derive(Debug, Default, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    settings: Option<Settings>,
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    drafts: Vec<Document>,
}

/// Content held in memory, keyed by slug.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    published: HashMap<String, Document>,
    drafts: HashMap<String, Document>,
    settings: Option<Settings>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture file.
    pub fn from_file(path: &Path) -> Result<Self, ContentError> {
        let raw = std::fs::read_to_string(path)?;
        let source = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            documents = source.published.len(),
            drafts = source.drafts.len(),
            "loaded content fixtures"
        );
        Ok(source)
    }

    /// Parse fixtures from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self, ContentError> {
        let file: FixtureFile = serde_json::from_str(raw)?;
        let mut source = Self::new();
        source.settings = file.settings;
        for doc in file.documents {
            source.insert(doc);
        }
        for doc in file.drafts {
            source.insert_draft(doc);
        }
        Ok(source)
    }

    /// Add or replace a published document.
    pub fn insert(&mut self, document: Document) {
        self.published.insert(document.slug().to_string(), document);
    }

    /// Add or replace a draft revision.
    pub fn insert_draft(&mut self, document: Document) {
        self.drafts.insert(document.slug().to_string(), document);
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn document(
        &self,
        slug: &str,
        perspective: Perspective,
    ) -> Result<Option<Document>, ContentError> {
        let draft = match perspective {
            Perspective::Drafts => self.drafts.get(slug),
            Perspective::Published => None,
        };
        Ok(draft.or_else(|| self.published.get(slug)).cloned())
    }

    async fn settings(&self, _perspective: Perspective) -> Result<Option<Settings>, ContentError> {
        Ok(self.settings.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
