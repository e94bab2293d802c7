//! Content source trait and error type.

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Document, Settings};

/// Errors raised while fetching content.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("content API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode content: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("content source misconfigured: {0}")]
    Config(String),

    #[error("failed to read content fixtures: {0}")]
    Io(#[from] std::io::Error),
}

/// Which revision of the content to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Perspective {
    /// Published documents only.
    Published,
    /// Drafts layered over published documents (preview mode).
    Drafts,
}

impl Perspective {
    pub fn as_str(self) -> &'static str {
        match self {
            Perspective::Published => "published",
            Perspective::Drafts => "drafts",
        }
    }

    pub fn from_preview(preview: bool) -> Self {
        if preview {
            Perspective::Drafts
        } else {
            Perspective::Published
        }
    }
}

/// Read access to site content.
///
/// `Ok(None)` means "no such document" and is not an error.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch the single page or story with the given slug.
    async fn document(
        &self,
        slug: &str,
        perspective: Perspective,
    ) -> Result<Option<Document>, ContentError>;

    /// Fetch the site settings singleton.
    async fn settings(&self, perspective: Perspective) -> Result<Option<Settings>, ContentError>;

    /// Whether the source is reachable.
    async fn healthy(&self) -> bool {
        true
    }

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
