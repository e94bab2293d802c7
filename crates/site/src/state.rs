//! Application state shared across all handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cache::{CacheRead, RevalidatingCache};
use crate::config::Config;
use crate::content::{
    ContentSource, Document, ImageUrlBuilder, MemorySource, Perspective, SanityClient, Settings,
};
use crate::modules::{RenderContext, RenderMode};
use crate::preview::PreviewSigner;
use crate::theme::ThemeEngine;

/// Cache key for the site settings singleton.
const SETTINGS_KEY: &str = "settings";

/// Outcome of looking up a document for a request.
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(Arc<Document>),
    NotFound,
    /// The fetch is still running; show the loading page.
    Fallback,
}

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Where documents and settings come from.
    source: Arc<dyn ContentSource>,

    /// Published documents by slug; `None` records a confirmed miss.
    documents: RevalidatingCache<Option<Arc<Document>>>,

    /// Published site settings.
    settings: RevalidatingCache<Arc<Settings>>,

    theme: ThemeEngine,
    images: ImageUrlBuilder,

    /// Absent when no preview secret is configured.
    preview: Option<PreviewSigner>,

    render_mode: RenderMode,
    fallback_timeout: Duration,
    revalidate_secs: u64,
    site_url: String,
    project_id: Option<String>,
    dataset: String,
    static_dir: PathBuf,
}

impl AppState {
    /// Build state from configuration, choosing the content source.
    pub fn new(config: &Config) -> Result<Self> {
        let source: Arc<dyn ContentSource> = match &config.content_fixtures {
            Some(path) => Arc::new(
                MemorySource::from_file(path)
                    .with_context(|| format!("failed to load fixtures from {}", path.display()))?,
            ),
            None => Arc::new(
                SanityClient::new(&config.cms).context("failed to create content client")?,
            ),
        };

        Self::with_source(config, source)
    }

    /// Build state around an existing content source.
    pub fn with_source(config: &Config, source: Arc<dyn ContentSource>) -> Result<Self> {
        let theme = ThemeEngine::new(config.templates_dir.as_deref())
            .context("failed to initialize theme engine")?;

        let images = ImageUrlBuilder::new(
            config.cms.project_id.as_deref().unwrap_or_default(),
            &config.cms.dataset,
        );

        let preview = config
            .preview_secret
            .as_deref()
            .map(PreviewSigner::new)
            .transpose()?;
        if preview.is_none() {
            warn!("PREVIEW_SECRET not set, draft preview is disabled");
        }

        let revalidate_after = Duration::from_secs(config.revalidate_secs);
        let render_mode = if config.dev_mode {
            RenderMode::Development
        } else {
            RenderMode::Production
        };

        info!(
            content_source = source.name(),
            revalidate_secs = config.revalidate_secs,
            fallback_timeout_ms = config.fallback_timeout_ms,
            mode = ?render_mode,
            "application state initialized"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                source,
                documents: RevalidatingCache::new(revalidate_after),
                settings: RevalidatingCache::new(revalidate_after),
                theme,
                images,
                preview,
                render_mode,
                fallback_timeout: Duration::from_millis(config.fallback_timeout_ms),
                revalidate_secs: config.revalidate_secs,
                site_url: config.site_url.clone(),
                project_id: config.cms.project_id.clone(),
                dataset: config.cms.dataset.clone(),
                static_dir: config.static_dir.clone(),
            }),
        })
    }

    /// Look up the document for `slug`.
    ///
    /// Published reads go through the cache and fall back when a cold fetch
    /// outlasts the timeout. Draft reads bypass the cache.
    pub async fn resolve(&self, slug: &str, perspective: Perspective) -> Resolution {
        if perspective == Perspective::Drafts {
            return match self.inner.source.document(slug, perspective).await {
                Ok(Some(doc)) => Resolution::Found(Arc::new(doc)),
                Ok(None) => Resolution::NotFound,
                Err(e) => {
                    warn!(slug = %slug, error = %e, "draft document fetch failed");
                    Resolution::NotFound
                }
            };
        }

        let source = Arc::clone(&self.inner.source);
        let owned_slug = slug.to_string();
        let read = self
            .inner
            .documents
            .get_or_fetch(
                &format!("document:{slug}"),
                self.inner.fallback_timeout,
                move || async move {
                    source
                        .document(&owned_slug, Perspective::Published)
                        .await
                        .map(|doc| doc.map(Arc::new))
                },
            )
            .await;

        match read {
            CacheRead::Pending => Resolution::Fallback,
            other => match other.into_value().flatten() {
                Some(doc) => Resolution::Found(doc),
                None => Resolution::NotFound,
            },
        }
    }

    /// Site-wide settings; defaults when missing or unavailable.
    pub async fn site_settings(&self, perspective: Perspective) -> Arc<Settings> {
        if perspective == Perspective::Drafts {
            return match self.inner.source.settings(perspective).await {
                Ok(settings) => Arc::new(settings.unwrap_or_default()),
                Err(e) => {
                    warn!(error = %e, "draft settings fetch failed");
                    Arc::new(Settings::default())
                }
            };
        }

        let source = Arc::clone(&self.inner.source);
        self.inner
            .settings
            .get_or_fetch(SETTINGS_KEY, self.inner.fallback_timeout, move || async move {
                source
                    .settings(Perspective::Published)
                    .await
                    .map(|s| Arc::new(s.unwrap_or_default()))
            })
            .await
            .into_value()
            .unwrap_or_default()
    }

    /// Whether the content source answers.
    pub async fn content_healthy(&self) -> bool {
        self.inner.source.healthy().await
    }

    pub fn content_source_name(&self) -> &'static str {
        self.inner.source.name()
    }

    pub fn theme(&self) -> &ThemeEngine {
        &self.inner.theme
    }

    pub fn images(&self) -> &ImageUrlBuilder {
        &self.inner.images
    }

    /// Everything module renderers need for this process.
    pub fn render_context(&self) -> RenderContext<'_> {
        RenderContext {
            theme: &self.inner.theme,
            images: &self.inner.images,
            mode: self.inner.render_mode,
        }
    }

    pub fn render_mode(&self) -> RenderMode {
        self.inner.render_mode
    }

    pub fn preview_signer(&self) -> Option<&PreviewSigner> {
        self.inner.preview.as_ref()
    }

    pub fn revalidate_secs(&self) -> u64 {
        self.inner.revalidate_secs
    }

    pub fn site_url(&self) -> &str {
        &self.inner.site_url
    }

    pub fn project_id(&self) -> Option<&str> {
        self.inner.project_id.as_deref()
    }

    pub fn dataset(&self) -> &str {
        &self.inner.dataset
    }

    pub fn static_dir(&self) -> &Path {
        &self.inner.static_dir
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("content_source", &self.inner.source.name())
            .field("documents", &self.inner.documents)
            .field("theme", &self.inner.theme)
            .field("render_mode", &self.inner.render_mode)
            .finish()
    }
}
