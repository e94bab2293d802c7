//! Page and story routes.
//!
//! `GET /` renders the document with slug `home`; `GET /{slug}` renders any
//! other page or story. Each request resolves to one of three outcomes:
//! the document (200), the not-found page (404), or the loading page when
//! a cold fetch is still running.

use std::sync::LazyLock;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Router;
use axum::routing::get;
use regex::Regex;
use serde_json::json;
use tower_sessions::Session;
use tracing::{debug, warn};

use super::helpers::{
    Seo, html_escape, html_response, private_no_store, public_cache, render_shell, shell_context,
};
use crate::content::{Document, Perspective, Settings};
use crate::modules::{ModuleKind, render_modules};
use crate::session::preview_enabled;
use crate::state::{AppState, Resolution};

/// Slug of the document served at `/`.
pub const HOME_SLUG: &str = "home";

/// Width requested for a story's featured image.
const STORY_IMAGE_WIDTH: u32 = 1600;

/// Seconds before the loading page reloads itself.
const LOADING_REFRESH_SECS: u64 = 2;

/// Slugs: ASCII letters, digits, `-` and `_`, starting alphanumeric.
///
/// # Panics
///
/// Panics if the hard-coded regex literal is invalid (impossible in practice).
#[allow(clippy::expect_used)]
static SLUG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,199}$").expect("valid regex literal")
});

/// Whether `slug` could name a document.
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_PATTERN.is_match(slug)
}

/// Create the page router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/{slug}", get(page))
}

async fn home(State(state): State<AppState>, session: Session) -> Response {
    render_slug(&state, &session, HOME_SLUG).await
}

async fn page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
) -> Response {
    // The home document only lives at the root
    if slug == HOME_SLUG {
        return Redirect::permanent("/").into_response();
    }

    if !is_valid_slug(&slug) {
        debug!(slug = %slug, "rejecting malformed slug");
        let preview = preview_enabled(&session).await;
        let settings = state.site_settings(Perspective::from_preview(preview)).await;
        return not_found(&state, &settings, preview);
    }

    render_slug(&state, &session, &slug).await
}

async fn render_slug(state: &AppState, session: &Session, slug: &str) -> Response {
    let preview = preview_enabled(session).await;
    let perspective = Perspective::from_preview(preview);

    let (resolution, settings) = tokio::join!(
        state.resolve(slug, perspective),
        state.site_settings(perspective)
    );

    match resolution {
        Resolution::Found(document) => found(state, &document, &settings, preview),
        Resolution::NotFound => not_found(state, &settings, preview),
        Resolution::Fallback => loading(state, &settings, preview),
    }
}

fn cache_control(state: &AppState, preview: bool) -> axum::http::HeaderValue {
    if preview {
        private_no_store()
    } else {
        public_cache(state.revalidate_secs())
    }
}

fn found(state: &AppState, document: &Document, settings: &Settings, preview: bool) -> Response {
    let mut seo = Seo::for_document(state, document, settings);
    seo.noindex = preview;
    let mut context = shell_context(state, settings, &seo, preview);
    context.insert("slug", document.slug());
    context.insert("document_type", document.type_name());

    match document {
        Document::Page(page) => {
            let sections = render_modules(&state.render_context(), &page.modules);
            let has_slideshow = sections
                .iter()
                .any(|s| s.type_name == ModuleKind::Slideshow.type_name());
            debug!(
                slug = %page.slug,
                modules = page.modules.len(),
                sections = sections.len(),
                "rendered page modules"
            );
            context.insert("sections", &sections);
            context.insert("has_slideshow", &has_slideshow);
        }
        Document::Story(story) => {
            let images = state.images();
            let view = json!({
                "title": story.title,
                "image": images.view(story.featured_image.as_ref(), Some(STORY_IMAGE_WIDTH)),
                "published_at": story.published_at.map(|d| d.to_rfc3339()),
                "excerpt": story.excerpt,
                "html": (!story.content.is_empty()).then(|| story.content.to_html(images)),
            });
            context.insert("story", &view);
        }
    }

    let html = state
        .theme()
        .render_page(document.type_name(), document.slug(), &context)
        .unwrap_or_else(|e| {
            warn!(slug = %document.slug(), error = %e, "failed to render page template");
            format!(
                "<!DOCTYPE html><html><body><main><h1>{}</h1></main></body></html>",
                html_escape(document.title())
            )
        });

    html_response(StatusCode::OK, cache_control(state, preview), html)
}

fn not_found(state: &AppState, settings: &Settings, preview: bool) -> Response {
    let seo = Seo::untitled("Page not found");
    let context = shell_context(state, settings, &seo, preview);
    let html = render_shell(state, "not_found.html", &context, "Page not found");
    html_response(StatusCode::NOT_FOUND, cache_control(state, preview), html)
}

fn loading(state: &AppState, settings: &Settings, preview: bool) -> Response {
    let seo = Seo::untitled("Loading");
    let mut context = shell_context(state, settings, &seo, preview);
    context.insert("refresh_secs", &LOADING_REFRESH_SECS);
    let html = render_shell(state, "loading.html", &context, "Loading");
    // The loading page must never be cached
    html_response(StatusCode::OK, private_no_store(), html)
}
