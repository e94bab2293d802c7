//! Shared route helpers for page rendering.

use axum::http::{HeaderValue, header};
use axum::response::{Html, IntoResponse, Response};
use chrono::Datelike;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::content::portable_text::is_safe_href;
use crate::content::{Document, ImageUrlBuilder, Settings};
use crate::state::AppState;

/// Width requested for the logo.
const LOGO_WIDTH: u32 = 320;

/// Width requested for social share images.
const SHARE_IMAGE_WIDTH: u32 = 1200;

/// Head metadata for a rendered page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Seo {
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub canonical: Option<String>,
    /// Open Graph type.
    pub kind: &'static str,
    pub noindex: bool,
}

impl Seo {
    /// Metadata for a document, falling back to site-wide values.
    pub fn for_document(state: &AppState, document: &Document, settings: &Settings) -> Self {
        let path = match document.slug() {
            super::page::HOME_SLUG => String::new(),
            slug => slug.to_string(),
        };
        let share_image = document.share_image().or(settings.share_image.as_ref());

        Self {
            title: document.title().to_string(),
            description: document
                .seo_description()
                .map(str::to_string)
                .or_else(|| settings.tagline.clone()),
            image: share_image.and_then(|img| state.images().url(img, Some(SHARE_IMAGE_WIDTH))),
            canonical: Some(format!("{}/{}", state.site_url(), path)),
            kind: match document {
                Document::Story(_) => "article",
                Document::Page(_) => "website",
            },
            noindex: false,
        }
    }

    /// Metadata for pages without a document (not found, loading).
    pub fn untitled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            kind: "website",
            noindex: true,
            ..Self::default()
        }
    }
}

/// Template view of the site settings: links resolved, unsafe ones dropped.
pub fn site_view(settings: &Settings, images: &ImageUrlBuilder) -> Value {
    let navigation: Vec<_> = settings.navigation.iter().filter_map(|l| l.view()).collect();

    let columns: Vec<Value> = settings
        .footer
        .columns
        .iter()
        .filter_map(|column| {
            let links: Vec<_> = column.links.iter().filter_map(|l| l.view()).collect();
            (!links.is_empty()).then(|| json!({ "heading": column.heading, "links": links }))
        })
        .collect();

    let social: Vec<Value> = settings
        .social
        .iter()
        .filter(|s| !s.platform.is_empty() && is_safe_href(&s.url))
        .map(|s| json!({ "platform": s.platform, "url": s.url }))
        .collect();

    let newsletter = settings.newsletter.as_ref().and_then(|n| {
        let action = n.action.as_deref().filter(|a| is_safe_href(a))?;
        Some(json!({
            "heading": n.heading,
            "description": n.description,
            "action": action,
            "button_label": n.button_label.as_deref().unwrap_or("Subscribe"),
        }))
    });

    let footer_html = (!settings.footer.text.is_empty()).then(|| settings.footer.text.to_html(images));

    json!({
        "title": settings.title,
        "tagline": settings.tagline,
        "logo": images.view(settings.logo.as_ref(), Some(LOGO_WIDTH)),
        "navigation": navigation,
        "footer": {
            "html": footer_html,
            "columns": columns,
            "copyright": settings.footer.copyright,
        },
        "social": social,
        "newsletter": newsletter,
    })
}

/// Base Tera context shared by every page: site chrome, metadata, preview flag.
pub fn shell_context(state: &AppState, settings: &Settings, seo: &Seo, preview: bool) -> tera::Context {
    let mut context = tera::Context::new();
    context.insert("site", &site_view(settings, state.images()));
    context.insert("seo", seo);
    context.insert("preview", &preview);
    context.insert("year", &chrono::Utc::now().year());
    context
}

/// Render a named shell template, degrading to bare HTML on failure.
pub fn render_shell(state: &AppState, template: &str, context: &tera::Context, fallback: &str) -> String {
    state
        .theme()
        .render_template(template, context)
        .unwrap_or_else(|e| {
            warn!(template = %template, error = %e, "failed to render page template");
            format!(
                "<!DOCTYPE html><html><body><main>{}</main></body></html>",
                html_escape(fallback)
            )
        })
}

/// `Cache-Control` for a public response.
pub fn public_cache(revalidate_secs: u64) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "public, s-maxage={revalidate_secs}, stale-while-revalidate"
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("no-cache"))
}

/// `Cache-Control` for responses that must not be shared.
pub fn private_no_store() -> HeaderValue {
    HeaderValue::from_static("private, no-store")
}

/// HTML response with a `Cache-Control` header.
pub fn html_response(
    status: axum::http::StatusCode,
    cache_control: HeaderValue,
    body: String,
) -> Response {
    (status, [(header::CACHE_CONTROL, cache_control)], Html(body)).into_response()
}

/// Escape text for safe HTML interpolation.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
