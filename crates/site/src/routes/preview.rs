//! Draft-mode toggles.
//!
//! `GET /api/draft?slug=&token=` turns preview on for the session when the
//! token is the signature of the slug; `GET /api/draft/disable` turns it
//! off again.

use anyhow::Context;
use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use super::page::{HOME_SLUG, is_valid_slug};
use crate::error::{AppError, AppResult};
use crate::session::SESSION_PREVIEW;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct DraftParams {
    slug: Option<String>,
    token: Option<String>,
}

/// Create the preview router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/draft", get(enable_draft))
        .route("/api/draft/disable", get(disable_draft))
}

/// Path a document is served at.
fn document_path(slug: &str) -> String {
    if slug == HOME_SLUG {
        "/".to_string()
    } else {
        format!("/{slug}")
    }
}

async fn enable_draft(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<DraftParams>,
) -> AppResult<Redirect> {
    let Some(signer) = state.preview_signer() else {
        warn!("draft mode requested but no preview secret is configured");
        return Err(AppError::Unauthorized);
    };

    let slug = params
        .slug
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| HOME_SLUG.to_string());
    let token = params.token.unwrap_or_default();

    if !signer.verify(&slug, &token) {
        warn!(slug = %slug, "rejected draft mode token");
        return Err(AppError::Unauthorized);
    }

    // Only checked after the signature, so probing reveals nothing
    if !is_valid_slug(&slug) {
        return Err(AppError::BadRequest("invalid slug".to_string()));
    }

    session
        .insert(SESSION_PREVIEW, true)
        .await
        .context("failed to store preview flag")?;

    info!(slug = %slug, "draft mode enabled");
    Ok(Redirect::temporary(&document_path(&slug)))
}

async fn disable_draft(session: Session) -> AppResult<Redirect> {
    session
        .remove::<bool>(SESSION_PREVIEW)
        .await
        .context("failed to clear preview flag")?;

    info!("draft mode disabled");
    Ok(Redirect::temporary("/"))
}
