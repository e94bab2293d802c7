//! Handshake endpoint for the CMS studio's presentation tool.
//!
//! The studio runs on another origin and calls this with credentials to
//! learn whether the session is in draft mode.

use axum::extract::State;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_sessions::Session;
use tracing::warn;

use crate::session::preview_enabled;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct PresentationResponse {
    ok: bool,
    preview: bool,
    project: Option<String>,
    dataset: String,
}

/// Create the presentation router, allowing the given studio origins.
pub fn router(studio_origins: &[String]) -> Router<AppState> {
    Router::new()
        .route(
            "/api/presentation",
            get(presentation).options(presentation),
        )
        .layer(build_cors_layer(studio_origins))
}

/// CORS for the studio: listed origins only, with credentials.
fn build_cors_layer(studio_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = studio_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring unparseable studio origin");
                None
            }
        })
        .collect();

    // Wildcards cannot be combined with credentials, so headers are mirrored
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn presentation(State(state): State<AppState>, session: Session) -> Json<PresentationResponse> {
    Json(PresentationResponse {
        ok: true,
        preview: preview_enabled(&session).await,
        project: state.project_id().map(str::to_string),
        dataset: state.dataset().to_string(),
    })
}
