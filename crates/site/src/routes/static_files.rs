//! Static file serving.

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::fs;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Create the static files router.
pub fn router() -> Router<AppState> {
    Router::new().route("/static/{*path}", get(serve_static))
}

/// Whether a request path stays inside the static directory.
fn is_safe_path(path: &str) -> bool {
    !path.is_empty()
        && !path.contains('\0')
        && !path.contains('\\')
        && path.split('/').all(|segment| segment != "..")
}

/// Serve a static file.
async fn serve_static(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<Response> {
    let path = path.trim_start_matches('/');
    if !is_safe_path(path) {
        return Err(AppError::NotFound);
    }

    let file_path = state.static_dir().join(path);

    let content = match fs::read(&file_path).await {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %file_path.display(), error = %e, "failed to read static file");
            }
            return Err(AppError::NotFound);
        }
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime_from_path(&file_path)),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        Body::from(content),
    )
        .into_response())
}

fn mime_from_path(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
