//! HTTP route handlers.

pub mod health;
pub mod helpers;
pub mod page;
pub mod presentation;
pub mod preview;
pub mod static_files;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::session::create_session_layer;
use crate::state::AppState;

/// Build the application router with its middleware.
pub fn app(state: AppState, config: &Config) -> Router {
    Router::new()
        .merge(page::router())
        .merge(preview::router())
        .merge(presentation::router(&config.studio_origins))
        .merge(health::router())
        .merge(static_files::router())
        // Middleware layers (last added = first executed in request flow):
        // TraceLayer → compression → session → routes
        .layer(create_session_layer(config.cookie_secure))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
