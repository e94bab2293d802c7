//! Cookie session holding the preview flag.

use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use tracing::warn;

/// Preview sessions expire after this much inactivity.
pub const PREVIEW_SESSION_EXPIRY_HOURS: i64 = 8;

/// Session key for the draft-mode flag.
pub const SESSION_PREVIEW: &str = "preview";

/// Create the session layer backed by the in-process store.
///
/// The studio embeds the site in a cross-site iframe, so a secure cookie
/// uses `SameSite=None`; plain-HTTP development falls back to `Lax`.
pub fn create_session_layer(secure: bool) -> SessionManagerLayer<MemoryStore> {
    let same_site = if secure { SameSite::None } else { SameSite::Lax };

    SessionManagerLayer::new(MemoryStore::default())
        .with_name("site_session")
        .with_secure(secure)
        .with_http_only(true)
        .with_same_site(same_site)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            PREVIEW_SESSION_EXPIRY_HOURS,
        )))
}

/// Whether the session has preview enabled. Store errors read as `false`.
pub async fn preview_enabled(session: &Session) -> bool {
    match session.get::<bool>(SESSION_PREVIEW).await {
        Ok(flag) => flag.unwrap_or(false),
        Err(e) => {
            warn!(error = %e, "failed to read preview flag from session");
            false
        }
    }
}
