//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Default API version pinned for CMS queries.
pub const DEFAULT_API_VERSION: &str = "2025-02-19";

/// Connection settings for the headless CMS.
#[derive(Debug, Clone)]
pub struct CmsConfig {
    /// CMS project identifier. Required unless fixtures are configured.
    pub project_id: Option<String>,

    /// Dataset name (default: production).
    pub dataset: String,

    /// Query API version, e.g. `2025-02-19`.
    pub api_version: String,

    /// Read token, needed for draft (preview) reads.
    pub read_token: Option<String>,

    /// Use the CDN host for published reads (default: true).
    pub use_cdn: bool,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            dataset: "production".to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            read_token: None,
            use_cdn: true,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// CMS connection settings.
    pub cms: CmsConfig,

    /// JSON fixture file served instead of the CMS (offline/dev runs).
    pub content_fixtures: Option<PathBuf>,

    /// Seconds a cached document stays fresh (default: 60).
    pub revalidate_secs: u64,

    /// How long a cold-cache request waits before rendering the loading
    /// placeholder, in milliseconds (default: 3000).
    pub fallback_timeout_ms: u64,

    /// Secret used to sign draft-preview tokens. Preview is disabled without it.
    pub preview_secret: Option<String>,

    /// Origins allowed to call the presentation handshake (comma-separated).
    pub studio_origins: Vec<String>,

    /// Development mode: unknown modules render a visible diagnostic.
    pub dev_mode: bool,

    /// Public site URL used for canonical and share links.
    pub site_url: String,

    /// Optional directory of template overrides.
    pub templates_dir: Option<PathBuf>,

    /// Directory served under `/static` (default: ./static).
    pub static_dir: PathBuf,

    /// Send the session cookie with the `Secure` flag (default: true).
    pub cookie_secure: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            cms: CmsConfig::default(),
            content_fixtures: None,
            revalidate_secs: 60,
            fallback_timeout_ms: 3000,
            preview_secret: None,
            studio_origins: Vec::new(),
            dev_mode: false,
            site_url: "http://localhost:3000".to_string(),
            templates_dir: None,
            static_dir: PathBuf::from("./static"),
            cookie_secure: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let content_fixtures = env::var("CONTENT_FIXTURES").ok().map(PathBuf::from);

        let project_id = non_empty(env::var("SANITY_PROJECT_ID").ok());
        if project_id.is_none() && content_fixtures.is_none() {
            anyhow::bail!("SANITY_PROJECT_ID is required unless CONTENT_FIXTURES is set");
        }

        let cms = CmsConfig {
            project_id,
            dataset: env::var("SANITY_DATASET").unwrap_or(defaults.cms.dataset),
            api_version: env::var("SANITY_API_VERSION").unwrap_or(defaults.cms.api_version),
            read_token: non_empty(env::var("SANITY_READ_TOKEN").ok()),
            use_cdn: parse_bool("SANITY_USE_CDN", defaults.cms.use_cdn)?,
        };

        let revalidate_secs = env::var("REVALIDATE_SECS")
            .unwrap_or_else(|_| defaults.revalidate_secs.to_string())
            .parse()
            .context("REVALIDATE_SECS must be a valid u64")?;

        let fallback_timeout_ms = env::var("FALLBACK_TIMEOUT_MS")
            .unwrap_or_else(|_| defaults.fallback_timeout_ms.to_string())
            .parse()
            .context("FALLBACK_TIMEOUT_MS must be a valid u64")?;

        let preview_secret = non_empty(env::var("PREVIEW_SECRET").ok());

        let studio_origins = env::var("STUDIO_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let dev_mode = env::var("SITE_ENV")
            .map(|v| v.eq_ignore_ascii_case("development"))
            .unwrap_or(false);

        let site_url = env::var("SITE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let templates_dir = env::var("TEMPLATES_DIR").ok().map(PathBuf::from);

        let static_dir = env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        let cookie_secure = parse_bool("COOKIE_SECURE", defaults.cookie_secure)?;

        Ok(Self {
            port,
            cms,
            content_fixtures,
            revalidate_secs,
            fallback_timeout_ms,
            preview_secret,
            studio_origins,
            dev_mode,
            site_url,
            templates_dir,
            static_dir,
            cookie_secure,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_bool(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(v) => match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => anyhow::bail!("{name} must be a boolean, got '{other}'"),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_production_safe() {
        let config = Config::default();
        assert!(!config.dev_mode);
        assert!(config.cookie_secure);
        assert!(config.preview_secret.is_none());
        assert_eq!(config.cms.dataset, "production");
        assert_eq!(config.revalidate_secs, 60);
    }

    #[test]
    fn non_empty_filters_blank_values() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some("abc".to_string())), Some("abc".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
