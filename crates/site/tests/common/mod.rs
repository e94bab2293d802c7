#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Tests drive the real router and state; only the content source is
//! replaced, with the in-memory one or a wrapper that delays or fails.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use ministry_site::content::{
    ContentError, ContentSource, Document, MemorySource, Perspective, Settings,
};
use ministry_site::{AppState, Config, routes};

/// Preview secret used by [`test_config`].
pub const PREVIEW_SECRET: &str = "test-preview-secret";

/// Studio origin allowed by [`test_config`].
pub const STUDIO_ORIGIN: &str = "https://studio.example.org";

/// Configuration for tests: plain-HTTP cookies, preview enabled.
pub fn test_config() -> Config {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    Config {
        preview_secret: Some(PREVIEW_SECRET.to_string()),
        studio_origins: vec![STUDIO_ORIGIN.to_string()],
        static_dir: std::path::Path::new(&manifest_dir).join("static"),
        cookie_secure: false,
        fallback_timeout_ms: 1000,
        ..Config::default()
    }
}

/// Test application wrapper using the real routes and state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// App serving the given fixture body (see `site_test_utils::fixtures`).
    pub fn new(fixtures: Value) -> Self {
        Self::with_config(fixtures, test_config())
    }

    pub fn with_config(fixtures: Value, config: Config) -> Self {
        let source = MemorySource::from_json(&fixtures.to_string()).expect("valid fixtures");
        Self::with_source(Arc::new(source), config)
    }

    pub fn with_source(source: Arc<dyn ContentSource>, config: Config) -> Self {
        let state = AppState::with_source(&config, source).expect("Failed to initialize AppState");
        let router = routes::app(state.clone(), &config);
        Self { router, state }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// `GET uri`.
    pub async fn get(&self, uri: &str) -> Response {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// `GET uri` with cookies from a previous response.
    pub async fn get_with_cookies(&self, uri: &str, cookies: &str) -> Response {
        let mut request = Request::get(uri).body(Body::empty()).unwrap();
        if !cookies.is_empty() {
            request.headers_mut().insert(
                header::COOKIE,
                cookies.parse().expect("Invalid cookie header"),
            );
        }
        self.request(request).await
    }
}

/// Collect a response body as a string.
pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// `name=value` pairs from every `Set-Cookie` header, joined for a `Cookie` header.
pub fn extract_cookies(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Header value as a string, empty when absent.
pub fn header_str<'a>(response: &'a Response, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Wraps a source and delays document fetches.
pub struct SlowSource {
    pub inner: MemorySource,
    pub delay: Duration,
}

#[async_trait]
impl ContentSource for SlowSource {
    async fn document(
        &self,
        slug: &str,
        perspective: Perspective,
    ) -> Result<Option<Document>, ContentError> {
        tokio::time::sleep(self.delay).await;
        self.inner.document(slug, perspective).await
    }

    async fn settings(&self, perspective: Perspective) -> Result<Option<Settings>, ContentError> {
        self.inner.settings(perspective).await
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

/// A source whose every fetch fails.
pub struct FailingSource;

#[async_trait]
impl ContentSource for FailingSource {
    async fn document(
        &self,
        _slug: &str,
        _perspective: Perspective,
    ) -> Result<Option<Document>, ContentError> {
        Err(ContentError::Status {
            status: 503,
            message: "unavailable".to_string(),
        })
    }

    async fn settings(&self, _perspective: Perspective) -> Result<Option<Settings>, ContentError> {
        Err(ContentError::Config("offline".to_string()))
    }

    async fn healthy(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}
