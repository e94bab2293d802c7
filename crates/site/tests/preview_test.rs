#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Draft mode and studio handshake tests.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;

use ministry_site::Config;
use ministry_site::preview::PreviewSigner;
use site_test_utils::{assert, fixtures, test_page, test_settings};

mod common;
use common::{
    PREVIEW_SECRET, STUDIO_ORIGIN, TestApp, body_string, extract_cookies, header_str, test_config,
};

fn app() -> TestApp {
    let settings = test_settings("Hope Ministries");
    let published = test_page("about", "About us").build();
    let draft = test_page("about", "About us (draft)").with_id("drafts.page-about").build();
    let unpublished = test_page("new-campaign", "New campaign").build();
    TestApp::new(fixtures(&settings, &[published], &[draft, unpublished]))
}

fn token(slug: &str) -> String {
    PreviewSigner::new(PREVIEW_SECRET).unwrap().sign(slug)
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let response = app().get("/api/draft?slug=about").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_token_is_unauthorized() {
    let uri = format!("/api/draft?slug=about&token={}", token("other"));
    let response = app().get(&uri).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn no_secret_configured_is_unauthorized() {
    let config = Config {
        preview_secret: None,
        ..test_config()
    };
    let app = TestApp::with_config(fixtures(&test_settings("Hope"), &[], &[]), config);
    let uri = format!("/api/draft?slug=about&token={}", token("about"));
    assert_eq!(app.get(&uri).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_enables_drafts() {
    let app = app();

    // Published content before preview
    let html = body_string(app.get("/about").await).await;
    assert::contains(&html, "About us");
    assert::not_contains(&html, "(draft)");

    let uri = format!("/api/draft?slug=about&token={}", token("about"));
    let response = app.get(&uri).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(header_str(&response, "location"), "/about");
    let cookies = extract_cookies(&response);
    assert!(!cookies.is_empty());

    let response = app.get_with_cookies("/about", &cookies).await;
    assert_eq!(header_str(&response, "cache-control"), "private, no-store");
    let html = body_string(response).await;
    assert::contains(&html, "About us (draft)");
    assert::contains(&html, "preview-banner");
    assert::contains(&html, "noindex");

    // Unpublished documents are reachable in preview only
    let response = app.get_with_cookies("/new-campaign", &cookies).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.get("/new-campaign").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn home_token_redirects_to_root() {
    let uri = format!("/api/draft?slug=home&token={}", token("home"));
    let response = app().get(&uri).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(header_str(&response, "location"), "/");
}

#[tokio::test]
async fn disable_clears_preview() {
    let app = app();
    let uri = format!("/api/draft?slug=about&token={}", token("about"));
    let cookies = extract_cookies(&app.get(&uri).await);

    let response = app.get_with_cookies("/api/draft/disable", &cookies).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(header_str(&response, "location"), "/");

    let html = body_string(app.get_with_cookies("/about", &cookies).await).await;
    assert::not_contains(&html, "(draft)");
}

#[tokio::test]
async fn presentation_handshake_reports_preview_state() {
    let app = app();
    let request = Request::get("/api/presentation")
        .header(header::ORIGIN, STUDIO_ORIGIN)
        .body(Body::empty())
        .unwrap();
    let response = app.request(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, "access-control-allow-origin"), STUDIO_ORIGIN);
    assert_eq!(header_str(&response, "access-control-allow-credentials"), "true");

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["preview"], false);
    assert_eq!(body["dataset"], "production");
}

#[tokio::test]
async fn presentation_preflight_allows_studio() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/presentation")
        .header(header::ORIGIN, STUDIO_ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = app().request(request).await;
    assert!(response.status().is_success());
    assert_eq!(header_str(&response, "access-control-allow-origin"), STUDIO_ORIGIN);
}

#[tokio::test]
async fn presentation_rejects_other_origins() {
    let request = Request::get("/api/presentation")
        .header(header::ORIGIN, "https://evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app().request(request).await;
    assert_eq!(header_str(&response, "access-control-allow-origin"), "");
}
