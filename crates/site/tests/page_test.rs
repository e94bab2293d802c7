#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Page route tests: module assembly, redirects, not-found and fallback.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{Value, json};

use ministry_site::Config;
use ministry_site::content::MemorySource;
use site_test_utils::{assert, fixtures, modules, test_page, test_settings, test_story};

mod common;
use common::{FailingSource, SlowSource, TestApp, body_string, header_str, test_config};

fn site(documents: &[Value]) -> Value {
    let settings = test_settings("Hope Ministries")
        .with_tagline("Serving our city")
        .with_nav_link("About", "/about")
        .with_newsletter("Stay in touch", "https://lists.example.org/subscribe");
    fixtures(&settings, documents, &[])
}

#[tokio::test]
async fn home_renders_modules_in_order() {
    let home = test_page("home", "Home")
        .with_module(modules::hero("hero-1", "Welcome home"))
        .with_module(modules::quote("quote-1", "Be still and know"))
        .with_module(modules::cta("cta-1", "Join us Sunday", "Plan a visit", "/visit"))
        .build();
    let app = TestApp::new(site(&[home]));

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;

    assert::contains(&html, "Hope Ministries");
    assert::contains(&html, "Stay in touch");
    let hero = html.find("Welcome home").unwrap();
    let quote = html.find("Be still and know").unwrap();
    let cta = html.find("Join us Sunday").unwrap();
    assert!(hero < quote && quote < cta);
}

#[tokio::test]
async fn home_slug_redirects_to_root() {
    let app = TestApp::new(site(&[test_page("home", "Home").build()]));
    let response = app.get("/home").await;
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(header_str(&response, "location"), "/");
}

#[tokio::test]
async fn home_slug_redirects_even_without_home_document() {
    let app = TestApp::new(site(&[]));
    let response = app.get("/home").await;
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
}

#[tokio::test]
async fn missing_home_is_not_found() {
    let app = TestApp::new(site(&[]));
    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert::contains(&body_string(response).await, "Page not found");
}

#[tokio::test]
async fn unknown_slug_is_not_found_with_chrome() {
    let app = TestApp::new(site(&[]));
    let response = app.get("/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = body_string(response).await;
    assert::contains(&html, "Page not found");
    assert::contains(&html, "Hope Ministries");
}

#[tokio::test]
async fn malformed_slug_is_not_found() {
    let app = TestApp::new(site(&[]));
    let response = app.get("/bad%20slug").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn modules_without_required_fields_are_omitted() {
    let page = test_page("give", "Give")
        .with_module(modules::hero("hero-1", "Give generously"))
        .with_module(modules::product_ad("ad-1", "Daily devotional", "https://shop.example.org/devotional"))
        .with_module(modules::stories_grid("grid-1", "Latest stories", &[]))
        .build();
    let app = TestApp::new(site(&[page]));

    let html = body_string(app.get("/give").await).await;
    assert::count(&html, "data-module-key=", 2);
    assert::contains(&html, "Daily devotional");
    assert::not_contains(&html, "Latest stories");
}

#[tokio::test]
async fn unknown_module_hidden_in_production() {
    let page = test_page("about", "About")
        .with_module(modules::unknown("x-1", "carousel3d"))
        .with_module(modules::quote("q-1", "Grace upon grace"))
        .build();
    let app = TestApp::new(site(&[page]));

    let html = body_string(app.get("/about").await).await;
    assert::count(&html, "data-module-key=", 1);
    assert::not_contains(&html, "carousel3d");
}

#[tokio::test]
async fn unknown_module_placeholder_in_development() {
    let page = test_page("about", "About")
        .with_module(modules::unknown("x-1", "carousel3d"))
        .build();
    let config = Config {
        dev_mode: true,
        ..test_config()
    };
    let app = TestApp::with_config(site(&[page]), config);

    let html = body_string(app.get("/about").await).await;
    assert::contains(&html, "module-diagnostic");
    assert::contains(&html, "data-module-type=\"carousel3d\"");
}

#[tokio::test]
async fn every_module_kind_renders_on_a_page() {
    let story = test_story("easter", "Easter morning").with_excerpt("He is risen");
    let page = test_page("tour", "Tour")
        .with_module(modules::hero("m1", "Hero heading"))
        .with_module(modules::rich_text("m2", "Rich text body"))
        .with_module(modules::slideshow("m3", &["image-abc-1600x900-jpg"]))
        .with_module(modules::two_column("m4", "Left side", "Right side"))
        .with_module(modules::form("m5", "https://forms.example.org/contact", &["email", "message"]))
        .with_module(modules::cta("m6", "Volunteer", "Sign up", "/volunteer"))
        .with_module(modules::quote("m7", "Love one another"))
        .with_module(modules::stories_grid("m8", "Stories", &[story.card()]))
        .with_module(modules::composite_feature("m9", "Programs", &["Food bank", "Tutoring"]))
        .with_module(modules::testimonial("m10", "They changed my life", "Maria"))
        .with_module(modules::reviews_hero("m11", "Readers love it", &[5.0, 4.0]))
        .with_module(modules::product_ad("m12", "Study guide", "/shop/guide"))
        .build();
    let app = TestApp::new(site(&[page]));

    let response = app.get("/tour").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert::count(&html, "data-module-key=", 12);
    for text in [
        "Hero heading",
        "Rich text body",
        "Left side",
        "Volunteer",
        "Love one another",
        "Easter morning",
        "Food bank",
        "They changed my life",
        "Readers love it",
        "Study guide",
    ] {
        assert::contains(&html, text);
    }
    // Slideshow pages load the rotation script
    assert::contains(&html, "slideshow.js");
}

#[tokio::test]
async fn story_page_renders_body() {
    let story = test_story("easter", "Easter morning")
        .with_excerpt("He is risen")
        .with_paragraph("The tomb was empty.")
        .published_at("2025-04-20T08:00:00Z")
        .build();
    let app = TestApp::new(site(&[story]));

    let response = app.get("/easter").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert::contains(&html, "Easter morning");
    assert::contains(&html, "The tomb was empty.");
    assert::contains(&html, "April 20, 2025");
    assert::contains(&html, "og:type\" content=\"article\"");
}

#[tokio::test]
async fn malformed_image_metadata_does_not_hide_the_page() {
    let mut page = test_page("about", "About us")
        .with_module(modules::hero("hero-1", "Welcome"))
        .build();
    page["shareImage"] = json!({
        "asset": { "_ref": "image-abc-1200x630-jpg" },
        "hotspot": { "x": null, "y": 0.5 }
    });
    page["modules"][0]["image"] = json!({
        "asset": { "_ref": "image-def-800x600-jpg" },
        "hotspot": { "_type": "sanity.imageHotspot" }
    });
    let app = TestApp::new(site(&[page]));

    let response = app.get("/about").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert::contains(&html, "About us");
    assert::contains(&html, "Welcome");
}

#[tokio::test]
async fn story_with_plain_date_renders() {
    let story = test_story("spring", "Spring outreach")
        .with_paragraph("We served 300 meals.")
        .published_at("2024-05-01")
        .build();
    let app = TestApp::new(site(&[story]));

    let response = app.get("/spring").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert::contains(&html, "Spring outreach");
    assert::contains(&html, "May 1, 2024");
}

#[tokio::test]
async fn published_pages_are_publicly_cacheable() {
    let app = TestApp::new(site(&[test_page("about", "About").build()]));
    let response = app.get("/about").await;
    assert_eq!(
        header_str(&response, "cache-control"),
        "public, s-maxage=60, stale-while-revalidate"
    );
}

#[tokio::test]
async fn slow_cold_fetch_shows_loading_then_content() {
    let inner = MemorySource::from_json(
        &site(&[test_page("about", "About us")
            .with_module(modules::quote("q", "Worth the wait"))
            .build()])
        .to_string(),
    )
    .unwrap();
    let source = SlowSource {
        inner,
        delay: Duration::from_millis(300),
    };
    let config = Config {
        fallback_timeout_ms: 50,
        ..test_config()
    };
    let app = TestApp::with_source(Arc::new(source), config);

    let response = app.get("/about").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, "cache-control"), "private, no-store");
    let html = body_string(response).await;
    assert::contains(&html, "Loading");
    assert::contains(&html, "http-equiv=\"refresh\"");

    // The fetch kept running and filled the cache
    tokio::time::sleep(Duration::from_millis(500)).await;
    let html = body_string(app.get("/about").await).await;
    assert::contains(&html, "Worth the wait");
}

#[tokio::test]
async fn failing_source_yields_not_found() {
    let app = TestApp::with_source(Arc::new(FailingSource), test_config());
    let response = app.get("/about").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert::contains(&body_string(response).await, "Page not found");
}
