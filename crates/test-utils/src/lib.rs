//! Ministry site test utilities.
//!
//! JSON fixture builders shaped like query API results, plus assertion
//! helpers for rendered HTML.

use serde_json::{Value as JsonValue, json};

/// Create a page fixture with no modules.
pub fn test_page(slug: &str, title: &str) -> TestPage {
    TestPage {
        id: format!("page-{slug}"),
        slug: slug.to_string(),
        title: title.to_string(),
        seo_description: None,
        modules: Vec::new(),
    }
}

/// A page fixture builder.
#[derive(Debug, Clone)]
pub struct TestPage {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub seo_description: Option<String>,
    pub modules: Vec<JsonValue>,
}

impl TestPage {
    /// Set a custom document ID.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Set the SEO description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.seo_description = Some(description.to_string());
        self
    }

    /// Append a module object (see [`modules`]).
    pub fn with_module(mut self, module: JsonValue) -> Self {
        self.modules.push(module);
        self
    }

    /// The projected document.
    pub fn build(&self) -> JsonValue {
        json!({
            "_type": "page",
            "_id": self.id,
            "title": self.title,
            "slug": self.slug,
            "seoDescription": self.seo_description,
            "modules": self.modules,
        })
    }
}

/// Create a story fixture.
pub fn test_story(slug: &str, title: &str) -> TestStory {
    TestStory {
        id: format!("story-{slug}"),
        slug: slug.to_string(),
        title: title.to_string(),
        excerpt: None,
        paragraphs: Vec::new(),
        published_at: None,
        featured_image: None,
    }
}

/// A story fixture builder.
#[derive(Debug, Clone)]
pub struct TestStory {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub paragraphs: Vec<String>,
    pub published_at: Option<String>,
    pub featured_image: Option<JsonValue>,
}

impl TestStory {
    pub fn with_excerpt(mut self, excerpt: &str) -> Self {
        self.excerpt = Some(excerpt.to_string());
        self
    }

    /// Add a body paragraph.
    pub fn with_paragraph(mut self, text: &str) -> Self {
        self.paragraphs.push(text.to_string());
        self
    }

    /// Set the publish date (RFC 3339).
    pub fn published_at(mut self, at: &str) -> Self {
        self.published_at = Some(at.to_string());
        self
    }

    pub fn with_image(mut self, asset_ref: &str) -> Self {
        self.featured_image = Some(image(asset_ref));
        self
    }

    /// The projected document.
    pub fn build(&self) -> JsonValue {
        json!({
            "_type": "story",
            "_id": self.id,
            "title": self.title,
            "slug": self.slug,
            "excerpt": self.excerpt,
            "publishedAt": self.published_at,
            "featuredImage": self.featured_image,
            "content": self.paragraphs.iter().map(|p| block(p)).collect::<Vec<_>>(),
        })
    }

    /// This story as a stories-grid card.
    pub fn card(&self) -> JsonValue {
        json!({
            "_id": self.id,
            "title": self.title,
            "slug": self.slug,
            "excerpt": self.excerpt,
            "publishedAt": self.published_at,
            "featuredImage": self.featured_image,
        })
    }
}

/// Create a site settings fixture.
pub fn test_settings(title: &str) -> TestSettings {
    TestSettings {
        title: title.to_string(),
        tagline: None,
        navigation: Vec::new(),
        newsletter: None,
    }
}

/// A site settings fixture builder.
#[derive(Debug, Clone)]
pub struct TestSettings {
    pub title: String,
    pub tagline: Option<String>,
    pub navigation: Vec<JsonValue>,
    pub newsletter: Option<JsonValue>,
}

impl TestSettings {
    pub fn with_tagline(mut self, tagline: &str) -> Self {
        self.tagline = Some(tagline.to_string());
        self
    }

    /// Add a main navigation link.
    pub fn with_nav_link(mut self, label: &str, href: &str) -> Self {
        self.navigation.push(link(label, href));
        self
    }

    /// Enable the newsletter strip posting to `action`.
    pub fn with_newsletter(mut self, heading: &str, action: &str) -> Self {
        self.newsletter = Some(json!({ "heading": heading, "action": action }));
        self
    }

    pub fn build(&self) -> JsonValue {
        json!({
            "title": self.title,
            "tagline": self.tagline,
            "navigation": self.navigation,
            "newsletter": self.newsletter,
        })
    }
}

/// A fixture file body, as loaded by the in-memory content source.
pub fn fixtures(settings: &TestSettings, documents: &[JsonValue], drafts: &[JsonValue]) -> JsonValue {
    json!({
        "settings": settings.build(),
        "documents": documents,
        "drafts": drafts,
    })
}

/// An image field referencing `asset_ref` (`image-<id>-<w>x<h>-<ext>`).
pub fn image(asset_ref: &str) -> JsonValue {
    json!({ "asset": { "_ref": asset_ref }, "alt": "" })
}

/// A link object.
pub fn link(label: &str, href: &str) -> JsonValue {
    json!({ "label": label, "href": href })
}

/// A single normal-style portable-text block.
pub fn block(text: &str) -> JsonValue {
    json!({
        "_type": "block",
        "style": "normal",
        "markDefs": [],
        "children": [{ "_type": "span", "text": text, "marks": [] }]
    })
}

/// Module object builders.
pub mod modules {
    use serde_json::{Value, json};

    use super::{block, image, link};

    fn module(key: &str, type_name: &str, fields: Value) -> Value {
        let mut value = json!({ "_key": key, "_type": type_name });
        if let (Some(target), Value::Object(fields)) = (value.as_object_mut(), fields) {
            target.extend(fields);
        }
        value
    }

    pub fn hero(key: &str, heading: &str) -> Value {
        module(key, "hero", json!({ "heading": heading }))
    }

    pub fn rich_text(key: &str, text: &str) -> Value {
        module(key, "richText", json!({ "content": [block(text)] }))
    }

    pub fn slideshow(key: &str, asset_refs: &[&str]) -> Value {
        let slides: Vec<Value> = asset_refs
            .iter()
            .enumerate()
            .map(|(i, r)| json!({ "_key": format!("slide-{i}"), "image": image(r) }))
            .collect();
        module(key, "slideshow", json!({ "slides": slides }))
    }

    pub fn two_column(key: &str, left: &str, right: &str) -> Value {
        module(
            key,
            "twoColumn",
            json!({
                "left": { "heading": left },
                "right": { "heading": right },
            }),
        )
    }

    pub fn form(key: &str, action: &str, field_names: &[&str]) -> Value {
        let fields: Vec<Value> = field_names
            .iter()
            .map(|name| json!({ "_key": name, "name": name, "label": name }))
            .collect();
        module(key, "form", json!({ "action": action, "fields": fields }))
    }

    pub fn cta(key: &str, heading: &str, label: &str, href: &str) -> Value {
        module(key, "cta", json!({ "heading": heading, "link": link(label, href) }))
    }

    pub fn quote(key: &str, text: &str) -> Value {
        module(key, "quote", json!({ "quote": text }))
    }

    pub fn stories_grid(key: &str, heading: &str, cards: &[Value]) -> Value {
        module(key, "storiesGrid", json!({ "heading": heading, "stories": cards }))
    }

    pub fn composite_feature(key: &str, heading: &str, item_titles: &[&str]) -> Value {
        let items: Vec<Value> = item_titles
            .iter()
            .map(|t| json!({ "_key": t, "title": t }))
            .collect();
        module(key, "compositeFeature", json!({ "heading": heading, "items": items }))
    }

    pub fn testimonial(key: &str, quote: &str, name: &str) -> Value {
        module(key, "testimonial", json!({ "quote": quote, "name": name }))
    }

    pub fn reviews_hero(key: &str, heading: &str, ratings: &[f32]) -> Value {
        let reviews: Vec<Value> = ratings
            .iter()
            .enumerate()
            .map(|(i, r)| json!({ "_key": format!("r{i}"), "body": "Wonderful", "rating": r }))
            .collect();
        module(key, "reviewsHero", json!({ "heading": heading, "reviews": reviews }))
    }

    pub fn product_ad(key: &str, title: &str, href: &str) -> Value {
        module(key, "productAd", json!({ "title": title, "link": link("Buy now", href) }))
    }

    /// A module with a discriminator the site does not know.
    pub fn unknown(key: &str, type_name: &str) -> Value {
        module(key, type_name, json!({}))
    }
}

/// Assertion helpers for rendered HTML.
pub mod assert {
    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{}'\nActual: {}",
            needle,
            haystack
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{}'\nActual: {}",
            needle,
            haystack
        );
    }

    /// Assert how many times `needle` occurs in `haystack`.
    pub fn count(haystack: &str, needle: &str, expected: usize) {
        let actual = haystack.matches(needle).count();
        assert_eq!(
            actual, expected,
            "Expected '{}' {} time(s), found {}\nActual: {}",
            needle, expected, actual, haystack
        );
    }
}
