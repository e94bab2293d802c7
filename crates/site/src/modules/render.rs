//! Module dispatch: turns an ordered module list into rendered sections.
//!
//! Each module kind has a view function that checks its own minimum field
//! set and returns `None` when the module has nothing worth showing. Views
//! resolve images and links so templates only see ready-to-print values.
//! Failures never leave this module: a template error is logged and the
//! section is dropped.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::types::{
    CallToAction, Column, CompositeFeature, FormModule, Hero, ProductAd, Quote, ReviewsHero,
    RichTextModule, Slideshow, StoriesGrid, Testimonial, TwoColumn,
};
use super::{Module, ModuleRecord};
use crate::content::models::link_view;
use crate::content::portable_text::is_safe_href;
use crate::content::{ImageUrlBuilder, RichText};
use crate::routes::helpers::html_escape;
use crate::theme::ThemeEngine;

/// Template for the development-only placeholder.
const DIAGNOSTIC_TEMPLATE: &str = "diagnostics/module.html";

/// Image widths requested per usage.
const WIDTH_FULL: u32 = 1920;
const WIDTH_HALF: u32 = 960;
const WIDTH_CARD: u32 = 640;
const WIDTH_AVATAR: u32 = 160;

/// Default and bounds for slideshow rotation, in seconds.
const SLIDE_INTERVAL_DEFAULT: u32 = 5;
const SLIDE_INTERVAL_MIN: u32 = 2;
const SLIDE_INTERVAL_MAX: u32 = 60;

/// Whether unrenderable modules show a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Production,
    Development,
}

/// Everything a module renderer needs.
pub struct RenderContext<'a> {
    pub theme: &'a ThemeEngine,
    pub images: &'a ImageUrlBuilder,
    pub mode: RenderMode,
}

/// Output of one rendered module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSection {
    pub key: String,
    pub type_name: String,
    pub html: String,
}

/// Render modules in stored order, skipping those with no output.
pub fn render_modules(ctx: &RenderContext<'_>, records: &[ModuleRecord]) -> Vec<RenderedSection> {
    records
        .iter()
        .filter_map(|record| render_module(ctx, record))
        .collect()
}

/// Render a single module record.
pub fn render_module(ctx: &RenderContext<'_>, record: &ModuleRecord) -> Option<RenderedSection> {
    let images = ctx.images;
    let view = match &record.module {
        Module::Hero(m) => hero(m, images),
        Module::RichText(m) => rich_text(m, images),
        Module::Slideshow(m) => slideshow(m, images),
        Module::TwoColumn(m) => two_column(m, images),
        Module::Form(m) => form(m),
        Module::Cta(m) => cta(m),
        Module::Quote(m) => quote(m, images),
        Module::StoriesGrid(m) => stories_grid(m, images),
        Module::CompositeFeature(m) => composite_feature(m, images),
        Module::Testimonial(m) => testimonial(m, images),
        Module::ReviewsHero(m) => reviews_hero(m, images),
        Module::ProductAd(m) => product_ad(m, images),
        Module::Unknown { type_name } => {
            return diagnostic(ctx, record, type_name, "no renderer is registered for this type");
        }
        Module::Invalid { kind, error } => {
            return diagnostic(ctx, record, kind.type_name(), error);
        }
    };

    // Unknown and Invalid returned above
    let kind = record.module.kind()?;

    let Some(view) = view else {
        debug!(key = %record.key, module_type = kind.type_name(), "module has no renderable content");
        return None;
    };

    let mut context = tera::Context::new();
    context.insert("module", &view);
    context.insert("key", &record.key);
    context.insert("type_name", kind.type_name());

    match ctx.theme.render_template(kind.template(), &context) {
        Ok(html) => Some(RenderedSection {
            key: record.key.clone(),
            type_name: kind.type_name().to_string(),
            html,
        }),
        Err(e) => {
            warn!(key = %record.key, module_type = kind.type_name(), error = %e, "failed to render module");
            None
        }
    }
}

/// Placeholder for modules that cannot be rendered; development only.
fn diagnostic(
    ctx: &RenderContext<'_>,
    record: &ModuleRecord,
    type_name: &str,
    reason: &str,
) -> Option<RenderedSection> {
    if ctx.mode == RenderMode::Production {
        debug!(key = %record.key, module_type = %type_name, "skipping unrenderable module");
        return None;
    }

    let mut context = tera::Context::new();
    context.insert("key", &record.key);
    context.insert("type_name", type_name);
    context.insert("reason", reason);

    let html = ctx
        .theme
        .render_template(DIAGNOSTIC_TEMPLATE, &context)
        .unwrap_or_else(|e| {
            warn!(key = %record.key, error = %e, "failed to render module diagnostic");
            fallback_diagnostic(&record.key, type_name, reason)
        });

    Some(RenderedSection {
        key: record.key.clone(),
        type_name: type_name.to_string(),
        html,
    })
}

// ---------------------------------------------------------------------------
// Per-module views
// ---------------------------------------------------------------------------

/// Trimmed, non-empty text.
fn text(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn rich_html(value: &RichText, images: &ImageUrlBuilder) -> Option<String> {
    (!value.is_empty()).then(|| value.to_html(images))
}

fn hero(m: &Hero, images: &ImageUrlBuilder) -> Option<Value> {
    let heading = text(m.heading.as_ref());
    let image = images.view(m.image.as_ref(), Some(WIDTH_FULL));
    if heading.is_none() && image.is_none() {
        return None;
    }
    Some(json!({
        "heading": heading,
        "subheading": text(m.subheading.as_ref()),
        "image": image,
        "cta": link_view(m.cta.as_ref()),
    }))
}

fn rich_text(m: &RichTextModule, images: &ImageUrlBuilder) -> Option<Value> {
    let html = rich_html(&m.content, images)?;
    Some(json!({ "html": html }))
}

fn slideshow(m: &Slideshow, images: &ImageUrlBuilder) -> Option<Value> {
    let slides: Vec<Value> = m
        .slides
        .iter()
        .enumerate()
        .filter_map(|(i, slide)| {
            let image = images.view(slide.image.as_ref(), Some(WIDTH_FULL))?;
            Some(json!({
                "key": slide.key.clone().unwrap_or_else(|| i.to_string()),
                "image": image,
                "caption": text(slide.caption.as_ref()),
                "link": link_view(slide.link.as_ref()),
            }))
        })
        .collect();

    if slides.is_empty() {
        return None;
    }

    let interval = m
        .interval_seconds
        .unwrap_or(SLIDE_INTERVAL_DEFAULT)
        .clamp(SLIDE_INTERVAL_MIN, SLIDE_INTERVAL_MAX);

    Some(json!({
        "heading": text(m.heading.as_ref()),
        "slides": slides,
        "interval_ms": interval * 1000,
    }))
}

fn column(c: Option<&Column>, images: &ImageUrlBuilder) -> Option<Value> {
    let c = c?;
    let heading = text(c.heading.as_ref());
    let body = rich_html(&c.body, images);
    let image = images.view(c.image.as_ref(), Some(WIDTH_HALF));
    let link = link_view(c.link.as_ref());
    if heading.is_none() && body.is_none() && image.is_none() && link.is_none() {
        return None;
    }
    Some(json!({ "heading": heading, "body": body, "image": image, "link": link }))
}

fn two_column(m: &TwoColumn, images: &ImageUrlBuilder) -> Option<Value> {
    let columns: Vec<Value> = [m.left.as_ref(), m.right.as_ref()]
        .into_iter()
        .filter_map(|c| column(c, images))
        .collect();
    if columns.is_empty() {
        return None;
    }
    Some(json!({ "columns": columns, "reverse": m.reverse }))
}

fn form(m: &FormModule) -> Option<Value> {
    let action = text(m.action.as_ref()).filter(|a| is_safe_href(a) && !a.starts_with("mailto:"))?;

    let fields: Vec<Value> = m
        .fields
        .iter()
        .filter(|f| {
            !f.name.is_empty()
                && f
                    .name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
        .map(|f| {
            json!({
                "name": f.name,
                "label": text(f.label.as_ref()).unwrap_or_else(|| f.name.clone()),
                "kind": f.kind,
                "input_type": f.kind.input_type(),
                "required": f.required,
                "options": f.options,
                "placeholder": text(f.placeholder.as_ref()),
            })
        })
        .collect();

    if fields.is_empty() {
        return None;
    }

    Some(json!({
        "heading": text(m.heading.as_ref()),
        "description": text(m.description.as_ref()),
        "action": action,
        "submit_label": text(m.submit_label.as_ref()).unwrap_or_else(|| "Submit".to_string()),
        "success_message": text(m.success_message.as_ref()),
        "fields": fields,
    }))
}

fn cta(m: &CallToAction) -> Option<Value> {
    let heading = text(m.heading.as_ref())?;
    let link = link_view(m.link.as_ref())?;
    Some(json!({ "heading": heading, "body": text(m.body.as_ref()), "link": link }))
}

fn quote(m: &Quote, images: &ImageUrlBuilder) -> Option<Value> {
    let quote = text(m.quote.as_ref())?;
    Some(json!({
        "quote": quote,
        "attribution": text(m.attribution.as_ref()),
        "image": images.view(m.image.as_ref(), Some(WIDTH_AVATAR)),
    }))
}

fn stories_grid(m: &StoriesGrid, images: &ImageUrlBuilder) -> Option<Value> {
    let stories: Vec<Value> = m
        .stories
        .iter()
        .filter(|s| !s.slug.trim().is_empty() && !s.title.trim().is_empty())
        .map(|s| {
            json!({
                "title": s.title.trim(),
                "href": format!("/{}", s.slug.trim()),
                "image": images.view(s.featured_image.as_ref(), Some(WIDTH_CARD)),
                "excerpt": text(s.excerpt.as_ref()),
                "published_at": s.published_at,
            })
        })
        .collect();

    if stories.is_empty() {
        return None;
    }
    Some(json!({ "heading": text(m.heading.as_ref()), "stories": stories }))
}

fn composite_feature(m: &CompositeFeature, images: &ImageUrlBuilder) -> Option<Value> {
    let heading = text(m.heading.as_ref());
    let items: Vec<Value> = m
        .items
        .iter()
        .filter_map(|item| {
            let title = text(item.title.as_ref())?;
            Some(json!({
                "title": title,
                "description": text(item.description.as_ref()),
                "icon": images.view(item.icon.as_ref(), Some(WIDTH_AVATAR)),
                "link": link_view(item.link.as_ref()),
            }))
        })
        .collect();

    if heading.is_none() && items.is_empty() {
        return None;
    }
    Some(json!({
        "heading": heading,
        "body": rich_html(&m.body, images),
        "image": images.view(m.image.as_ref(), Some(WIDTH_HALF)),
        "items": items,
    }))
}

fn testimonial(m: &Testimonial, images: &ImageUrlBuilder) -> Option<Value> {
    let quote = text(m.quote.as_ref())?;
    Some(json!({
        "quote": quote,
        "name": text(m.name.as_ref()),
        "role": text(m.role.as_ref()),
        "image": images.view(m.image.as_ref(), Some(WIDTH_AVATAR)),
    }))
}

fn clamp_rating(rating: f32) -> Option<f32> {
    rating.is_finite().then(|| rating.clamp(0.0, 5.0))
}

fn reviews_hero(m: &ReviewsHero, images: &ImageUrlBuilder) -> Option<Value> {
    let heading = text(m.heading.as_ref());
    let reviews: Vec<(Value, Option<f32>)> = m
        .reviews
        .iter()
        .filter_map(|r| {
            let body = text(r.body.as_ref())?;
            let rating = r.rating.and_then(clamp_rating);
            Some((
                json!({ "author": text(r.author.as_ref()), "body": body, "rating": rating }),
                rating,
            ))
        })
        .collect();

    if heading.is_none() && reviews.is_empty() {
        return None;
    }

    // Without an explicit aggregate, average the individual ratings
    let rated: Vec<f32> = reviews.iter().filter_map(|(_, r)| *r).collect();
    let rating = m.rating.and_then(clamp_rating).or_else(|| {
        (!rated.is_empty()).then(|| rated.iter().sum::<f32>() / rated.len() as f32)
    });
    let review_count = m.review_count.unwrap_or(reviews.len() as u32);

    Some(json!({
        "heading": heading,
        "rating": rating,
        "review_count": review_count,
        "reviews": reviews.into_iter().map(|(v, _)| v).collect::<Vec<_>>(),
        "image": images.view(m.image.as_ref(), Some(WIDTH_FULL)),
    }))
}

fn product_ad(m: &ProductAd, images: &ImageUrlBuilder) -> Option<Value> {
    let title = text(m.title.as_ref())?;
    let link = link_view(m.link.as_ref())?;
    Some(json!({
        "title": title,
        "description": text(m.description.as_ref()),
        "price": text(m.price.as_ref()),
        "image": images.view(m.image.as_ref(), Some(WIDTH_CARD)),
        "link": link,
    }))
}

/// Bare placeholder used when the diagnostic template itself fails.
fn fallback_diagnostic(key: &str, type_name: &str, reason: &str) -> String {
    let type_name = html_escape(type_name);
    format!(
        "<div class=\"module-diagnostic\" data-module-type=\"{type_name}\" data-module-key=\"{}\">Cannot render module \"{type_name}\": {}</div>",
        html_escape(key),
        html_escape(reason)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::modules::ModuleKind;
    use crate::content::ImageRef;
    use crate::content::image::AssetRef;
    use crate::content::models::Link;
    use crate::modules::types::{Review, Slide, StoryCard};

    fn images() -> ImageUrlBuilder {
        ImageUrlBuilder::new("proj", "production")
    }

    fn image() -> ImageRef {
        ImageRef {
            asset: Some(AssetRef {
                reference: "image-abc-800x600-jpg".to_string(),
            }),
            ..ImageRef::default()
        }
    }

    fn link() -> Link {
        Link {
            key: None,
            label: Some("Give".to_string()),
            href: Some("/give".to_string()),
        }
    }

    #[test]
    fn hero_needs_heading_or_image() {
        assert!(hero(&Hero::default(), &images()).is_none());
        let only_image = Hero {
            image: Some(image()),
            ..Hero::default()
        };
        assert!(hero(&only_image, &images()).is_some());
    }

    #[test]
    fn hero_with_unresolvable_image_only_is_empty() {
        let m = Hero {
            image: Some(ImageRef::default()),
            ..Hero::default()
        };
        assert!(hero(&m, &images()).is_none());
    }

    #[test]
    fn slideshow_drops_slides_without_images() {
        let m = Slideshow {
            slides: vec![
                Slide::default(),
                Slide {
                    image: Some(image()),
                    ..Slide::default()
                },
            ],
            interval_seconds: Some(1),
            ..Slideshow::default()
        };
        let view = slideshow(&m, &images()).unwrap();
        assert_eq!(view["slides"].as_array().unwrap().len(), 1);
        assert_eq!(view["interval_ms"], 2000);
    }

    #[test]
    fn slideshow_interval_defaults_to_five_seconds() {
        let m = Slideshow {
            slides: vec![Slide {
                image: Some(image()),
                ..Slide::default()
            }],
            ..Slideshow::default()
        };
        assert_eq!(slideshow(&m, &images()).unwrap()["interval_ms"], 5000);
    }

    #[test]
    fn fallback_diagnostic_carries_type_and_key() {
        let html = fallback_diagnostic("k<1>", "carousel3d", "unknown module type");
        assert!(html.contains("data-module-type=\"carousel3d\""));
        assert!(html.contains("data-module-key=\"k&lt;1&gt;\""));
        assert!(html.contains("unknown module type"));
    }

    #[test]
    fn empty_slideshow_renders_nothing() {
        assert!(slideshow(&Slideshow::default(), &images()).is_none());
    }

    #[test]
    fn quote_alone_is_enough() {
        let m = Quote {
            quote: Some("Be still".to_string()),
            ..Quote::default()
        };
        let view = quote(&m, &images()).unwrap();
        assert_eq!(view["quote"], "Be still");
        assert!(view["attribution"].is_null());
        assert!(view["image"].is_null());
    }

    #[test]
    fn cta_requires_heading_and_valid_link() {
        let mut m = CallToAction {
            heading: Some("Join us".to_string()),
            body: None,
            link: Some(link()),
        };
        assert!(cta(&m).is_some());
        m.link = Some(Link {
            href: Some("javascript:alert(1)".to_string()),
            ..link()
        });
        assert!(cta(&m).is_none());
    }

    #[test]
    fn form_requires_action_and_valid_fields() {
        use crate::modules::types::FormField;

        let field = FormField {
            name: "email".to_string(),
            ..FormField::default()
        };
        let mut m = FormModule {
            action: Some("https://forms.example.org/submit".to_string()),
            fields: vec![field],
            ..FormModule::default()
        };
        let view = form(&m).unwrap();
        assert_eq!(view["submit_label"], "Submit");
        assert_eq!(view["fields"][0]["label"], "email");

        m.action = Some("javascript:alert(1)".to_string());
        assert!(form(&m).is_none());

        m.action = Some("/subscribe".to_string());
        m.fields[0].name = "bad name\"".to_string();
        assert!(form(&m).is_none());
    }

    #[test]
    fn stories_grid_skips_cards_without_slug() {
        let m = StoriesGrid {
            heading: None,
            stories: vec![StoryCard {
                title: "Untitled".to_string(),
                ..StoryCard::default()
            }],
        };
        assert!(stories_grid(&m, &images()).is_none());
    }

    #[test]
    fn reviews_hero_averages_ratings() {
        let review = |rating| Review {
            body: Some("Great".to_string()),
            rating: Some(rating),
            ..Review::default()
        };
        let m = ReviewsHero {
            reviews: vec![review(4.0), review(5.0), review(9.0)],
            ..ReviewsHero::default()
        };
        let view = reviews_hero(&m, &images()).unwrap();
        // 9.0 clamps to 5.0
        let rating = view["rating"].as_f64().unwrap();
        assert!((rating - 14.0 / 3.0).abs() < 1e-4);
        assert_eq!(view["review_count"], 3);
    }

    #[test]
    fn product_ad_requires_title_and_link() {
        let m = ProductAd {
            title: Some("Devotional".to_string()),
            ..ProductAd::default()
        };
        assert!(product_ad(&m, &images()).is_none());
        let m = ProductAd {
            link: Some(link()),
            ..m
        };
        assert!(product_ad(&m, &images()).is_some());
    }

    #[test]
    fn two_column_needs_one_column() {
        assert!(two_column(&TwoColumn::default(), &images()).is_none());
        let m = TwoColumn {
            left: Some(Column {
                heading: Some("Left".to_string()),
                ..Column::default()
            }),
            ..TwoColumn::default()
        };
        let view = two_column(&m, &images()).unwrap();
        assert_eq!(view["columns"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn testimonial_requires_quote() {
        assert!(testimonial(&Testimonial::default(), &images()).is_none());
    }

    #[test]
    fn composite_feature_needs_heading_or_items() {
        assert!(composite_feature(&CompositeFeature::default(), &images()).is_none());
    }

    fn record(value: serde_json::Value) -> ModuleRecord {
        ModuleRecord::from_value(value)
    }

    fn render_all(mode: RenderMode, records: &[ModuleRecord]) -> Vec<RenderedSection> {
        let theme = ThemeEngine::builtin().unwrap();
        let images = images();
        let ctx = RenderContext {
            theme: &theme,
            images: &images,
            mode,
        };
        render_modules(&ctx, records)
    }

    #[test]
    fn sections_keep_stored_order() {
        let records = vec![
            record(json!({ "_key": "a", "_type": "quote", "quote": "First" })),
            record(json!({ "_key": "b", "_type": "hero", "heading": "Second" })),
            record(json!({ "_key": "c", "_type": "cta", "heading": "Third", "link": { "label": "Go", "href": "/go" } })),
        ];
        let sections = render_all(RenderMode::Production, &records);
        let keys: Vec<_> = sections.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert!(sections[0].html.contains("First"));
        assert_eq!(sections[1].type_name, "hero");
    }

    #[test]
    fn unknown_module_skipped_in_production() {
        let records = vec![
            record(json!({ "_key": "x", "_type": "carousel3d" })),
            record(json!({ "_key": "q", "_type": "quote", "quote": "Kept" })),
        ];
        let sections = render_all(RenderMode::Production, &records);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].key, "q");
    }

    #[test]
    fn unknown_module_placeholder_in_development() {
        let records = vec![record(json!({ "_key": "x", "_type": "carousel3d" }))];
        let sections = render_all(RenderMode::Development, &records);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].html.contains("data-module-type=\"carousel3d\""));
        assert!(sections[0].html.contains("data-module-key=\"x\""));
    }

    #[test]
    fn invalid_module_placeholder_in_development() {
        let records = vec![record(json!({ "_key": "h", "_type": "hero", "heading": 42 }))];
        assert!(render_all(RenderMode::Production, &records).is_empty());
        let sections = render_all(RenderMode::Development, &records);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].html.contains("data-module-type=\"hero\""));
    }

    #[test]
    fn empty_grid_and_slideshow_produce_nothing() {
        let records = vec![
            record(json!({ "_key": "g", "_type": "storiesGrid", "heading": "News", "stories": [] })),
            record(json!({ "_key": "s", "_type": "slideshow", "slides": null })),
        ];
        assert!(render_all(RenderMode::Development, &records).is_empty());
    }

    #[test]
    fn every_kind_renders_a_minimal_record() {
        let img = json!({ "asset": { "_ref": "image-abc-800x600-jpg" } });
        let link = json!({ "label": "More", "href": "/more" });
        let minimal = |kind: ModuleKind| -> serde_json::Value {
            match kind {
                ModuleKind::Hero => json!({ "heading": "Welcome" }),
                ModuleKind::RichText => json!({ "content": [
                    { "_type": "block", "style": "normal", "children": [{ "_type": "span", "text": "Hello" }] }
                ] }),
                ModuleKind::Slideshow => json!({ "slides": [{ "_key": "s1", "image": img.clone() }] }),
                ModuleKind::TwoColumn => json!({ "left": { "heading": "Left" } }),
                ModuleKind::Form => json!({ "action": "/subscribe", "fields": [{ "name": "email", "kind": "email" }] }),
                ModuleKind::Cta => json!({ "heading": "Join", "link": link.clone() }),
                ModuleKind::Quote => json!({ "quote": "Grace" }),
                ModuleKind::StoriesGrid => json!({ "stories": [{ "_id": "s", "title": "Story", "slug": "story" }] }),
                ModuleKind::CompositeFeature => json!({ "heading": "Programs" }),
                ModuleKind::Testimonial => json!({ "quote": "Changed my life" }),
                ModuleKind::ReviewsHero => json!({ "heading": "Loved by readers", "rating": 4.5 }),
                ModuleKind::ProductAd => json!({ "title": "Devotional", "link": link.clone() }),
            }
        };

        for kind in ModuleKind::ALL {
            let mut value = minimal(kind);
            value["_key"] = json!("k");
            value["_type"] = json!(kind.type_name());
            let sections = render_all(RenderMode::Production, &[record(value)]);
            assert_eq!(sections.len(), 1, "{} did not render", kind.type_name());
            assert!(sections[0].html.contains("data-module-key=\"k\""));
        }
    }

    #[test]
    fn rendered_text_is_escaped() {
        let records = vec![record(json!({ "_key": "q", "_type": "quote", "quote": "<script>x</script>" }))];
        let sections = render_all(RenderMode::Production, &records);
        assert!(!sections[0].html.contains("<script>"));
        assert!(sections[0].html.contains("&lt;script&gt;"));
    }
}
