//! Page-builder modules.
//!
//! [`ModuleKind`] is the one table of module types: it names each type's
//! discriminator, the fields the query layer projects for it, and the
//! template the renderer uses. [`Module`] is the closed sum type decoded from
//! a page's module array; rendering is an exhaustive match over it.
//!
//! Records whose `_type` is not in the table decode to [`Module::Unknown`],
//! and records that fail to decode to [`Module::Invalid`]. Neither is an
//! error: content types added in the CMS before the site knows about them
//! must not break published pages.

mod render;
mod types;

use serde::de::Deserializer;
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub use render::{RenderContext, RenderMode, RenderedSection, render_module, render_modules};
pub use types::{
    CallToAction, Column, CompositeFeature, FeatureItem, FieldKind, FormField, FormModule, Hero,
    ProductAd, Quote, Review, ReviewsHero, RichTextModule, Slide, Slideshow, StoriesGrid,
    StoryCard, Testimonial, TwoColumn,
};

/// The closed set of module types the site can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Hero,
    RichText,
    Slideshow,
    TwoColumn,
    Form,
    Cta,
    Quote,
    StoriesGrid,
    CompositeFeature,
    Testimonial,
    ReviewsHero,
    ProductAd,
}

impl ModuleKind {
    /// Every module kind, in registry order.
    pub const ALL: [ModuleKind; 12] = [
        ModuleKind::Hero,
        ModuleKind::RichText,
        ModuleKind::Slideshow,
        ModuleKind::TwoColumn,
        ModuleKind::Form,
        ModuleKind::Cta,
        ModuleKind::Quote,
        ModuleKind::StoriesGrid,
        ModuleKind::CompositeFeature,
        ModuleKind::Testimonial,
        ModuleKind::ReviewsHero,
        ModuleKind::ProductAd,
    ];

    /// The `_type` discriminator stored in the CMS.
    pub fn type_name(self) -> &'static str {
        match self {
            ModuleKind::Hero => "hero",
            ModuleKind::RichText => "richText",
            ModuleKind::Slideshow => "slideshow",
            ModuleKind::TwoColumn => "twoColumn",
            ModuleKind::Form => "form",
            ModuleKind::Cta => "cta",
            ModuleKind::Quote => "quote",
            ModuleKind::StoriesGrid => "storiesGrid",
            ModuleKind::CompositeFeature => "compositeFeature",
            ModuleKind::Testimonial => "testimonial",
            ModuleKind::ReviewsHero => "reviewsHero",
            ModuleKind::ProductAd => "productAd",
        }
    }

    /// Look up a kind by its discriminator.
    pub fn from_type_name(type_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.type_name() == type_name)
    }

    /// Template used to render this kind.
    pub fn template(self) -> &'static str {
        match self {
            ModuleKind::Hero => "modules/hero.html",
            ModuleKind::RichText => "modules/rich_text.html",
            ModuleKind::Slideshow => "modules/slideshow.html",
            ModuleKind::TwoColumn => "modules/two_column.html",
            ModuleKind::Form => "modules/form.html",
            ModuleKind::Cta => "modules/cta.html",
            ModuleKind::Quote => "modules/quote.html",
            ModuleKind::StoriesGrid => "modules/stories_grid.html",
            ModuleKind::CompositeFeature => "modules/composite_feature.html",
            ModuleKind::Testimonial => "modules/testimonial.html",
            ModuleKind::ReviewsHero => "modules/reviews_hero.html",
            ModuleKind::ProductAd => "modules/product_ad.html",
        }
    }

    /// Projection field expressions fetched for this kind.
    ///
    /// Must name exactly the fields of the kind's struct in [`types`].
    pub fn projection_fields(self) -> &'static [&'static str] {
        match self {
            ModuleKind::Hero => &["heading", "subheading", "image", "cta"],
            ModuleKind::RichText => &["content"],
            ModuleKind::Slideshow => &["heading", "slides", "intervalSeconds"],
            ModuleKind::TwoColumn => &["left", "right", "reverse"],
            ModuleKind::Form => &[
                "heading",
                "description",
                "action",
                "submitLabel",
                "successMessage",
                "fields",
            ],
            ModuleKind::Cta => &["heading", "body", "link"],
            ModuleKind::Quote => &["quote", "attribution", "image"],
            ModuleKind::StoriesGrid => &[
                "heading",
                r#"stories[]->{_id, title, "slug": slug.current, featuredImage, excerpt, publishedAt}"#,
            ],
            ModuleKind::CompositeFeature => &["heading", "body", "image", "items"],
            ModuleKind::Testimonial => &["quote", "name", "role", "image"],
            ModuleKind::ReviewsHero => &["heading", "rating", "reviewCount", "reviews", "image"],
            ModuleKind::ProductAd => &["title", "description", "price", "image", "link"],
        }
    }
}

/// A decoded module.
#[derive(Debug, Clone, PartialEq)]
pub enum Module {
    Hero(Hero),
    RichText(RichTextModule),
    Slideshow(Slideshow),
    TwoColumn(TwoColumn),
    Form(FormModule),
    Cta(CallToAction),
    Quote(Quote),
    StoriesGrid(StoriesGrid),
    CompositeFeature(CompositeFeature),
    Testimonial(Testimonial),
    ReviewsHero(ReviewsHero),
    ProductAd(ProductAd),
    /// A discriminator the site has no renderer for.
    Unknown { type_name: String },
    /// A known discriminator whose fields could not be decoded.
    Invalid { kind: ModuleKind, error: String },
}

impl Module {
    /// The registered kind, or `None` for unknown discriminators.
    pub fn kind(&self) -> Option<ModuleKind> {
        Some(match self {
            Module::Hero(_) => ModuleKind::Hero,
            Module::RichText(_) => ModuleKind::RichText,
            Module::Slideshow(_) => ModuleKind::Slideshow,
            Module::TwoColumn(_) => ModuleKind::TwoColumn,
            Module::Form(_) => ModuleKind::Form,
            Module::Cta(_) => ModuleKind::Cta,
            Module::Quote(_) => ModuleKind::Quote,
            Module::StoriesGrid(_) => ModuleKind::StoriesGrid,
            Module::CompositeFeature(_) => ModuleKind::CompositeFeature,
            Module::Testimonial(_) => ModuleKind::Testimonial,
            Module::ReviewsHero(_) => ModuleKind::ReviewsHero,
            Module::ProductAd(_) => ModuleKind::ProductAd,
            Module::Invalid { kind, .. } => *kind,
            Module::Unknown { .. } => return None,
        })
    }

    /// The discriminator this module was stored with.
    pub fn type_name(&self) -> &str {
        match self {
            Module::Unknown { type_name } => type_name.as_str(),
            other => other.kind().map(ModuleKind::type_name).unwrap_or_default(),
        }
    }

    /// Decode the fields of a known kind from a raw module object.
    pub fn decode(kind: ModuleKind, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            ModuleKind::Hero => Module::Hero(serde_json::from_value(value)?),
            ModuleKind::RichText => Module::RichText(serde_json::from_value(value)?),
            ModuleKind::Slideshow => Module::Slideshow(serde_json::from_value(value)?),
            ModuleKind::TwoColumn => Module::TwoColumn(serde_json::from_value(value)?),
            ModuleKind::Form => Module::Form(serde_json::from_value(value)?),
            ModuleKind::Cta => Module::Cta(serde_json::from_value(value)?),
            ModuleKind::Quote => Module::Quote(serde_json::from_value(value)?),
            ModuleKind::StoriesGrid => Module::StoriesGrid(serde_json::from_value(value)?),
            ModuleKind::CompositeFeature => {
                Module::CompositeFeature(serde_json::from_value(value)?)
            }
            ModuleKind::Testimonial => Module::Testimonial(serde_json::from_value(value)?),
            ModuleKind::ReviewsHero => Module::ReviewsHero(serde_json::from_value(value)?),
            ModuleKind::ProductAd => Module::ProductAd(serde_json::from_value(value)?),
        })
    }

    /// Encode the module's own fields (without `_key` / `_type`).
    pub fn fields(&self) -> Result<Value, serde_json::Error> {
        match self {
            Module::Hero(m) => serde_json::to_value(m),
            Module::RichText(m) => serde_json::to_value(m),
            Module::Slideshow(m) => serde_json::to_value(m),
            Module::TwoColumn(m) => serde_json::to_value(m),
            Module::Form(m) => serde_json::to_value(m),
            Module::Cta(m) => serde_json::to_value(m),
            Module::Quote(m) => serde_json::to_value(m),
            Module::StoriesGrid(m) => serde_json::to_value(m),
            Module::CompositeFeature(m) => serde_json::to_value(m),
            Module::Testimonial(m) => serde_json::to_value(m),
            Module::ReviewsHero(m) => serde_json::to_value(m),
            Module::ProductAd(m) => serde_json::to_value(m),
            Module::Unknown { .. } | Module::Invalid { .. } => {
                Ok(Value::Object(serde_json::Map::new()))
            }
        }
    }
}

/// One entry of a page's module array: a stable key plus the module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleRecord {
    pub key: String,
    pub module: Module,
}

impl ModuleRecord {
    pub fn new(key: impl Into<String>, module: Module) -> Self {
        Self {
            key: key.into(),
            module,
        }
    }

    /// Decode a raw module object. Never fails; see [`Module::Unknown`]
    /// and [`Module::Invalid`].
    pub fn from_value(value: Value) -> Self {
        let key = value
            .get("_key")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let type_name = value
            .get("_type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let module = match ModuleKind::from_type_name(&type_name) {
            Some(kind) => Module::decode(kind, value).unwrap_or_else(|e| {
                warn!(key = %key, module_type = %type_name, error = %e, "failed to decode module");
                Module::Invalid {
                    kind,
                    error: e.to_string(),
                }
            }),
            None => Module::Unknown { type_name },
        };

        Self { key, module }
    }
}

impl<'de> Deserialize<'de> for ModuleRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_value(Value::deserialize(deserializer)?))
    }
}

impl Serialize for ModuleRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = self.module.fields().map_err(S::Error::custom)?;
        if let Value::Object(map) = &mut value {
            map.insert("_key".to_string(), Value::String(self.key.clone()));
            map.insert(
                "_type".to_string(),
                Value::String(self.module.type_name().to_string()),
            );
        }
        value.serialize(serializer)
    }
}
