//! Field sets of the embeddable module types.
//!
//! Every field is optional at the wire level: the CMS returns `null` for
//! anything an editor left empty, and each renderer decides which fields it
//! cannot do without.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::models::Link;
use crate::content::{ImageRef, RichText, lenient, lenient_datetime, nullable, nullable_items};

/// Full-width banner with heading, image and a call to action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hero {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub subheading: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub cta: Option<Link>,
}

/// Free-form rich text section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichTextModule {
    #[serde(default, deserialize_with = "nullable")]
    pub content: RichText,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    #[serde(rename = "_key", default)]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub link: Option<Link>,
}

/// Rotating image carousel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slideshow {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default, deserialize_with = "nullable_items")]
    pub slides: Vec<Slide>,
    #[serde(default)]
    pub interval_seconds: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub body: RichText,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub link: Option<Link>,
}

/// Side-by-side text/image columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoColumn {
    #[serde(default)]
    pub left: Option<Column>,
    #[serde(default)]
    pub right: Option<Column>,
    #[serde(default, deserialize_with = "nullable")]
    pub reverse: bool,
}

/// Input type of a form field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Email,
    Phone,
    Textarea,
    Select,
    Checkbox,
    #[default]
    #[serde(other)]
    Text,
}

impl FieldKind {
    /// HTML `type` attribute for `<input>` based kinds.
    pub fn input_type(self) -> &'static str {
        match self {
            FieldKind::Email => "email",
            FieldKind::Phone => "tel",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Text | FieldKind::Textarea | FieldKind::Select => "text",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    #[serde(rename = "_key", default)]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub kind: FieldKind,
    #[serde(default, deserialize_with = "nullable")]
    pub required: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub options: Vec<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
}

/// Contact / sign-up form posting to an external endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormModule {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub submit_label: Option<String>,
    #[serde(default)]
    pub success_message: Option<String>,
    #[serde(default, deserialize_with = "nullable_items")]
    pub fields: Vec<FormField>,
}

/// Call-to-action banner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToAction {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub link: Option<Link>,
}

/// Pull quote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub attribution: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<ImageRef>,
}

/// A story as dereferenced from a stories grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryCard {
    #[serde(rename = "_id", default, deserialize_with = "nullable")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub slug: String,
    #[serde(default, deserialize_with = "lenient")]
    pub featured_image: Option<ImageRef>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Grid of story teasers. Stories are referenced, not owned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoriesGrid {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default, deserialize_with = "nullable_items")]
    pub stories: Vec<StoryCard>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureItem {
    #[serde(rename = "_key", default)]
    pub key: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub icon: Option<ImageRef>,
    #[serde(default)]
    pub link: Option<Link>,
}

/// Intro text and image with a list of feature items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeFeature {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub body: RichText,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<ImageRef>,
    #[serde(default, deserialize_with = "nullable_items")]
    pub items: Vec<FeatureItem>,
}

/// Single testimonial with the person's name and role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<ImageRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_key", default)]
    pub key: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
}

/// Banner summarising reviews with an aggregate rating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsHero {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default, deserialize_with = "nullable_items")]
    pub reviews: Vec<Review>,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<ImageRef>,
}

/// Advertisement for a product (book, resource, event ticket).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAd {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub link: Option<Link>,
}
