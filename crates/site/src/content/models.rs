//! Content documents: pages, stories, and the site settings singleton.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::image::ImageRef;
use super::{lenient, lenient_datetime, nullable};
use super::portable_text::{RichText, is_safe_href};
use crate::modules::ModuleRecord;

/// A top-level document resolved by slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Document {
    #[serde(rename = "page")]
    Page(Page),
    #[serde(rename = "story")]
    Story(Story),
}

impl Document {
    pub fn title(&self) -> &str {
        match self {
            Document::Page(p) => &p.title,
            Document::Story(s) => &s.title,
        }
    }

    pub fn slug(&self) -> &str {
        match self {
            Document::Page(p) => &p.slug,
            Document::Story(s) => &s.slug,
        }
    }

    /// Machine name of the document type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Document::Page(_) => "page",
            Document::Story(_) => "story",
        }
    }

    pub fn seo_description(&self) -> Option<&str> {
        match self {
            Document::Page(p) => p.seo_description.as_deref(),
            Document::Story(s) => s
                .seo_description
                .as_deref()
                .or(s.excerpt.as_deref()),
        }
    }

    /// Image used for social sharing, if the document provides one.
    pub fn share_image(&self) -> Option<&ImageRef> {
        match self {
            Document::Page(p) => p.share_image.as_ref(),
            Document::Story(s) => s.featured_image.as_ref(),
        }
    }
}

/// A page assembled from an ordered list of modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub slug: String,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub share_image: Option<ImageRef>,
    #[serde(default, deserialize_with = "nullable")]
    pub modules: Vec<ModuleRecord>,
}

/// A story (article), referenced by stories-grid modules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub slug: String,
    #[serde(default, deserialize_with = "lenient")]
    pub featured_image: Option<ImageRef>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub content: RichText,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub published_at: Option<DateTime<Utc>>,
}

/// A navigation or call-to-action link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

/// A link that passed validation, ready for a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkView {
    pub label: String,
    pub href: String,
    pub external: bool,
}

impl Link {
    /// Resolve the link; `None` when the label is blank or the href unsafe.
    pub fn view(&self) -> Option<LinkView> {
        let label = self.label.as_deref().map(str::trim).filter(|l| !l.is_empty())?;
        let href = self.href.as_deref().map(str::trim).filter(|h| is_safe_href(h))?;
        Some(LinkView {
            label: label.to_string(),
            href: href.to_string(),
            external: href.starts_with("http"),
        })
    }
}

/// Resolve an optional link.
pub fn link_view(link: Option<&Link>) -> Option<LinkView> {
    link.and_then(Link::view)
}

/// A titled column of footer links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkColumn {
    #[serde(rename = "_key", default)]
    pub key: Option<String>,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub links: Vec<Link>,
}

/// Site footer content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Footer {
    #[serde(default, deserialize_with = "nullable")]
    pub text: RichText,
    #[serde(default, deserialize_with = "nullable")]
    pub columns: Vec<LinkColumn>,
    #[serde(default)]
    pub copyright: Option<String>,
}

/// A social profile link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLink {
    #[serde(rename = "_key", default)]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub platform: String,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
}

/// Newsletter sign-up strip shown above the footer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Newsletter {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub button_label: Option<String>,
}

/// Site-wide settings singleton.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub logo: Option<ImageRef>,
    #[serde(default, deserialize_with = "nullable")]
    pub navigation: Vec<Link>,
    #[serde(default, deserialize_with = "nullable")]
    pub footer: Footer,
    #[serde(default, deserialize_with = "nullable")]
    pub social: Vec<SocialLink>,
    #[serde(default, deserialize_with = "lenient")]
    pub share_image: Option<ImageRef>,
    #[serde(default)]
    pub newsletter: Option<Newsletter>,
}
