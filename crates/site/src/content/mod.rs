//! Content layer.
//!
//! This module provides:
//! - Document models: Page, Story, Settings
//! - ImageUrlBuilder: render-time image URL resolution
//! - Portable-text rendering for rich text fields
//! - Query projections for documents and settings
//! - ContentSource: the fetch seam, with CMS and in-memory implementations

pub mod image;
pub mod memory;
pub mod models;
pub mod portable_text;
pub mod query;
pub mod sanity;
mod source;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub use image::{ImageRef, ImageUrlBuilder, ImageView};
pub use memory::MemorySource;
pub use models::{Document, Link, LinkView, Page, Settings, Story};
pub use portable_text::RichText;
pub use sanity::SanityClient;
pub use source::{ContentError, ContentSource, Perspective};

/// Deserialize a field that the query API may return as `null`.
///
/// Projections return `null` for fields that are absent on a document;
/// those map to the type's default value.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize an array whose items may be `null`, dropping the nulls.
///
/// Dereferenced references come back as `null` when the target document
/// was deleted or is unpublished.
pub(crate) fn nullable_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items.into_iter().flatten().collect())
}

/// Deserialize an optional field, treating a malformed value as absent.
///
/// Used for image metadata: a broken hotspot or asset object drops that
/// one image, not the module or document carrying it.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Deserialize an optional timestamp: RFC 3339, or a bare `YYYY-MM-DD`
/// taken as midnight UTC. Anything else is absent.
pub(crate) fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_str).and_then(parse_datetime))
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
}
