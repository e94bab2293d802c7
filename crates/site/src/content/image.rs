//! Image references and render-time URL building.
//!
//! Documents never store literal image URLs. An image field holds an opaque
//! asset reference (`image-<id>-<w>x<h>-<ext>`) plus optional alt text,
//! hotspot, and crop; the [`ImageUrlBuilder`] turns that into a CDN URL when
//! a template needs one. A reference that cannot be parsed resolves to `None`
//! and the dependent markup is omitted.

use serde::{Deserialize, Serialize};
use url::Url;

use super::lenient;

/// CDN host serving image assets.
const IMAGE_CDN: &str = "https://cdn.sanity.io/images";

/// An image field as stored on a document or module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    #[serde(default, deserialize_with = "lenient")]
    pub asset: Option<AssetRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub alt: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub hotspot: Option<Hotspot>,
    #[serde(default, deserialize_with = "lenient")]
    pub crop: Option<Crop>,
}

/// Reference to an uploaded asset document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "_ref")]
    pub reference: String,
}

/// Focal point, as fractions of the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

/// Crop insets, as fractions trimmed from each edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub right: f64,
}

/// Parsed form of an asset reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetId {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

impl AssetId {
    /// Parse `image-<id>-<width>x<height>-<format>`.
    pub fn parse(reference: &str) -> Option<Self> {
        let rest = reference.strip_prefix("image-")?;
        let (rest, format) = rest.rsplit_once('-')?;
        let (id, dimensions) = rest.rsplit_once('-')?;
        let (width, height) = dimensions.split_once('x')?;

        if id.is_empty() || format.is_empty() {
            return None;
        }

        Some(Self {
            id: id.to_string(),
            width: width.parse().ok().filter(|w| *w > 0)?,
            height: height.parse().ok().filter(|h| *h > 0)?,
            format: format.to_string(),
        })
    }
}

/// A resolved image ready for a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
    pub width: u32,
    pub height: u32,
}

/// Builds CDN URLs for image references.
#[derive(Debug, Clone)]
pub struct ImageUrlBuilder {
    base: String,
}

impl ImageUrlBuilder {
    /// Create a builder for a project's dataset.
    pub fn new(project_id: &str, dataset: &str) -> Self {
        Self {
            base: format!("{IMAGE_CDN}/{project_id}/{dataset}"),
        }
    }

    /// Resolve an image to a URL, optionally scaled to `width` pixels.
    ///
    /// Returns `None` for missing or malformed asset references.
    pub fn url(&self, image: &ImageRef, width: Option<u32>) -> Option<String> {
        let asset = AssetId::parse(&image.asset.as_ref()?.reference)?;
        let mut url = Url::parse(&format!(
            "{}/{}-{}x{}.{}",
            self.base, asset.id, asset.width, asset.height, asset.format
        ))
        .ok()?;

        {
            let mut query = url.query_pairs_mut();

            if let Some(crop) = image.crop.filter(|c| *c != Crop::default()) {
                let left = (crop.left * f64::from(asset.width)).round();
                let top = (crop.top * f64::from(asset.height)).round();
                let w = ((1.0 - crop.left - crop.right) * f64::from(asset.width)).round();
                let h = ((1.0 - crop.top - crop.bottom) * f64::from(asset.height)).round();
                if w > 0.0 && h > 0.0 {
                    query.append_pair("rect", &format!("{left},{top},{w},{h}"));
                }
            }

            if let Some(width) = width {
                query.append_pair("w", &width.to_string());
            }

            if let Some(hotspot) = image.hotspot {
                query.append_pair("fit", "crop");
                query.append_pair("crop", "focalpoint");
                query.append_pair("fp-x", &format!("{:.3}", hotspot.x.clamp(0.0, 1.0)));
                query.append_pair("fp-y", &format!("{:.3}", hotspot.y.clamp(0.0, 1.0)));
            }

            query.append_pair("auto", "format");
        }

        Some(url.into())
    }

    /// Resolve an optional image into a template view.
    pub fn view(&self, image: Option<&ImageRef>, width: Option<u32>) -> Option<ImageView> {
        let image = image?;
        let url = self.url(image, width)?;
        let asset = AssetId::parse(&image.asset.as_ref()?.reference)?;

        Some(ImageView {
            url,
            alt: image.alt.clone().unwrap_or_default(),
            width: asset.width,
            height: asset.height,
        })
    }
}
