//! Server-side rendering for portable-text rich content.
//!
//! Converts the CMS block array into semantic HTML:
//! - Text blocks with styles (`normal`, `h2`–`h4`, `blockquote`)
//! - Consecutive list items grouped into `<ul>` / `<ol>`
//! - Span decorators (`strong`, `em`, `underline`, `code`, `strike-through`)
//! - Link annotations, restricted to safe hrefs
//! - Inline image blocks resolved through the [`ImageUrlBuilder`]
//!
//! Unknown block types are silently skipped. All text is escaped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::image::{ImageRef, ImageUrlBuilder};
use crate::routes::helpers::html_escape;

/// Width requested for images embedded in rich text.
const INLINE_IMAGE_WIDTH: u32 = 1200;

/// A rich-text field: an ordered array of portable-text blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<Value>);

impl RichText {
    /// True when there is no visible text or image in the field.
    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|block| {
            match block.get("_type").and_then(Value::as_str) {
                Some("block") => !plain_text(block).trim().is_empty(),
                Some("image") => true,
                _ => false,
            }
        })
    }

    /// Render the blocks to HTML.
    pub fn to_html(&self, images: &ImageUrlBuilder) -> String {
        render_portable_text(&self.0, images)
    }
}

/// Validate that an href is safe to emit.
pub fn is_safe_href(href: &str) -> bool {
    let trimmed = href.trim();
    trimmed.starts_with("https://")
        || trimmed.starts_with("http://")
        || trimmed.starts_with("mailto:")
        || trimmed.starts_with("tel:")
        || trimmed.starts_with('#')
        || (trimmed.starts_with('/') && !trimmed.starts_with("//"))
}

/// Render an array of portable-text blocks into a single HTML string.
pub fn render_portable_text(blocks: &[Value], images: &ImageUrlBuilder) -> String {
    let mut html = String::new();
    // Open list tag, if any: ("ul" | "ol")
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let block_type = block.get("_type").and_then(|t| t.as_str()).unwrap_or("");
        let list_tag = match block.get("listItem").and_then(|v| v.as_str()) {
            Some("number") => Some("ol"),
            Some(_) => Some("ul"),
            None => None,
        };

        if block_type != "block" || list_tag != open_list {
            if let Some(tag) = open_list.take() {
                html.push_str(&format!("</{tag}>"));
            }
        }

        let rendered = match block_type {
            "block" => {
                if let Some(tag) = list_tag {
                    if open_list.is_none() {
                        html.push_str(&format!("<{tag}>"));
                        open_list = Some(tag);
                    }
                    format!("<li>{}</li>", render_spans(block))
                } else {
                    render_text_block(block)
                }
            }
            "image" => render_image(block, images),
            _ => String::new(),
        };
        html.push_str(&rendered);
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{tag}>"));
    }
    html
}

// ---------------------------------------------------------------------------
// Individual block renderers
// ---------------------------------------------------------------------------

/// Render a non-list text block according to its style.
fn render_text_block(block: &Value) -> String {
    let inner = render_spans(block);
    if inner.is_empty() {
        return String::new();
    }
    match block.get("style").and_then(|v| v.as_str()).unwrap_or("normal") {
        style @ ("h2" | "h3" | "h4") => format!("<{style}>{inner}</{style}>"),
        // h1 is reserved for the page title
        "h1" => format!("<h2>{inner}</h2>"),
        "blockquote" => format!("<blockquote><p>{inner}</p></blockquote>"),
        _ => format!("<p>{inner}</p>"),
    }
}

/// Render the children spans of a block with their marks.
fn render_spans(block: &Value) -> String {
    let mark_defs = block
        .get("markDefs")
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    let Some(children) = block.get("children").and_then(|v| v.as_array()) else {
        return String::new();
    };

    let mut html = String::new();
    for child in children {
        let text = child.get("text").and_then(|v| v.as_str()).unwrap_or("");
        if text.is_empty() {
            continue;
        }
        let mut span = html_escape(text).replace('\n', "<br>");

        let marks = child
            .get("marks")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default();
        for mark in marks.iter().filter_map(|m| m.as_str()) {
            span = apply_mark(mark, span, mark_defs);
        }
        html.push_str(&span);
    }
    html
}

/// Wrap rendered text in the markup for a decorator or annotation.
fn apply_mark(mark: &str, inner: String, mark_defs: &[Value]) -> String {
    match mark {
        "strong" => format!("<strong>{inner}</strong>"),
        "em" => format!("<em>{inner}</em>"),
        "underline" => format!("<u>{inner}</u>"),
        "code" => format!("<code>{inner}</code>"),
        "strike-through" => format!("<s>{inner}</s>"),
        key => {
            let def = mark_defs
                .iter()
                .find(|d| d.get("_key").and_then(|k| k.as_str()) == Some(key));
            let href = def
                .filter(|d| d.get("_type").and_then(|t| t.as_str()) == Some("link"))
                .and_then(|d| d.get("href"))
                .and_then(|h| h.as_str());
            match href {
                Some(href) if is_safe_href(href) => {
                    let external = href.starts_with("http");
                    let rel = if external {
                        " target=\"_blank\" rel=\"noopener noreferrer\""
                    } else {
                        ""
                    };
                    format!("<a href=\"{}\"{rel}>{inner}</a>", html_escape(href.trim()))
                }
                // Unknown or unsafe annotation: keep the text only
                _ => inner,
            }
        }
    }
}

/// Render an inline image block with a figure/figcaption wrapper.
fn render_image(block: &Value, images: &ImageUrlBuilder) -> String {
    let Ok(image) = serde_json::from_value::<ImageRef>(block.clone()) else {
        return String::new();
    };
    let Some(view) = images.view(Some(&image), Some(INLINE_IMAGE_WIDTH)) else {
        return String::new();
    };
    let caption = block.get("caption").and_then(|v| v.as_str()).unwrap_or("");

    let mut html = format!(
        "<figure><img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
        html_escape(&view.url),
        html_escape(&view.alt)
    );
    if !caption.is_empty() {
        html.push_str(&format!("<figcaption>{}</figcaption>", html_escape(caption)));
    }
    html.push_str("</figure>");
    html
}

fn plain_text(block: &Value) -> String {
    block
        .get("children")
        .and_then(|v| v.as_array())
        .map(|children| {
            children
                .iter()
                .filter_map(|c| c.get("text").and_then(|t| t.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
