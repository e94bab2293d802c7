//! Query projections for documents and settings.
//!
//! The module part of the document projection is generated from
//! [`ModuleKind::ALL`], the same table the renderer dispatches on, so every
//! module type the renderer knows is expanded here and no other fields are
//! requested.

use std::fmt::Write;

use crate::modules::ModuleKind;

/// Document types resolvable by slug.
pub const DOCUMENT_TYPES: &[&str] = &["page", "story"];

/// Fields shared by every document.
const COMMON_FIELDS: &[&str] = &[
    "_id",
    "_type",
    "title",
    r#""slug": slug.current"#,
    "seoDescription",
];

/// Page-only fields (besides modules).
const PAGE_FIELDS: &[&str] = &["shareImage"];

/// Story-only fields.
const STORY_FIELDS: &[&str] = &["featuredImage", "excerpt", "content", "publishedAt"];

/// Fields of the settings singleton.
const SETTINGS_FIELDS: &[&str] = &[
    "title",
    "tagline",
    "logo",
    "navigation",
    "footer",
    "social",
    "shareImage",
    "newsletter",
];

/// Projection used when a story is dereferenced from another document.
pub const STORY_CARD_PROJECTION: &str =
    r#"{_id, title, "slug": slug.current, featuredImage, excerpt, publishedAt}"#;

/// Build the conditional projection for a page's module array.
pub fn modules_projection() -> String {
    let mut out = String::from("modules[]{_key, _type");
    for kind in ModuleKind::ALL {
        // SAFETY: write!() to String is infallible
        #[allow(clippy::unwrap_used)]
        write!(
            out,
            r#", _type == "{}" => {{{}}}"#,
            kind.type_name(),
            kind.projection_fields().join(", ")
        )
        .unwrap();
    }
    out.push('}');
    out
}

/// Query for exactly one page or story by slug (`$slug` parameter).
pub fn document_query() -> String {
    let types = DOCUMENT_TYPES
        .iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"*[_type in [{types}] && slug.current == $slug][0]{{{common}, _type == "page" => {{{page}, {modules}}}, _type == "story" => {{{story}}}}}"#,
        common = COMMON_FIELDS.join(", "),
        page = PAGE_FIELDS.join(", "),
        modules = modules_projection(),
        story = STORY_FIELDS.join(", "),
    )
}

/// Query for the settings singleton. Not slug-scoped.
pub fn settings_query() -> String {
    format!(
        r#"*[_type == "settings"][0]{{{}}}"#,
        SETTINGS_FIELDS.join(", ")
    )
}

/// The result key a projection field expression produces.
///
/// `"slug": slug.current` yields `slug`; `stories[]->{...}` yields `stories`.
pub fn projected_key(expr: &str) -> &str {
    let expr = expr.trim();
    if let Some(rest) = expr.strip_prefix('"') {
        return rest.split('"').next().unwrap_or(rest);
    }
    let end = expr
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(expr.len());
    &expr[..end]
}
