//! Theme engine with Tera templates and suggestion resolution.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use dashmap::DashMap;
use tera::Tera;
use tracing::{debug, info};

/// Templates compiled into the binary.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../../templates/layout.html")),
    ("page.html", include_str!("../../templates/page.html")),
    ("page--story.html", include_str!("../../templates/page--story.html")),
    ("not_found.html", include_str!("../../templates/not_found.html")),
    ("loading.html", include_str!("../../templates/loading.html")),
    (
        "diagnostics/module.html",
        include_str!("../../templates/diagnostics/module.html"),
    ),
    ("modules/hero.html", include_str!("../../templates/modules/hero.html")),
    (
        "modules/rich_text.html",
        include_str!("../../templates/modules/rich_text.html"),
    ),
    (
        "modules/slideshow.html",
        include_str!("../../templates/modules/slideshow.html"),
    ),
    (
        "modules/two_column.html",
        include_str!("../../templates/modules/two_column.html"),
    ),
    ("modules/form.html", include_str!("../../templates/modules/form.html")),
    ("modules/cta.html", include_str!("../../templates/modules/cta.html")),
    ("modules/quote.html", include_str!("../../templates/modules/quote.html")),
    (
        "modules/stories_grid.html",
        include_str!("../../templates/modules/stories_grid.html"),
    ),
    (
        "modules/composite_feature.html",
        include_str!("../../templates/modules/composite_feature.html"),
    ),
    (
        "modules/testimonial.html",
        include_str!("../../templates/modules/testimonial.html"),
    ),
    (
        "modules/reviews_hero.html",
        include_str!("../../templates/modules/reviews_hero.html"),
    ),
    (
        "modules/product_ad.html",
        include_str!("../../templates/modules/product_ad.html"),
    ),
];

/// Theme engine for rendering templates.
pub struct ThemeEngine {
    /// Tera template engine instance.
    tera: Tera,
    /// Cache mapping suggestion lists to resolved template names.
    suggestion_cache: DashMap<String, String>,
}

impl ThemeEngine {
    /// Create a theme engine from the built-in templates, with any
    /// `*.html` file under `overrides` replacing the built-in of the same
    /// name (or adding a new suggestion target).
    pub fn new(overrides: Option<&Path>) -> Result<Self> {
        let mut builtin = Tera::default();
        builtin
            .add_raw_templates(BUILTIN_TEMPLATES.iter().copied())
            .context("failed to parse built-in templates")?;

        let mut tera = match overrides {
            Some(dir) => {
                let pattern = dir.join("**/*.html");
                let pattern_str = pattern
                    .to_str()
                    .context("invalid template directory path")?;

                // Parse without inheritance so overrides may extend built-ins
                let mut custom =
                    Tera::parse(pattern_str).context("failed to load template overrides")?;
                let override_count = custom.get_template_names().count();
                custom
                    .extend(&builtin)
                    .context("failed to merge built-in templates")?;
                custom
                    .build_inheritance_chains()
                    .context("failed to resolve template inheritance")?;
                info!(dir = %dir.display(), count = override_count, "loaded template overrides");
                custom
            }
            None => builtin,
        };

        Self::register_filters(&mut tera);

        let template_names: Vec<_> = tera.get_template_names().collect();
        debug!(count = template_names.len(), "loaded templates");

        Ok(Self {
            tera,
            suggestion_cache: DashMap::new(),
        })
    }

    /// Theme engine with only the built-in templates.
    pub fn builtin() -> Result<Self> {
        Self::new(None)
    }

    /// Register custom Tera filters.
    fn register_filters(tera: &mut Tera) {
        // RFC 3339 string (or Unix timestamp) to "March 4, 2025"
        tera.register_filter(
            "format_date",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let parsed = match value {
                    tera::Value::String(s) => chrono::DateTime::parse_from_rfc3339(s)
                        .ok()
                        .map(|dt| dt.with_timezone(&chrono::Utc)),
                    tera::Value::Number(n) => n
                        .as_i64()
                        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0)),
                    _ => None,
                };

                let formatted = parsed
                    .map(|dt| dt.format("%B %-d, %Y").to_string())
                    .unwrap_or_default();

                Ok(tera::Value::String(formatted))
            },
        );

        // Rating (0-5) to a row of filled and empty stars
        tera.register_filter(
            "stars",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let rating = value.as_f64().unwrap_or(0.0).clamp(0.0, 5.0);
                let filled = rating.round() as usize;
                let stars = format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled));
                Ok(tera::Value::String(stars))
            },
        );
    }

    /// Whether a template with this exact name is loaded.
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template(name).is_ok()
    }

    /// Resolve the best template from a list of suggestions.
    ///
    /// Templates are tried in order; the first one that exists is returned.
    /// Results are cached.
    ///
    /// Example suggestions: `["page--story--easter", "page--story", "page"]`
    pub fn resolve_template(&self, suggestions: &[&str]) -> Option<String> {
        if suggestions.is_empty() {
            return None;
        }

        let cache_key = suggestions.join("|");
        if let Some(cached) = self.suggestion_cache.get(&cache_key) {
            return Some(cached.clone());
        }

        for suggestion in suggestions {
            let template_name = if suggestion.ends_with(".html") {
                (*suggestion).to_string()
            } else {
                format!("{suggestion}.html")
            };
            if self.has_template(&template_name) {
                self.suggestion_cache
                    .insert(cache_key, template_name.clone());
                return Some(template_name);
            }
        }

        None
    }

    /// Page template suggestions for a document, most specific first:
    /// - `page--{type}--{slug}`
    /// - `page--{type}`
    /// - `page`
    pub fn page_suggestions(type_name: &str, slug: &str) -> Vec<String> {
        let mut suggestions = Vec::with_capacity(3);
        if !slug.is_empty() {
            suggestions.push(format!("page--{type_name}--{slug}"));
        }
        suggestions.push(format!("page--{type_name}"));
        suggestions.push("page".to_string());
        suggestions
    }

    /// Render a named template.
    pub fn render_template(&self, name: &str, context: &tera::Context) -> Result<String> {
        self.tera
            .render(name, context)
            .with_context(|| format!("failed to render template {name}"))
    }

    /// Render a document page, choosing the template by suggestion.
    pub fn render_page(
        &self,
        type_name: &str,
        slug: &str,
        context: &tera::Context,
    ) -> Result<String> {
        let suggestions = Self::page_suggestions(type_name, slug);
        let suggestion_refs: Vec<&str> = suggestions.iter().map(|s| s.as_str()).collect();

        let template = self
            .resolve_template(&suggestion_refs)
            .unwrap_or_else(|| "page.html".to_string());

        self.render_template(&template, context)
    }
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("template_count", &self.tera.get_template_names().count())
            .field("cache_size", &self.suggestion_cache.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn render_filter(template: &str, key: &str, value: impl serde::Serialize) -> String {
        let mut tera = Tera::default();
        ThemeEngine::register_filters(&mut tera);
        tera.add_raw_template("test", template).unwrap();
        let mut ctx = tera::Context::new();
        ctx.insert(key, &value);
        tera.render("test", &ctx).unwrap()
    }

    #[test]
    fn builtin_templates_parse() {
        let engine = ThemeEngine::builtin().unwrap();
        for (name, _) in BUILTIN_TEMPLATES {
            assert!(engine.has_template(name), "missing {name}");
        }
    }

    #[test]
    fn page_suggestions_most_specific_first() {
        assert_eq!(
            ThemeEngine::page_suggestions("story", "easter"),
            vec!["page--story--easter", "page--story", "page"]
        );
        assert_eq!(
            ThemeEngine::page_suggestions("page", ""),
            vec!["page--page", "page"]
        );
    }

    #[test]
    fn resolve_template_falls_through() {
        let engine = ThemeEngine::builtin().unwrap();
        assert_eq!(
            engine.resolve_template(&["page--story--easter", "page--story", "page"]),
            Some("page--story.html".to_string())
        );
        assert_eq!(
            engine.resolve_template(&["page--page--about", "page--page", "page"]),
            Some("page.html".to_string())
        );
        assert_eq!(engine.resolve_template(&["nope"]), None);
        assert_eq!(engine.resolve_template(&[]), None);
    }

    #[test]
    fn overrides_replace_builtins() {
        let dir = std::env::temp_dir().join(format!("site-theme-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("not_found.html"),
            "{% extends \"layout.html\" %}{% block content %}custom missing{% endblock content %}",
        )
        .unwrap();

        let engine = ThemeEngine::new(Some(&dir)).unwrap();
        let mut ctx = tera::Context::new();
        ctx.insert("site", &serde_json::json!({ "title": "Hope" }));
        ctx.insert("seo", &serde_json::json!({ "title": "Not found" }));
        ctx.insert("preview", &false);
        let html = engine.render_template("not_found.html", &ctx).unwrap();
        assert!(html.contains("custom missing"));
        // Built-ins remain available
        assert!(engine.has_template("modules/hero.html"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn format_date_from_rfc3339() {
        let out = render_filter("{{ d | format_date }}", "d", "2025-03-04T10:00:00Z");
        assert_eq!(out, "March 4, 2025");
    }

    #[test]
    fn format_date_from_timestamp() {
        let out = render_filter("{{ d | format_date }}", "d", 1739577600_i64);
        assert_eq!(out, "February 15, 2025");
    }

    #[test]
    fn format_date_with_garbage_is_empty() {
        assert_eq!(render_filter("{{ d | format_date }}", "d", "soon"), "");
    }

    #[test]
    fn stars_rounds_and_clamps() {
        assert_eq!(render_filter("{{ r | stars }}", "r", 4.6), "★★★★★");
        assert_eq!(render_filter("{{ r | stars }}", "r", 3.2), "★★★☆☆");
        assert_eq!(render_filter("{{ r | stars }}", "r", 9), "★★★★★");
        assert_eq!(render_filter("{{ r | stars }}", "r", -1), "☆☆☆☆☆");
    }
}
