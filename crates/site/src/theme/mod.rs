//! Theme engine and template rendering.
//!
//! Provides Tera-based rendering of the page chrome and module sections,
//! with built-in templates that a deployment may override per file.

mod engine;

pub use engine::ThemeEngine;
