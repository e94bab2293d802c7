//! Ministry website
//!
//! Server-rendered pages assembled from CMS-authored modules: content
//! queries, module rendering, a revalidating content cache, and the page,
//! preview, and health routes.

pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod modules;
pub mod preview;
pub mod routes;
pub mod session;
pub mod state;
pub mod theme;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
