//! Page rendering
//!
//! The bake only needs three things from a browser: the final HTML, and the
//! stylesheets and scripts the page pulled from the source origin while it
//! loaded. [`RenderDriver`] is that contract; [`ChromiumRenderDriver`] is the
//! headless Chromium implementation.

pub mod browser;
pub mod chromium;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use chromium::ChromiumRenderDriver;

/// What to render
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub url: &'a Url,
    pub source_origin: &'a Url,
}

/// Result of rendering one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPage {
    /// HTML after client-side execution settled
    pub html: String,
    /// Stylesheet URLs requested from the source origin, first-seen order
    pub stylesheets: Vec<String>,
    /// Script URLs requested from the source origin, first-seen order
    pub scripts: Vec<String>,
}

/// Rendering failure; fatal for the page being rendered
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Browser unavailable: {0}")]
    Browser(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("{operation} timed out after {secs}s for {url}")]
    Timeout {
        url: String,
        operation: &'static str,
        secs: u64,
    },

    #[error("Failed to read content of {url}: {message}")]
    Content { url: String, message: String },
}

/// Something that can render a page and report what it loaded
pub trait RenderDriver: Send + Sync {
    fn render<'a>(
        &'a self,
        request: RenderRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<RenderedPage, RenderError>> + Send + 'a>>;
}
