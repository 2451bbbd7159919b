//! Page-level failures

use thiserror::Error;

use crate::render_driver::RenderError;

/// Why a page could not be baked
///
/// Asset problems never show up here; they degrade to the original URL while
/// the page is rewritten.
#[derive(Debug, Error)]
pub enum BakeError {
    /// The page entry's render URL does not parse
    #[error("Invalid render URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// The render driver failed
    #[error("Failed to render {url}: {source}")]
    Render {
        url: String,
        #[source]
        source: RenderError,
    },

    /// The rewritten tree could not be serialized
    #[error("Failed to serialize {url}: {source}")]
    Serialize {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// The baked page could not be written
    #[error("Failed to write output for {friendly_path}: {message}")]
    Output {
        friendly_path: String,
        message: String,
    },

    /// The page task panicked or was cancelled
    #[error("Page task for {friendly_path} aborted: {message}")]
    Aborted {
        friendly_path: String,
        message: String,
    },
}

impl BakeError {
    /// True when the failure came from the render driver
    #[must_use]
    pub fn is_render_failure(&self) -> bool {
        matches!(self, BakeError::Render { .. })
    }
}
