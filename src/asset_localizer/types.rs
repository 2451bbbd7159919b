//! Type definitions for asset localization

use std::path::PathBuf;

use thiserror::Error;

/// Classification of a remote asset; decides the storage directory, the
/// extension, and the download limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetType {
    Image,
    Font,
    Stylesheet,
    Script,
}

impl AssetType {
    /// Directory name under `<output_dir>/assets/` and the public prefix
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetType::Image => "images",
            AssetType::Font => "fonts",
            AssetType::Stylesheet => "styles",
            AssetType::Script => "scripts",
        }
    }

    /// Fixed extension for text types; `None` means "take it from the URL"
    #[must_use]
    pub fn fixed_extension(self) -> Option<&'static str> {
        match self {
            AssetType::Stylesheet => Some(".css"),
            AssetType::Script => Some(".js"),
            AssetType::Image | AssetType::Font => None,
        }
    }

    /// `Accept` header sent when downloading this type
    #[must_use]
    pub fn accept_header(self) -> &'static str {
        match self {
            AssetType::Image => "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8",
            AssetType::Font => "font/woff2,font/woff,application/font-woff,*/*;q=0.8",
            AssetType::Stylesheet => "text/css,*/*;q=0.1",
            AssetType::Script => "application/javascript,text/javascript,*/*;q=0.1",
        }
    }

    /// Classify a `url()` reference found in CSS by its file extension
    ///
    /// Everything that is not a known font format is treated as an image.
    #[must_use]
    pub fn from_css_reference(extension: &str) -> Self {
        match extension.trim_start_matches('.') {
            "woff" | "woff2" | "ttf" | "otf" | "eot" => AssetType::Font,
            _ => AssetType::Image,
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetType::Image => write!(f, "image"),
            AssetType::Font => write!(f, "font"),
            AssetType::Stylesheet => write!(f, "stylesheet"),
            AssetType::Script => write!(f, "script"),
        }
    }
}

/// Where a localized asset lives on disk and how pages reference it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPath {
    /// Absolute file path under the output directory
    pub fs_path: PathBuf,
    /// Public reference form, `/assets/<type>/<hash><ext>`
    pub public_path: String,
}

/// Failure to download an asset
///
/// Returned by `Localizer::try_localize`. `Localizer::localize` logs it and
/// hands back the original URL instead.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is {size} bytes, exceeding the {limit} byte limit")]
    TooLarge { url: String, size: u64, limit: usize },

    #[error("{url} is not valid UTF-8 text")]
    NotText { url: String },

    #[error("failed to store {url}: {source}")]
    Store {
        url: String,
        #[source]
        source: std::io::Error,
    },
}
