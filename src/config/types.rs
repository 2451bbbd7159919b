//! Core configuration type for a bake run
//!
//! `BakeConfig` carries everything the rewrite pipeline and the render driver
//! need for one build run. It is immutable once built; share it behind an
//! `Arc` (see `BakeContext`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration struct for a bake run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BakeConfig {
    /// Root of the build output. Assets land in `<output_dir>/assets/<type>/`.
    ///
    /// **INVARIANT:** Always an absolute path (normalized in builder).
    pub(crate) output_dir: PathBuf,

    /// Origin the pages are mirrored from, in origin form (`scheme://host[:port]`).
    ///
    /// **INVARIANT:** Parses as an http(s) URL with a host (validated in builder).
    pub(crate) source_origin: String,

    /// Prefix stripped from link paths before matching the friendly path index
    /// (e.g. a locale segment such as `/en`).
    pub(crate) path_prefix: Option<String>,

    /// Value of the `Authorization` header applied to the rendered page, all of
    /// its sub-requests, and every asset download.
    #[serde(skip_serializing)]
    pub(crate) auth_header: Option<String>,

    /// Namespace prefix of rewritten internal links. Default: `/pages`
    pub(crate) static_route_prefix: String,

    /// Public URL prefix of localized assets. Default: `/assets`
    pub(crate) public_assets_prefix: String,

    /// User-Agent sent with asset downloads and by the browser
    pub(crate) user_agent: String,

    /// Per-request asset download timeout in seconds. Default: 30
    pub(crate) asset_timeout_secs: u64,

    /// Maximum stylesheet size in bytes
    pub(crate) max_stylesheet_size: usize,

    /// Maximum script size in bytes
    pub(crate) max_script_size: usize,

    /// Maximum image/font size in bytes
    pub(crate) max_binary_size: usize,

    /// Maximum number of pages baked concurrently. Default: 4
    pub(crate) max_concurrent_pages: usize,

    /// Timeout in seconds for `page.goto()`. Default: 30
    pub(crate) page_load_timeout_secs: u64,

    /// Timeout in seconds for `page.wait_for_navigation()`. Default: 30
    pub(crate) navigation_timeout_secs: u64,

    /// Quiet period after navigation before the DOM is captured. Default: 1500ms
    pub(crate) settle_millis: u64,

    /// Run the browser headless. Default: true
    pub(crate) headless: bool,

    /// Custom Chrome user data directory (isolates concurrent runs)
    pub(crate) chrome_data_dir: Option<PathBuf>,
}
