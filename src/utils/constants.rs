//! Shared configuration constants for pagebake
//!
//! Default values used by the config builder and the download layer, kept in
//! one place to avoid magic numbers.

/// Public URL namespace under which localized assets are served
pub const DEFAULT_PUBLIC_ASSETS_PREFIX: &str = "/assets";

/// Static route namespace that internal links are re-pointed at
pub const DEFAULT_STATIC_ROUTE_PREFIX: &str = "/pages";

/// Default number of pages rendered and rewritten at the same time
///
/// Each page holds a browser tab open while it renders, so this is kept
/// low. The asset fan-out inside a page is not bounded by it.
pub const DEFAULT_MAX_CONCURRENT_PAGES: usize = 4;

/// Per-request timeout for asset downloads, in seconds
pub const DEFAULT_ASSET_TIMEOUT_SECS: u64 = 30;

/// Timeout for `page.goto()`, in seconds
pub const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 30;

/// Timeout for `page.wait_for_navigation()`, in seconds
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 30;

/// Quiet period after navigation before the DOM is captured, in milliseconds
///
/// Gives client-side code time to finish late requests (lazy images,
/// code-split bundles) so they show up in the observed resource sets.
pub const DEFAULT_SETTLE_MILLIS: u64 = 1_500;

/// Maximum size for stylesheet downloads (bytes)
pub const DEFAULT_MAX_STYLESHEET_SIZE: usize = 2 * 1024 * 1024;

/// Maximum size for script downloads (bytes)
pub const DEFAULT_MAX_SCRIPT_SIZE: usize = 10 * 1024 * 1024;

/// Maximum size for image and font downloads (bytes)
pub const DEFAULT_MAX_BINARY_SIZE: usize = 25 * 1024 * 1024;

/// Chrome user agent string sent with asset downloads and by the browser
///
/// Keep in step with the Chromium revision the fetcher downloads so the
/// source server sees one consistent client.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
