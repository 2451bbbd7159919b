//! Builder methods available for all states
//!
//! Optional settings can be applied before or after the required fields.

use std::path::PathBuf;

use super::builder::BakeConfigBuilder;

impl<State> BakeConfigBuilder<State> {
    /// Prefix stripped from link paths before friendly-path lookup
    #[must_use]
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = Some(prefix.into());
        self
    }

    /// `Authorization` header value for the page render and every asset request
    ///
    /// Pass the full header value, e.g. `Bearer <token>` or `Basic <b64>`.
    #[must_use]
    pub fn auth_header(mut self, value: impl Into<String>) -> Self {
        self.auth_header = Some(value.into());
        self
    }

    #[must_use]
    pub fn static_route_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.static_route_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn public_assets_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.public_assets_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the per-request timeout for asset downloads
    ///
    /// A download that exceeds it degrades to the original remote URL; it never
    /// fails the page.
    #[must_use]
    pub fn asset_timeout_secs(mut self, secs: u64) -> Self {
        self.asset_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn max_stylesheet_size(mut self, bytes: usize) -> Self {
        self.max_stylesheet_size = bytes;
        self
    }

    #[must_use]
    pub fn max_script_size(mut self, bytes: usize) -> Self {
        self.max_script_size = bytes;
        self
    }

    #[must_use]
    pub fn max_binary_size(mut self, bytes: usize) -> Self {
        self.max_binary_size = bytes;
        self
    }

    /// Set how many pages are rendered and rewritten at the same time
    ///
    /// Must be at least 1; `build()` rejects 0.
    #[must_use]
    pub fn max_concurrent_pages(mut self, pages: usize) -> Self {
        self.max_concurrent_pages = pages;
        self
    }

    #[must_use]
    pub fn page_load_timeout_secs(mut self, secs: u64) -> Self {
        self.page_load_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.navigation_timeout_secs = secs;
        self
    }

    /// Quiet period after navigation before the rendered DOM is captured
    #[must_use]
    pub fn settle_millis(mut self, millis: u64) -> Self {
        self.settle_millis = millis;
        self
    }

    /// Set browser headless mode
    ///
    /// Headed mode shows a visible browser window; useful when debugging what
    /// the renderer actually captured.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Use a dedicated Chrome profile directory
    ///
    /// Concurrent runs sharing one profile contend on Chrome's profile lock.
    #[must_use]
    pub fn chrome_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chrome_data_dir = Some(dir.into());
        self
    }
}
