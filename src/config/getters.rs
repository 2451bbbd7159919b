//! Getter methods for `BakeConfig`

use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use super::types::BakeConfig;

impl BakeConfig {
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Source origin in origin form, e.g. `http://src.test`
    #[must_use]
    pub fn source_origin(&self) -> &str {
        &self.source_origin
    }

    /// Source origin as a parsed URL
    ///
    /// # Panics
    ///
    /// Never in practice: the builder only accepts origins that parse.
    #[must_use]
    pub fn source_origin_url(&self) -> Url {
        Url::parse(&self.source_origin).expect("BUG: source_origin validated in builder")
    }

    #[must_use]
    pub fn path_prefix(&self) -> Option<&str> {
        self.path_prefix.as_deref()
    }

    #[must_use]
    pub fn auth_header(&self) -> Option<&str> {
        self.auth_header.as_deref()
    }

    #[must_use]
    pub fn static_route_prefix(&self) -> &str {
        &self.static_route_prefix
    }

    #[must_use]
    pub fn public_assets_prefix(&self) -> &str {
        &self.public_assets_prefix
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn asset_timeout(&self) -> Duration {
        Duration::from_secs(self.asset_timeout_secs)
    }

    #[must_use]
    pub fn max_stylesheet_size(&self) -> usize {
        self.max_stylesheet_size
    }

    #[must_use]
    pub fn max_script_size(&self) -> usize {
        self.max_script_size
    }

    #[must_use]
    pub fn max_binary_size(&self) -> usize {
        self.max_binary_size
    }

    #[must_use]
    pub fn max_concurrent_pages(&self) -> usize {
        self.max_concurrent_pages
    }

    #[must_use]
    pub fn page_load_timeout_secs(&self) -> u64 {
        self.page_load_timeout_secs
    }

    #[must_use]
    pub fn navigation_timeout_secs(&self) -> u64 {
        self.navigation_timeout_secs
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&PathBuf> {
        self.chrome_data_dir.as_ref()
    }
}
