//! Type-safe builder for `BakeConfig` using the typestate pattern
//!
//! `build()` only exists once both required fields (output directory and
//! source origin) have been provided, so a half-configured run cannot be
//! constructed.

use crate::utils::{
    CHROME_USER_AGENT, DEFAULT_ASSET_TIMEOUT_SECS, DEFAULT_MAX_BINARY_SIZE,
    DEFAULT_MAX_CONCURRENT_PAGES, DEFAULT_MAX_SCRIPT_SIZE, DEFAULT_MAX_STYLESHEET_SIZE,
    DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
    DEFAULT_PUBLIC_ASSETS_PREFIX, DEFAULT_SETTLE_MILLIS, DEFAULT_STATIC_ROUTE_PREFIX,
};
use anyhow::{Context, Result, anyhow};
use std::marker::PhantomData;
use std::path::PathBuf;
use url::Url;

use super::types::BakeConfig;

// Type states for the builder
pub struct WithOutputDir;
pub struct WithSourceOrigin;

pub struct BakeConfigBuilder<State = ()> {
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) source_origin: Option<String>,
    pub(crate) path_prefix: Option<String>,
    pub(crate) auth_header: Option<String>,
    pub(crate) static_route_prefix: String,
    pub(crate) public_assets_prefix: String,
    pub(crate) user_agent: String,
    pub(crate) asset_timeout_secs: u64,
    pub(crate) max_stylesheet_size: usize,
    pub(crate) max_script_size: usize,
    pub(crate) max_binary_size: usize,
    pub(crate) max_concurrent_pages: usize,
    pub(crate) page_load_timeout_secs: u64,
    pub(crate) navigation_timeout_secs: u64,
    pub(crate) settle_millis: u64,
    pub(crate) headless: bool,
    pub(crate) chrome_data_dir: Option<PathBuf>,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for BakeConfigBuilder<()> {
    fn default() -> Self {
        Self {
            output_dir: None,
            source_origin: None,
            path_prefix: None,
            auth_header: None,
            static_route_prefix: DEFAULT_STATIC_ROUTE_PREFIX.to_string(),
            public_assets_prefix: DEFAULT_PUBLIC_ASSETS_PREFIX.to_string(),
            user_agent: CHROME_USER_AGENT.to_string(),
            asset_timeout_secs: DEFAULT_ASSET_TIMEOUT_SECS,
            max_stylesheet_size: DEFAULT_MAX_STYLESHEET_SIZE,
            max_script_size: DEFAULT_MAX_SCRIPT_SIZE,
            max_binary_size: DEFAULT_MAX_BINARY_SIZE,
            max_concurrent_pages: DEFAULT_MAX_CONCURRENT_PAGES,
            page_load_timeout_secs: DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            settle_millis: DEFAULT_SETTLE_MILLIS,
            headless: true,
            chrome_data_dir: None,
            _phantom: PhantomData,
        }
    }
}

impl BakeConfig {
    /// Create a builder for configuring a `BakeConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> BakeConfigBuilder<()> {
        BakeConfigBuilder::default()
    }
}

impl<State> BakeConfigBuilder<State> {
    /// Move every field into a builder of another state
    fn transition<Next>(self) -> BakeConfigBuilder<Next> {
        BakeConfigBuilder {
            output_dir: self.output_dir,
            source_origin: self.source_origin,
            path_prefix: self.path_prefix,
            auth_header: self.auth_header,
            static_route_prefix: self.static_route_prefix,
            public_assets_prefix: self.public_assets_prefix,
            user_agent: self.user_agent,
            asset_timeout_secs: self.asset_timeout_secs,
            max_stylesheet_size: self.max_stylesheet_size,
            max_script_size: self.max_script_size,
            max_binary_size: self.max_binary_size,
            max_concurrent_pages: self.max_concurrent_pages,
            page_load_timeout_secs: self.page_load_timeout_secs,
            navigation_timeout_secs: self.navigation_timeout_secs,
            settle_millis: self.settle_millis,
            headless: self.headless,
            chrome_data_dir: self.chrome_data_dir,
            _phantom: PhantomData,
        }
    }
}

impl BakeConfigBuilder<()> {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> BakeConfigBuilder<WithOutputDir> {
        self.output_dir = Some(dir.into());
        self.transition()
    }
}

impl BakeConfigBuilder<WithOutputDir> {
    pub fn source_origin(
        mut self,
        origin: impl Into<String>,
    ) -> BakeConfigBuilder<WithSourceOrigin> {
        let origin = origin.into();

        // Normalize: add https:// if no scheme is present
        let normalized = if origin.starts_with("http://") || origin.starts_with("https://") {
            origin
        } else {
            format!("https://{origin}")
        };

        self.source_origin = Some(normalized);
        self.transition()
    }
}

// Build method only available when all required fields are set
impl BakeConfigBuilder<WithSourceOrigin> {
    pub fn build(self) -> Result<BakeConfig> {
        let raw_origin = self
            .source_origin
            .ok_or_else(|| anyhow!("source origin is required"))?;
        let parsed = Url::parse(&raw_origin)
            .with_context(|| format!("Invalid source origin '{raw_origin}'"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!("Source origin '{raw_origin}' must be http or https"));
        }
        if parsed.host_str().is_none() {
            return Err(anyhow!("Source origin '{raw_origin}' has no host"));
        }
        // Origin form drops any path, query or fragment the caller passed
        let source_origin = parsed.origin().ascii_serialization();

        let output_dir = self
            .output_dir
            .ok_or_else(|| anyhow!("output directory is required"))?;
        let output_dir = if output_dir.is_absolute() {
            output_dir
        } else {
            std::env::current_dir()
                .context("Failed to resolve current directory for output_dir")?
                .join(output_dir)
        };

        if self.max_concurrent_pages == 0 {
            return Err(anyhow!("max_concurrent_pages must be at least 1"));
        }

        let path_prefix = self
            .path_prefix
            .map(|p| normalize_prefix(&p))
            .filter(|p| !p.is_empty());

        Ok(BakeConfig {
            output_dir,
            source_origin,
            path_prefix,
            auth_header: self.auth_header,
            static_route_prefix: normalize_prefix(&self.static_route_prefix),
            public_assets_prefix: normalize_prefix(&self.public_assets_prefix),
            user_agent: self.user_agent,
            asset_timeout_secs: self.asset_timeout_secs,
            max_stylesheet_size: self.max_stylesheet_size,
            max_script_size: self.max_script_size,
            max_binary_size: self.max_binary_size,
            max_concurrent_pages: self.max_concurrent_pages,
            page_load_timeout_secs: self.page_load_timeout_secs,
            navigation_timeout_secs: self.navigation_timeout_secs,
            settle_millis: self.settle_millis,
            headless: self.headless,
            chrome_data_dir: self.chrome_data_dir,
        })
    }
}

/// `en/` becomes `/en`; `/` becomes the empty prefix
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
