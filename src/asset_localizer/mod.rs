//! Asset localization
//!
//! Maps a remote asset URL to a stable local path, downloading it at most once
//! per URL for as long as the output directory lives. Localization never
//! fails from the caller's point of view: a download problem is logged and the
//! original absolute URL is handed back, so the page keeps working against the
//! source server instead of pointing at a missing file.

pub mod cache;
pub mod downloaders;
pub mod types;

use std::sync::Arc;

use reqwest::Client;
use url::Url;

use crate::config::BakeConfig;

pub use cache::{asset_path_for, url_hash};
pub use types::{AssetPath, AssetType, FetchError};

/// Content-addressed download cache for one bake run
///
/// Cloning is cheap (shared client and config); clones share the on-disk
/// cache. No locking is needed: the check-then-write sequence is idempotent,
/// so racing callers for the same URL converge on the same file.
#[derive(Clone)]
pub struct Localizer {
    client: Client,
    config: Arc<BakeConfig>,
}

impl Localizer {
    /// Create a localizer with an HTTP client built from `config`
    pub fn new(config: Arc<BakeConfig>) -> anyhow::Result<Self> {
        let client = downloaders::build_client(&config)?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &BakeConfig {
        &self.config
    }

    /// Where `url` is (or would be) stored
    #[must_use]
    pub fn asset_path(&self, url: &Url, asset_type: AssetType) -> AssetPath {
        asset_path_for(
            url,
            asset_type,
            self.config.output_dir(),
            self.config.public_assets_prefix(),
        )
    }

    /// Localize `url` and return the path pages should reference
    ///
    /// Returns the public path on success or when the file already exists
    /// (no network call in that case). Returns `url` unchanged on failure.
    pub async fn localize(&self, url: &Url, asset_type: AssetType) -> String {
        match self.try_localize(url, asset_type).await {
            Ok(path) => path.public_path,
            Err(e) => {
                log::warn!("Keeping remote {asset_type} {url}: {e}");
                url.to_string()
            }
        }
    }

    /// Localize `url`, surfacing the failure instead of degrading
    pub async fn try_localize(
        &self,
        url: &Url,
        asset_type: AssetType,
    ) -> Result<AssetPath, FetchError> {
        let path = self.asset_path(url, asset_type);

        if cache::is_cached(&path).await {
            log::debug!("Cache hit for {url} -> {}", path.public_path);
            return Ok(path);
        }

        let limit = downloaders::size_limit(&self.config, asset_type);
        let bytes =
            downloaders::download_bytes(&self.client, url.as_str(), asset_type, limit).await?;
        self.store(url, &path, bytes).await?;

        log::debug!("Localized {asset_type} {url} -> {}", path.public_path);
        Ok(path)
    }

    /// Download a text asset without storing it
    ///
    /// Used for stylesheets that are rewritten before they are stored and for
    /// `@import` targets that are spliced into their parent.
    pub async fn fetch_text(&self, url: &Url, asset_type: AssetType) -> Result<String, FetchError> {
        let limit = downloaders::size_limit(&self.config, asset_type);
        downloaders::download_text(&self.client, url.as_str(), asset_type, limit).await
    }

    /// Store already-downloaded (possibly rewritten) content for `url`
    pub async fn store(&self, url: &Url, path: &AssetPath, bytes: Vec<u8>) -> Result<(), FetchError> {
        cache::store(path, bytes)
            .await
            .map_err(|e| FetchError::Store {
                url: url.to_string(),
                source: std::io::Error::other(format!("{e:#}")),
            })
    }

    /// Read a localized text asset back from disk (SVG sprites)
    pub async fn read_local_text(&self, path: &AssetPath) -> Option<String> {
        match tokio::fs::read_to_string(&path.fs_path).await {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("Failed to read back {}: {e}", path.fs_path.display());
                None
            }
        }
    }

    /// True when `url` has already been localized as `asset_type`
    pub async fn is_cached(&self, url: &Url, asset_type: AssetType) -> bool {
        cache::is_cached(&self.asset_path(url, asset_type)).await
    }
}
