//! Content-addressed asset cache on disk
//!
//! An asset's file name is `sha256(source URL)` plus an extension, so the
//! same URL always lands on the same file. Existence of that file is the
//! "already localized" signal, both within a run and across runs sharing an
//! output directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use url::Url;

use super::types::{AssetPath, AssetType};
use crate::utils::path_extension;

/// Hex-encoded SHA-256 of the URL string
#[must_use]
pub fn url_hash(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// Derive the local file name for `url`
#[must_use]
pub fn file_name_for(url: &Url, asset_type: AssetType) -> String {
    let extension = asset_type
        .fixed_extension()
        .map_or_else(|| path_extension(url), str::to_string);
    format!("{}{extension}", url_hash(url.as_str()))
}

/// Derive both the on-disk and the public path for `url`
#[must_use]
pub fn asset_path_for(
    url: &Url,
    asset_type: AssetType,
    output_dir: &Path,
    public_prefix: &str,
) -> AssetPath {
    let file_name = file_name_for(url, asset_type);
    let fs_path = assets_root(output_dir)
        .join(asset_type.dir_name())
        .join(&file_name);
    let public_path = format!("{public_prefix}/{}/{file_name}", asset_type.dir_name());
    AssetPath {
        fs_path,
        public_path,
    }
}

/// `<output_dir>/assets`
#[must_use]
pub fn assets_root(output_dir: &Path) -> PathBuf {
    output_dir.join("assets")
}

/// True when the asset file already exists
pub async fn is_cached(path: &AssetPath) -> bool {
    tokio::fs::try_exists(&path.fs_path).await.unwrap_or(false)
}

/// Write `bytes` to the asset path
///
/// The data goes to a temporary file in the destination directory which is
/// then renamed over the target. A reader never observes a partial file, and
/// two racing writers of the same URL leave identical content behind.
pub async fn store(path: &AssetPath, bytes: Vec<u8>) -> Result<()> {
    let target = path.fs_path.clone();

    tokio::task::spawn_blocking(move || -> Result<()> {
        use std::io::Write;

        let dir = target
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Asset path has no parent directory"))?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create asset directory {}", dir.display()))?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)
            .context("Failed to create temporary asset file")?;
        temp.write_all(&bytes)
            .context("Failed to write temporary asset file")?;
        temp.persist(&target)
            .map_err(|e| anyhow::anyhow!("Failed to persist {}: {}", target.display(), e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| anyhow::anyhow!("Spawn blocking join error: {e}"))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_path_uses_url_extension() {
        let url = Url::parse("http://src.test/image.png").unwrap();
        let path = asset_path_for(&url, AssetType::Image, Path::new("/out"), "/assets");
        let hash = url_hash("http://src.test/image.png");

        assert_eq!(path.public_path, format!("/assets/images/{hash}.png"));
        assert_eq!(
            path.fs_path,
            PathBuf::from(format!("/out/assets/images/{hash}.png"))
        );
    }

    #[test]
    fn file_name_is_sha256_of_the_url() {
        let url = Url::parse("http://src.test/image.png").unwrap();
        let path = asset_path_for(&url, AssetType::Image, Path::new("/out"), "/assets");
        assert_eq!(
            path.public_path,
            "/assets/images/4ad4cf386a83d38ca695268f8b29c00bebda6eb8de7591246527efda261c0a9f.png"
        );
    }

    #[test]
    fn text_types_use_fixed_extension() {
        let url = Url::parse("http://src.test/bundle?v=3").unwrap();
        let css = file_name_for(&url, AssetType::Stylesheet);
        let js = file_name_for(&url, AssetType::Script);
        assert!(css.ends_with(".css"));
        assert!(js.ends_with(".js"));
    }

    #[test]
    fn hash_is_lowercase_hex_sha256() {
        let hash = url_hash("http://src.test/image.png");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn store_creates_directories_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse("http://src.test/fonts/a.woff2").unwrap();
        let path = asset_path_for(&url, AssetType::Font, dir.path(), "/assets");

        assert!(!is_cached(&path).await);
        store(&path, b"font-bytes".to_vec()).await.unwrap();
        assert!(is_cached(&path).await);
        assert_eq!(std::fs::read(&path.fs_path).unwrap(), b"font-bytes");
    }
}
