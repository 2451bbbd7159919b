//! HTTP download for remote assets
//!
//! One streaming download routine serves every asset type; the type only
//! changes the `Accept` header and the size limit. Authentication, user agent
//! and timeout are configured once on the shared `reqwest::Client`.

use futures::StreamExt;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};

use super::types::{AssetType, FetchError};
use crate::config::BakeConfig;

/// Build the HTTP client shared by every localization call of a run
///
/// `reqwest::Client` is reference-counted internally, so clones are cheap and
/// share the connection pool.
pub fn build_client(config: &BakeConfig) -> anyhow::Result<Client> {
    let mut headers = HeaderMap::new();
    if let Some(auth) = config.auth_header() {
        let mut value = HeaderValue::from_str(auth)
            .map_err(|e| anyhow::anyhow!("Invalid Authorization header value: {e}"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Client::builder()
        .user_agent(config.user_agent())
        .default_headers(headers)
        .timeout(config.asset_timeout())
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))
}

/// Size limit applied to one asset type
#[must_use]
pub fn size_limit(config: &BakeConfig, asset_type: AssetType) -> usize {
    match asset_type {
        AssetType::Stylesheet => config.max_stylesheet_size(),
        AssetType::Script => config.max_script_size(),
        AssetType::Image | AssetType::Font => config.max_binary_size(),
    }
}

/// Download an asset fully into memory
///
/// Rejects non-success statuses, and enforces `limit` both against the
/// announced `Content-Length` and while streaming.
pub async fn download_bytes(
    client: &Client,
    url: &str,
    asset_type: AssetType,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let response = client
        .get(url)
        .header(ACCEPT, asset_type.accept_header())
        .send()
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let expected_size = response.content_length().unwrap_or(0);
    if expected_size > limit as u64 {
        return Err(FetchError::TooLarge {
            url: url.to_string(),
            size: expected_size,
            limit,
        });
    }

    let mut buffer = if expected_size > 0 {
        Vec::with_capacity(expected_size as usize)
    } else {
        Vec::new()
    };

    // Content-Length can be absent or wrong; check again while streaming
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

        let new_total = buffer.len() + chunk.len();
        if new_total > limit {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                size: new_total as u64,
                limit,
            });
        }
        buffer.extend_from_slice(&chunk);
    }

    log::debug!("Downloaded {} ({} bytes)", url, buffer.len());
    Ok(buffer)
}

/// Download a text asset (stylesheet, script, SVG sprite)
pub async fn download_text(
    client: &Client,
    url: &str,
    asset_type: AssetType,
    limit: usize,
) -> Result<String, FetchError> {
    let bytes = download_bytes(client, url, asset_type, limit).await?;
    String::from_utf8(bytes).map_err(|_| FetchError::NotText {
        url: url.to_string(),
    })
}
