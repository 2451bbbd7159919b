//! URL helpers shared by the rewrite passes.

use anyhow::{Context, Result};
use url::Url;

/// Resolve a potentially relative URL against a base URL
///
/// The query is kept as written apart from the percent-encoding `Url::join`
/// applies, so the resolved URL is the one that gets fetched, hashed and
/// handed back on failure.
pub fn resolve_url(base: &Url, reference: &str) -> Result<Url> {
    base.join(reference.trim())
        .with_context(|| format!("Failed to resolve '{reference}' against {base}"))
}

/// True when `url` shares scheme, host and port with `origin`
#[must_use]
pub fn is_same_origin(url: &Url, origin: &Url) -> bool {
    url.origin() == origin.origin()
}

/// True when `url` points at the same host as `origin`, ignoring scheme and port
#[must_use]
pub fn is_same_host(url: &Url, origin: &Url) -> bool {
    match (url.host_str(), origin.host_str()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// True for `data:` URIs, which are already self-contained
#[must_use]
pub fn is_data_uri(value: &str) -> bool {
    value
        .trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Extension of the last path segment, including the leading dot
///
/// Query and fragment are ignored. Returns an empty string when the segment
/// has no extension, so the result can be appended unconditionally.
#[must_use]
pub fn path_extension(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    match segment.rfind('.') {
        Some(idx) if idx + 1 < segment.len() && idx > 0 => {
            let ext = &segment[idx + 1..];
            if ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                format!(".{}", ext.to_ascii_lowercase())
            } else {
                String::new()
            }
        }
        _ => String::new(),
    }
}
