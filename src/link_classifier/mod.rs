//! Anchor classification
//!
//! Links to pages that are part of the bake are pointed at their static
//! route; links to other pages of the source site become absolute URLs on the
//! source origin; everything else is left as written.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::BakeConfig;
use crate::utils::{is_same_host, resolve_url};

/// One page of the bake: where it lives in the static site and where the
/// source server renders it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub friendly_path: String,
    pub render_url: String,
}

impl PageEntry {
    pub fn new(friendly_path: impl Into<String>, render_url: impl Into<String>) -> Self {
        Self {
            friendly_path: friendly_path.into(),
            render_url: render_url.into(),
        }
    }
}

/// Set of internal paths that have a static route
#[derive(Debug, Clone, Default)]
pub struct FriendlyPathIndex {
    paths: HashSet<String>,
}

impl FriendlyPathIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_entries(entries: &[PageEntry]) -> Self {
        entries.iter().map(|e| e.friendly_path.as_str()).collect()
    }

    pub fn insert(&mut self, path: &str) {
        self.paths.insert(normalize_path(path));
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(&normalize_path(path))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for FriendlyPathIndex {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut index = Self::new();
        for path in iter {
            index.insert(path);
        }
        index
    }
}

/// Leading `/`, no trailing `/` except for the root
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Rewrites anchor hrefs for one bake run
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    origin: Url,
    path_prefix: Option<String>,
    static_route_prefix: String,
    index: Arc<FriendlyPathIndex>,
}

impl LinkClassifier {
    #[must_use]
    pub fn new(config: &BakeConfig, index: Arc<FriendlyPathIndex>) -> Self {
        Self {
            origin: config.source_origin_url(),
            path_prefix: config.path_prefix().map(str::to_string),
            static_route_prefix: config.static_route_prefix().to_string(),
            index,
        }
    }

    /// Rewrite `href` found on the page at `base`
    ///
    /// - other hosts, fragment-only and non-http hrefs: unchanged
    /// - indexed paths: static route, fragment kept
    /// - any other path on the source host: absolute source URL
    #[must_use]
    pub fn classify(&self, href: &str, base: &Url) -> String {
        let trimmed = href.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return href.to_string();
        }

        let resolved = match resolve_url(base, trimmed) {
            Ok(url) => url,
            Err(e) => {
                log::debug!("Leaving unresolvable href as is: {e}");
                return href.to_string();
            }
        };

        if !matches!(resolved.scheme(), "http" | "https") {
            return href.to_string();
        }
        if !is_same_host(&resolved, &self.origin) {
            return href.to_string();
        }

        let path = resolved.path();
        let stripped = self
            .path_prefix
            .as_deref()
            .and_then(|prefix| strip_path_prefix(path, prefix));

        let matched = stripped
            .filter(|candidate| self.index.contains(candidate))
            .or_else(|| self.index.contains(path).then(|| path.to_string()));

        match matched {
            Some(friendly) => {
                let mut route = format!("{}{}", self.static_route_prefix, normalize_path(&friendly));
                if let Some(fragment) = resolved.fragment() {
                    route.push('#');
                    route.push_str(fragment);
                }
                route
            }
            None => resolved.to_string(),
        }
    }
}

/// Strip `prefix` from `path` on a segment boundary
fn strip_path_prefix(path: &str, prefix: &str) -> Option<String> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/".to_string())
    } else if rest.starts_with('/') {
        Some(rest.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_path("about/"), "/about");
        assert_eq!(normalize_path("/about"), "/about");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn strips_prefix_on_segment_boundary() {
        assert_eq!(strip_path_prefix("/en/about", "/en").as_deref(), Some("/about"));
        assert_eq!(strip_path_prefix("/en", "/en").as_deref(), Some("/"));
        assert_eq!(strip_path_prefix("/english", "/en"), None);
        assert_eq!(strip_path_prefix("/about", "/en"), None);
    }

    #[test]
    fn index_lookup_ignores_trailing_slash() {
        let index = FriendlyPathIndex::from_entries(&[PageEntry::new("/about/", "http://src.test/about")]);
        assert!(index.contains("/about"));
        assert!(index.contains("about/"));
        assert!(!index.contains("/random"));
    }
}
