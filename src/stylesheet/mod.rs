//! Stylesheet rewriting
//!
//! Turns a stylesheet that references the source server into one that only
//! references localized files. `@import`s on the source origin are inlined
//! depth-first and `url()` references are localized as fonts or images.
//! Everything else (other origins, `data:` URIs, same-document fragments)
//! passes through untouched.
//!
//! Each stylesheet unit is handled in a single pass over its own token list,
//! so relative references always resolve against the URL of the file they
//! were written in, even after an import has been spliced into its parent.

pub mod scanner;

use std::ops::Range;

use futures::future::{BoxFuture, join_all};
use url::Url;

use crate::asset_localizer::{AssetType, Localizer};
use crate::utils::{is_data_uri, is_same_origin, path_extension, resolve_url};

pub use scanner::{CssReference, scan, splice};

/// Rewrite `css` so that every origin-bound reference points at a local file
///
/// `base` is the URL the CSS text was loaded from (the page URL for inline
/// styles). It also counts as the root of the import chain, so a sheet that
/// imports itself has that import dropped.
pub async fn rewrite_stylesheet(localizer: &Localizer, css: &str, base: &Url) -> String {
    let base = without_fragment(base);
    let chain = ImportChain::inline_root(base.clone());
    rewrite_unit(localizer, css.to_string(), base, chain).await
}

/// Localize the stylesheet at `url` and return the path pages should link to
///
/// The stylesheet is fetched as text, rewritten with its own URL as base and
/// stored under `styles/`. An already stored stylesheet is reused without a
/// network call. On fetch failure the absolute URL is returned.
pub async fn localize_stylesheet(localizer: &Localizer, url: &Url) -> String {
    let url = without_fragment(url);
    let chain = ImportChain::stored_root(url.clone());
    localize_stylesheet_with(localizer, url, chain).await
}

fn localize_stylesheet_with(
    localizer: &Localizer,
    url: Url,
    chain: ImportChain,
) -> BoxFuture<'_, String> {
    Box::pin(async move {
        let path = localizer.asset_path(&url, AssetType::Stylesheet);
        if localizer.is_cached(&url, AssetType::Stylesheet).await {
            log::debug!("Stylesheet {url} already localized at {}", path.public_path);
            return path.public_path;
        }

        let text = match localizer.fetch_text(&url, AssetType::Stylesheet).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Keeping remote stylesheet {url}: {e}");
                return url.to_string();
            }
        };

        let rewritten = rewrite_unit(localizer, text, url.clone(), chain).await;
        match localizer.store(&url, &path, rewritten.into_bytes()).await {
            Ok(()) => {
                log::debug!("Localized stylesheet {url} -> {}", path.public_path);
                path.public_path
            }
            Err(e) => {
                log::warn!("Keeping remote stylesheet {url}: {e}");
                url.to_string()
            }
        }
    })
}

/// Rewrite one unit; `chain` is the import chain ending with `base`
fn rewrite_unit(
    localizer: &Localizer,
    css: String,
    base: Url,
    chain: ImportChain,
) -> BoxFuture<'_, String> {
    Box::pin(async move {
        let references = scanner::scan(&css);
        if references.is_empty() {
            return css;
        }

        let origin = localizer.config().source_origin_url();
        let replacements = join_all(
            references
                .into_iter()
                .map(|reference| rewrite_reference(localizer, reference, &base, &origin, &chain)),
        )
        .await;

        scanner::splice(&css, replacements.into_iter().flatten().collect())
    })
}

/// Compute the replacement for one reference, or `None` to leave it as is
async fn rewrite_reference(
    localizer: &Localizer,
    reference: CssReference,
    base: &Url,
    origin: &Url,
    chain: &ImportChain,
) -> Option<(Range<usize>, String)> {
    match reference {
        CssReference::Url { span, value } => {
            let url = origin_bound(&value, base, origin)?;
            let asset_type = AssetType::from_css_reference(&path_extension(&url));
            let local = localizer.localize(&url, asset_type).await;
            Some((span, css_url(&local)))
        }
        CssReference::Import {
            span,
            target,
            conditions,
        } => {
            let url = without_fragment(&origin_bound(&target, base, origin)?);

            if has_cascade_conditions(&conditions) {
                // layer()/supports() cannot be expressed by wrapping, so the
                // import stays and only its target moves
                if chain.is_stored(&url) {
                    // The ancestor is being stored under its fixed name; the
                    // browser resolves the cycle between the two files
                    let local = localizer.asset_path(&url, AssetType::Stylesheet).public_path;
                    return Some((span, import_rule(&local, &conditions)));
                }
                if chain.contains(&url) {
                    log::debug!("Dropping cyclic @import of {url} in {base}");
                    return Some((span, String::new()));
                }
                let local = localize_stylesheet_with(localizer, url.clone(), chain.push_stored(url)).await;
                return Some((span, import_rule(&local, &conditions)));
            }

            if chain.contains(&url) {
                log::debug!("Dropping cyclic @import of {url} in {base}");
                return Some((span, String::new()));
            }

            let fetched = localizer.fetch_text(&url, AssetType::Stylesheet).await;
            match fetched {
                Ok(text) => {
                    let inner = rewrite_unit(localizer, text, url.clone(), chain.push_spliced(url)).await;
                    let inner = strip_charset(&inner);
                    let spliced = if conditions.is_empty() {
                        inner.to_string()
                    } else {
                        format!("@media {conditions} {{\n{inner}\n}}")
                    };
                    Some((span, spliced))
                }
                Err(e) => {
                    log::warn!("Failed to inline @import {url}: {e}");
                    Some((span, import_rule(url.as_str(), &conditions)))
                }
            }
        }
    }
}

/// Resolve `value` and keep it only if it should be localized
///
/// Empty values, same-document fragments, `data:` URIs and URLs on other
/// origins yield `None`.
pub fn origin_bound(value: &str, base: &Url, origin: &Url) -> Option<Url> {
    let value = value.trim();
    if value.is_empty() || value.starts_with('#') || is_data_uri(value) {
        return None;
    }

    match resolve_url(base, value) {
        Ok(url) if is_same_origin(&url, origin) => Some(url),
        Ok(_) => None,
        Err(e) => {
            log::debug!("Skipping unresolvable CSS reference: {e}");
            None
        }
    }
}

/// True when the import carries `layer` or `supports()` conditions
fn has_cascade_conditions(conditions: &str) -> bool {
    let lower = conditions.trim_start().to_ascii_lowercase();
    let after_layer = lower.strip_prefix("layer");
    after_layer.is_some_and(|rest| {
        rest.is_empty() || rest.starts_with('(') || rest.starts_with(char::is_whitespace)
    }) || lower.starts_with("supports(")
}

/// Drop the byte-order mark and a leading `@charset` before splicing; both
/// are only valid at the start of a file
fn strip_charset(css: &str) -> &str {
    let css = css.trim_start_matches('\u{feff}');
    let trimmed = css.trim_start();
    if trimmed
        .get(..8)
        .is_some_and(|head| head.eq_ignore_ascii_case("@charset"))
        && let Some(end) = trimmed.find(';')
    {
        return trimmed[end + 1..].trim_start();
    }
    css
}

/// Stylesheets currently being rewritten, outermost first, each flagged with
/// whether it ends up as its own stored file
#[derive(Debug, Clone)]
struct ImportChain {
    units: Vec<(Url, bool)>,
}

impl ImportChain {
    /// Chain rooted at caller-supplied text that is never stored
    fn inline_root(base: Url) -> Self {
        Self {
            units: vec![(base, false)],
        }
    }

    fn stored_root(url: Url) -> Self {
        Self {
            units: vec![(url, true)],
        }
    }

    fn contains(&self, url: &Url) -> bool {
        self.units.iter().any(|(u, _)| u == url)
    }

    fn is_stored(&self, url: &Url) -> bool {
        self.units.iter().any(|(u, stored)| *stored && u == url)
    }

    /// Extend with a unit that is stored as its own file
    fn push_stored(&self, url: Url) -> Self {
        self.extended(url, true)
    }

    /// Extend with a unit whose text is spliced into its parent
    fn push_spliced(&self, url: Url) -> Self {
        self.extended(url, false)
    }

    fn extended(&self, url: Url, stored: bool) -> Self {
        let mut next = self.clone();
        next.units.push((url, stored));
        next
    }
}

fn import_rule(target: &str, conditions: &str) -> String {
    if conditions.is_empty() {
        format!("@import {};", css_url(target))
    } else {
        format!("@import {} {conditions};", css_url(target))
    }
}

fn css_url(target: &str) -> String {
    let escaped = target.replace('\\', "\\\\").replace('"', "\\\"");
    format!("url(\"{escaped}\")")
}

fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}
