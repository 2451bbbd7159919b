//! Application phase of the document rewrite
//!
//! Runs after every request of the plan has settled. All edits are made to
//! one freshly parsed tree; lookups go through the same helpers the
//! extraction phase used, so a reference either finds its resolution or is
//! left alone.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use kuchiki::{ElementData, NodeDataRef};
use url::Url;

use super::PageDocument;
use super::plan::style_attribute_targets;
use super::srcset::{parse_srcset, serialize_srcset};
use crate::asset_localizer::AssetType;
use crate::link_classifier::LinkClassifier;
use crate::sprite::inline_sprites;
use crate::stylesheet::{CssReference, origin_bound, scan, splice};
use crate::utils::{path_extension, resolve_url};

/// Outcome of the resolution phase
#[derive(Debug, Default)]
pub struct Resolutions {
    /// Reference path for every planned asset (local path, or the absolute
    /// source URL when localization failed)
    pub assets: HashMap<(Url, AssetType), String>,
    /// Sprite texts that could be loaded
    pub sprites: HashMap<Url, Arc<str>>,
}

pub(crate) struct ApplyContext<'a> {
    pub page_url: &'a Url,
    pub origin: &'a Url,
    pub resolutions: &'a Resolutions,
    pub classifier: &'a LinkClassifier,
    pub discovered_stylesheets: &'a HashSet<Url>,
    pub discovered_scripts: &'a HashSet<Url>,
}

pub(crate) fn apply(document: &PageDocument, cx: &ApplyContext<'_>) {
    // Style blocks go first so inlined sprite markup keeps its own <style>
    for node in document.select_all("style") {
        node.as_node().detach();
    }

    rewrite_image_sources(document, cx);
    rewrite_srcsets(document, cx);
    rewrite_style_attributes(document, cx);

    let inlined = inline_sprites(
        document.root(),
        cx.page_url,
        cx.origin,
        &cx.resolutions.sprites,
    );
    if inlined > 0 {
        log::debug!("Inlined {inlined} sprite references on {}", cx.page_url);
    }

    rewrite_anchors(document, cx);
    remove_discovered(document, "link[rel~=stylesheet][href]", "href", cx.discovered_stylesheets, cx);
    remove_discovered(document, "script[src]", "src", cx.discovered_scripts, cx);
}

fn rewrite_image_sources(document: &PageDocument, cx: &ApplyContext<'_>) {
    for img in document.select_all("img[src]") {
        let Some(src) = attr(&img, "src") else {
            continue;
        };
        if let Some(local) = lookup(cx, &src, AssetType::Image) {
            img.attributes.borrow_mut().insert("src", local.clone());
        }
    }
}

fn rewrite_srcsets(document: &PageDocument, cx: &ApplyContext<'_>) {
    for element in document.select_all("img[srcset], source[srcset]") {
        let Some(srcset) = attr(&element, "srcset") else {
            continue;
        };

        let mut candidates = parse_srcset(&srcset);
        let mut changed = false;
        for candidate in &mut candidates {
            if let Some(local) = lookup(cx, &candidate.url, AssetType::Image) {
                candidate.url.clone_from(local);
                changed = true;
            }
        }

        if changed {
            element
                .attributes
                .borrow_mut()
                .insert("srcset", serialize_srcset(&candidates));
        }
    }
}

fn rewrite_style_attributes(document: &PageDocument, cx: &ApplyContext<'_>) {
    for element in document.select_all("[style]") {
        let Some(style) = attr(&element, "style") else {
            continue;
        };
        if style_attribute_targets(&style, cx.page_url, cx.origin).is_empty() {
            continue;
        }

        // Each reference is replaced at its own span, so a URL that is a
        // prefix of another can never clobber it
        let replacements: Vec<_> = scan(&style)
            .into_iter()
            .filter_map(|reference| match reference {
                CssReference::Url { span, value } => {
                    let url = origin_bound(&value, cx.page_url, cx.origin)?;
                    let asset_type = AssetType::from_css_reference(&path_extension(&url));
                    let local = cx.resolutions.assets.get(&(url, asset_type))?;
                    Some((span, format!("url('{local}')")))
                }
                CssReference::Import { .. } => None,
            })
            .collect();

        if !replacements.is_empty() {
            element
                .attributes
                .borrow_mut()
                .insert("style", splice(&style, replacements));
        }
    }
}

fn rewrite_anchors(document: &PageDocument, cx: &ApplyContext<'_>) {
    for anchor in document.select_all("a[href]") {
        let Some(href) = attr(&anchor, "href") else {
            continue;
        };
        let rewritten = cx.classifier.classify(&href, cx.page_url);
        if rewritten != href {
            anchor.attributes.borrow_mut().insert("href", rewritten);
        }
    }
}

fn remove_discovered(
    document: &PageDocument,
    selector: &str,
    attribute: &str,
    discovered: &HashSet<Url>,
    cx: &ApplyContext<'_>,
) {
    if discovered.is_empty() {
        return;
    }

    for element in document.select_all(selector) {
        let Some(value) = attr(&element, attribute) else {
            continue;
        };
        let Ok(mut url) = resolve_url(cx.page_url, &value) else {
            continue;
        };
        url.set_fragment(None);
        if discovered.contains(&url) {
            element.as_node().detach();
        }
    }
}

fn lookup<'a>(cx: &'a ApplyContext<'_>, value: &str, asset_type: AssetType) -> Option<&'a String> {
    let url = origin_bound(value, cx.page_url, cx.origin)?;
    cx.resolutions.assets.get(&(url, asset_type))
}

fn attr(element: &NodeDataRef<ElementData>, name: &str) -> Option<String> {
    element
        .attributes
        .borrow()
        .get(name)
        .map(std::string::ToString::to_string)
}
