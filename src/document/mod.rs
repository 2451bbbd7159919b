//! Document rewriting
//!
//! Turns rendered HTML into a page that only references localized assets and
//! static routes. The work runs in three phases:
//!
//! 1. parse once and collect a [`RewritePlan`] (synchronous)
//! 2. resolve every request of the plan concurrently behind one barrier
//! 3. parse again, apply every edit, serialize (synchronous)
//!
//! Parsed trees never live across an `.await`, so the whole rewrite is a
//! `Send` future that can run on a spawned task.

mod apply;
pub mod plan;
pub mod srcset;

use std::collections::HashSet;

use futures::future::join_all;
use kuchiki::traits::TendrilSink;
use kuchiki::{ElementData, NodeDataRef, NodeRef};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::asset_localizer::AssetType;
use crate::bake::{BakeContext, BakeError};
use crate::render_driver::RenderedPage;
use crate::stylesheet::{localize_stylesheet, rewrite_stylesheet};
use crate::utils::resolve_url;

pub use apply::Resolutions;
pub use plan::RewritePlan;
pub use srcset::{SrcsetCandidate, parse_srcset, serialize_srcset};

/// A rewritten page, ready for the templating layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BakedPage {
    /// Inner HTML of `<body>`
    pub body_html: String,
    /// The whole rewritten document
    pub document_html: String,
    /// Rewritten `<style>` contents in document order
    pub inline_styles: Vec<String>,
    /// Reference paths of the page's stylesheets, in load order
    pub stylesheets: Vec<String>,
    /// Reference paths of the page's scripts, in load order
    pub scripts: Vec<String>,
}

/// Parsed HTML document that the rewrite mutates in place
pub struct PageDocument {
    root: NodeRef,
}

impl PageDocument {
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self {
            root: kuchiki::parse_html().one(html),
        }
    }

    #[must_use]
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// Matching elements, collected up front so callers may detach them
    #[must_use]
    pub fn select_all(&self, selector: &str) -> Vec<NodeDataRef<ElementData>> {
        match self.root.select(selector) {
            Ok(matches) => matches.collect(),
            Err(()) => {
                log::error!("Invalid selector '{selector}'");
                Vec::new()
            }
        }
    }

    /// Serialize the full document
    pub fn to_html(&self) -> std::io::Result<String> {
        serialize_node(&self.root)
    }

    /// Serialize the children of `<body>`; empty when there is no body
    pub fn body_html(&self) -> std::io::Result<String> {
        let Ok(body) = self.root.select_first("body") else {
            return Ok(String::new());
        };
        let mut out = String::new();
        for child in body.as_node().children() {
            out.push_str(&serialize_node(&child)?);
        }
        Ok(out)
    }
}

fn serialize_node(node: &NodeRef) -> std::io::Result<String> {
    let mut buffer = Vec::new();
    node.serialize(&mut buffer)?;
    String::from_utf8(buffer).map_err(std::io::Error::other)
}

/// Rewrite a rendered page
///
/// Asset problems degrade individual references and never fail the page;
/// only serializing the result can.
pub async fn rewrite_page(
    ctx: &BakeContext,
    page_url: &Url,
    rendered: &RenderedPage,
) -> Result<BakedPage, BakeError> {
    let origin = ctx.config().source_origin_url();
    let localizer = ctx.localizer();

    // Phase 1
    let plan = RewritePlan::extract(&rendered.html, page_url, &origin);
    let stylesheets = discovered_urls(&rendered.stylesheets, page_url);
    let scripts = discovered_urls(&rendered.scripts, page_url);

    // Phase 2
    let (assets, sprites, inline_styles, stylesheet_paths, script_paths) = futures::join!(
        join_all(plan.assets.iter().map(|(url, asset_type)| async move {
            let local = localizer.localize(url, *asset_type).await;
            ((url.clone(), *asset_type), local)
        })),
        join_all(plan.sprites.iter().map(|url| async move {
            ctx.sprites()
                .load(localizer, url)
                .await
                .map(|text| (url.clone(), text))
        })),
        join_all(
            plan.style_blocks
                .iter()
                .map(|css| rewrite_stylesheet(localizer, css, page_url))
        ),
        join_all(stylesheets.iter().map(|url| localize_stylesheet(localizer, url))),
        join_all(scripts.iter().map(|url| localizer.localize(url, AssetType::Script))),
    );

    let resolutions = Resolutions {
        assets: assets.into_iter().collect(),
        sprites: sprites.into_iter().flatten().collect(),
    };

    // Phase 3
    let stylesheet_set: HashSet<Url> = stylesheets.into_iter().collect();
    let script_set: HashSet<Url> = scripts.into_iter().collect();
    let (body_html, document_html) = apply_and_serialize(
        &rendered.html,
        &apply::ApplyContext {
            page_url,
            origin: &origin,
            resolutions: &resolutions,
            classifier: ctx.classifier(),
            discovered_stylesheets: &stylesheet_set,
            discovered_scripts: &script_set,
        },
    )
    .map_err(|source| BakeError::Serialize {
        url: page_url.to_string(),
        source,
    })?;

    Ok(BakedPage {
        body_html,
        document_html,
        inline_styles,
        stylesheets: stylesheet_paths,
        scripts: script_paths,
    })
}

fn apply_and_serialize(
    html: &str,
    cx: &apply::ApplyContext<'_>,
) -> std::io::Result<(String, String)> {
    let document = PageDocument::parse(html);
    apply::apply(&document, cx);
    Ok((document.body_html()?, document.to_html()?))
}

/// Resolve and deduplicate discovered URLs, keeping first-seen order
fn discovered_urls(urls: &[String], page_url: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    urls.iter()
        .filter_map(|raw| match resolve_url(page_url, raw) {
            Ok(mut url) => {
                url.set_fragment(None);
                Some(url)
            }
            Err(e) => {
                log::debug!("Ignoring discovered URL: {e}");
                None
            }
        })
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_html_is_inner_markup() {
        let document = PageDocument::parse("<html><body><p>hi</p><br></body></html>");
        assert_eq!(document.body_html().unwrap(), "<p>hi</p><br>");
        assert!(document.to_html().unwrap().starts_with("<html>"));
    }

    #[test]
    fn discovered_urls_are_deduplicated_in_order() {
        let page = Url::parse("http://src.test/a/").unwrap();
        let urls = discovered_urls(
            &[
                "http://src.test/b.css".to_string(),
                "/b.css#x".to_string(),
                "c.css".to_string(),
            ],
            &page,
        );
        let urls: Vec<_> = urls.iter().map(Url::as_str).collect();
        assert_eq!(urls, vec!["http://src.test/b.css", "http://src.test/a/c.css"]);
    }
}
