//! SVG sprite inlining
//!
//! `<use href="/icons.svg#close">` only works while the sprite file is served
//! from the same place as the page. The referenced symbol is copied into the
//! page instead: the graphic that held the `<use>` is replaced by a fresh
//! `<svg>` carrying the symbol's children, its `viewBox`, and the original
//! graphic's `class` and `role`.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use kuchiki::NodeRef;
use kuchiki::iter::NodeIterator;
use kuchiki::traits::TendrilSink;
use url::Url;

use crate::asset_localizer::{AssetType, Localizer};
use crate::utils::{is_same_origin, resolve_url};

/// A `<use>` target split into the sprite file and the symbol id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteReference {
    pub sprite_url: Url,
    pub fragment: String,
}

/// Parse a `<use>` href into an origin-bound sprite reference
///
/// Returns `None` for same-document references (`#id`), references without a
/// fragment, and sprites on other origins. A missing fragment on an
/// origin-bound sprite is logged.
#[must_use]
pub fn sprite_reference(href: &str, base: &Url, origin: &Url) -> Option<SpriteReference> {
    let href = href.trim();
    let (sprite, fragment) = href.split_once('#').unwrap_or((href, ""));
    if sprite.is_empty() {
        return None;
    }

    let sprite_url = resolve_url(base, sprite).ok()?;
    if !is_same_origin(&sprite_url, origin) {
        return None;
    }
    if fragment.is_empty() {
        log::warn!("Sprite reference '{href}' names no symbol; leaving it unresolved");
        return None;
    }

    Some(SpriteReference {
        sprite_url,
        fragment: fragment.to_string(),
    })
}

/// Sprite texts already localized during this run
#[derive(Debug, Default)]
pub struct SpriteCache {
    entries: DashMap<Url, Arc<str>>,
}

impl SpriteCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Localize the sprite at `url` and return its text
    ///
    /// The file is stored like any other image and then read back. Returns
    /// `None` when the sprite cannot be fetched or read.
    pub async fn load(&self, localizer: &Localizer, url: &Url) -> Option<Arc<str>> {
        if let Some(text) = self.entries.get(url) {
            return Some(Arc::clone(text.value()));
        }

        let path = match localizer.try_localize(url, AssetType::Image).await {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Failed to localize sprite {url}: {e}");
                return None;
            }
        };

        let text: Arc<str> = localizer.read_local_text(&path).await?.into();
        self.entries.insert(url.clone(), Arc::clone(&text));
        Some(text)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Replace every resolvable `<use>` in `document` with an inline `<svg>`
///
/// `sprites` maps sprite URLs to their text; references to sprites missing
/// from the map are left alone. Returns the number of graphics inlined.
pub fn inline_sprites(
    document: &NodeRef,
    base: &Url,
    origin: &Url,
    sprites: &HashMap<Url, Arc<str>>,
) -> usize {
    let Ok(uses) = document.select("use") else {
        return 0;
    };
    let uses: Vec<_> = uses.collect();

    let mut parsed: HashMap<&Url, NodeRef> = HashMap::new();
    let mut inlined = 0;

    for use_element in uses {
        let Some(href) = href_of(use_element.as_node()) else {
            continue;
        };
        let Some(reference) = sprite_reference(&href, base, origin) else {
            continue;
        };
        let Some((sprite_url, text)) = sprites.get_key_value(&reference.sprite_url) else {
            continue;
        };

        let sprite_doc = parsed
            .entry(sprite_url)
            .or_insert_with(|| kuchiki::parse_html().one(text.as_ref()));

        let Some(symbol) = find_by_id(sprite_doc, &reference.fragment) else {
            log::warn!(
                "Sprite {} has no element with id '{}'",
                reference.sprite_url,
                reference.fragment
            );
            continue;
        };

        let use_node = use_element.as_node();
        let target = use_node
            .ancestors()
            .find(|node| is_element(node, "svg"))
            .unwrap_or_else(|| use_node.clone());
        // Already replaced through another <use> in the same graphic
        if target.parent().is_none() {
            continue;
        }

        let Some(replacement) = build_inline_svg(&target, &symbol) else {
            continue;
        };
        target.insert_before(replacement);
        target.detach();
        inlined += 1;
    }

    inlined
}

/// `href` or `xlink:href` of an element
fn href_of(node: &NodeRef) -> Option<String> {
    let element = node.as_element()?;
    let attrs = element.attributes.borrow();
    attrs
        .map
        .iter()
        .find(|(name, _)| name.local.as_ref() == "href")
        .map(|(_, attr)| attr.value.clone())
}

fn find_by_id(document: &NodeRef, id: &str) -> Option<NodeRef> {
    document
        .descendants()
        .elements()
        .find(|element| element.attributes.borrow().get("id") == Some(id))
        .map(|element| element.as_node().clone())
}

fn is_element(node: &NodeRef, local: &str) -> bool {
    node.as_element()
        .is_some_and(|element| element.name.local.as_ref().eq_ignore_ascii_case(local))
}

/// Attribute lookup by local name, ignoring case (`viewBox` vs `viewbox`)
fn attr_ci(node: &NodeRef, local: &str) -> Option<String> {
    let element = node.as_element()?;
    let attrs = element.attributes.borrow();
    attrs
        .map
        .iter()
        .find(|(name, _)| name.local.as_ref().eq_ignore_ascii_case(local))
        .map(|(_, attr)| attr.value.clone())
}

fn build_inline_svg(original: &NodeRef, symbol: &NodeRef) -> Option<NodeRef> {
    let mut markup = String::from("<svg xmlns=\"http://www.w3.org/2000/svg\"");
    for (name, value) in [
        ("class", attr_ci(original, "class")),
        ("role", attr_ci(original, "role")),
        ("viewBox", attr_ci(symbol, "viewBox")),
    ] {
        if let Some(value) = value {
            markup.push_str(&format!(
                " {name}=\"{}\"",
                html_escape::encode_double_quoted_attribute(&value)
            ));
        }
    }
    markup.push('>');
    for child in symbol.children() {
        markup.push_str(&child.to_string());
    }
    markup.push_str("</svg>");

    let fragment = kuchiki::parse_html().one(markup);
    let svg = fragment.select_first("svg").ok()?;
    let node = svg.as_node().clone();
    node.detach();
    Some(node)
}
