//! Extraction phase of the document rewrite
//!
//! Walks the rendered HTML once and records everything that needs network
//! work. Nothing here is async and nothing is mutated; the parsed tree is
//! dropped before any request is issued.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use super::srcset::parse_srcset;
use crate::asset_localizer::AssetType;
use crate::sprite::sprite_reference;
use crate::stylesheet::{CssReference, origin_bound, scan};
use crate::utils::path_extension;

static IMG_SRC_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("img[src]").expect("BUG: hardcoded CSS selector 'img[src]' is invalid")
});

static SRCSET_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("img[srcset], source[srcset]")
        .expect("BUG: hardcoded CSS selector 'img[srcset], source[srcset]' is invalid")
});

static STYLE_ATTR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[style]").expect("BUG: hardcoded CSS selector '[style]' is invalid")
});

static USE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("use").expect("BUG: hardcoded CSS selector 'use' is invalid")
});

static STYLE_BLOCK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("style").expect("BUG: hardcoded CSS selector 'style' is invalid")
});

/// Everything one page needs fetched before it can be rewritten
#[derive(Debug, Default)]
pub struct RewritePlan {
    /// Unique localization requests in first-seen order
    pub assets: Vec<(Url, AssetType)>,
    /// Unique sprite files referenced by `<use>`
    pub sprites: Vec<Url>,
    /// Text of each `<style>` element in document order
    pub style_blocks: Vec<String>,
}

impl RewritePlan {
    /// Collect the plan for `html` rendered at `page_url`
    #[must_use]
    pub fn extract(html: &str, page_url: &Url, origin: &Url) -> Self {
        let document = Html::parse_document(html);
        let mut plan = PlanBuilder::default();

        for element in document.select(&IMG_SRC_SELECTOR) {
            if let Some(src) = element.value().attr("src")
                && let Some(url) = origin_bound(src, page_url, origin)
            {
                plan.asset(url, AssetType::Image);
            }
        }

        for element in document.select(&SRCSET_SELECTOR) {
            let Some(srcset) = element.value().attr("srcset") else {
                continue;
            };
            for candidate in parse_srcset(srcset) {
                if let Some(url) = origin_bound(&candidate.url, page_url, origin) {
                    plan.asset(url, AssetType::Image);
                }
            }
        }

        for element in document.select(&STYLE_ATTR_SELECTOR) {
            let Some(style) = element.value().attr("style") else {
                continue;
            };
            for (url, asset_type) in style_attribute_targets(style, page_url, origin) {
                plan.asset(url, asset_type);
            }
        }

        for element in document.select(&USE_SELECTOR) {
            let href = element
                .value()
                .attrs()
                .find(|(name, _)| *name == "href")
                .map(|(_, value)| value);
            if let Some(reference) = href.and_then(|h| sprite_reference(h, page_url, origin)) {
                plan.sprite(reference.sprite_url);
            }
        }

        plan.style_blocks = document
            .select(&STYLE_BLOCK_SELECTOR)
            .map(|element| element.text().collect::<String>())
            .collect();

        log::debug!(
            "Plan for {page_url}: {} assets, {} sprites, {} style blocks",
            plan.assets.len(),
            plan.sprites.len(),
            plan.style_blocks.len()
        );

        plan.finish()
    }
}

/// Origin-bound `url()` targets of an inline `style` attribute
///
/// Shared by extraction and application so both sides agree on the asset
/// type of every reference.
pub(crate) fn style_attribute_targets(
    style: &str,
    page_url: &Url,
    origin: &Url,
) -> Vec<(Url, AssetType)> {
    if !style.to_ascii_lowercase().contains("url(") {
        return Vec::new();
    }

    scan(style)
        .into_iter()
        .filter_map(|reference| match reference {
            CssReference::Url { value, .. } => {
                let url = origin_bound(&value, page_url, origin)?;
                let asset_type = AssetType::from_css_reference(&path_extension(&url));
                Some((url, asset_type))
            }
            CssReference::Import { .. } => None,
        })
        .collect()
}

#[derive(Default)]
struct PlanBuilder {
    assets: Vec<(Url, AssetType)>,
    seen_assets: HashSet<(Url, AssetType)>,
    sprites: Vec<Url>,
    seen_sprites: HashSet<Url>,
    style_blocks: Vec<String>,
}

impl PlanBuilder {
    fn asset(&mut self, url: Url, asset_type: AssetType) {
        if self.seen_assets.insert((url.clone(), asset_type)) {
            self.assets.push((url, asset_type));
        }
    }

    fn sprite(&mut self, url: Url) {
        if self.seen_sprites.insert(url.clone()) {
            self.sprites.push(url);
        }
    }

    fn finish(self) -> RewritePlan {
        RewritePlan {
            assets: self.assets,
            sprites: self.sprites,
            style_blocks: self.style_blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_unique_requests_in_order() {
        let origin = Url::parse("http://src.test").unwrap();
        let page = Url::parse("http://src.test/docs/").unwrap();
        let html = r##"<html><head><style>a{color:red}</style></head><body>
            <img src="/a.png">
            <img src="/a.png" srcset="/a.png 1x, b.png 2x">
            <img src="https://cdn.example/x.png">
            <picture><source srcset="/c.webp 640w"></picture>
            <div style="background:url('/bg.jpg')"></div>
            <span style="color:blue"></span>
            <svg><use href="/icons.svg#one"></use></svg>
            <svg><use xlink:href="/icons.svg#two"></use></svg>
            <svg><use href="#local"></use></svg>
            <style>b{color:blue}</style>
        </body></html>"##;

        let plan = RewritePlan::extract(html, &page, &origin);
        let assets: Vec<_> = plan.assets.iter().map(|(u, t)| (u.as_str(), *t)).collect();

        assert_eq!(
            assets,
            vec![
                ("http://src.test/a.png", AssetType::Image),
                ("http://src.test/docs/b.png", AssetType::Image),
                ("http://src.test/c.webp", AssetType::Image),
                ("http://src.test/bg.jpg", AssetType::Image),
            ]
        );
        assert_eq!(plan.sprites.len(), 1);
        assert_eq!(plan.sprites[0].as_str(), "http://src.test/icons.svg");
        assert_eq!(plan.style_blocks, vec!["a{color:red}", "b{color:blue}"]);
    }

    #[test]
    fn style_attribute_fonts_are_typed_by_extension() {
        let origin = Url::parse("http://src.test").unwrap();
        let targets = style_attribute_targets(
            "src:url(/f.WOFF2); background:url(data:image/png;base64,AA==)",
            &origin,
            &origin,
        );
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].1, AssetType::Font);
    }
}
