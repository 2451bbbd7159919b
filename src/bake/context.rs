//! Per-run state shared by every page of a bake

use std::sync::Arc;

use crate::asset_localizer::Localizer;
use crate::config::BakeConfig;
use crate::link_classifier::{FriendlyPathIndex, LinkClassifier, PageEntry};
use crate::sprite::SpriteCache;

/// Everything a page rewrite reads, built once per run
///
/// Nothing here is global: dropping the context at the end of a run drops the
/// sprite cache with it. Localized files stay on disk and are reused by the
/// next run sharing the output directory.
pub struct BakeContext {
    config: Arc<BakeConfig>,
    localizer: Localizer,
    classifier: LinkClassifier,
    sprites: SpriteCache,
}

impl BakeContext {
    /// Build the context for baking `pages`
    pub fn new(config: Arc<BakeConfig>, pages: &[PageEntry]) -> anyhow::Result<Self> {
        let localizer = Localizer::new(Arc::clone(&config))?;
        Ok(Self::with_localizer(config, pages, localizer))
    }

    /// Build the context around an existing localizer
    #[must_use]
    fn with_localizer(config: Arc<BakeConfig>, pages: &[PageEntry], localizer: Localizer) -> Self {
        let index = Arc::new(FriendlyPathIndex::from_entries(pages));
        log::debug!("Friendly path index holds {} paths", index.len());
        let classifier = LinkClassifier::new(&config, index);

        Self {
            config,
            localizer,
            classifier,
            sprites: SpriteCache::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BakeConfig {
        &self.config
    }

    #[must_use]
    pub fn localizer(&self) -> &Localizer {
        &self.localizer
    }

    #[must_use]
    pub fn classifier(&self) -> &LinkClassifier {
        &self.classifier
    }

    #[must_use]
    pub fn sprites(&self) -> &SpriteCache {
        &self.sprites
    }
}
