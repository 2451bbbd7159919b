pub mod asset_localizer;
pub mod bake;
pub mod config;
pub mod document;
pub mod link_classifier;
pub mod output;
pub mod render_driver;
pub mod sprite;
pub mod stylesheet;
pub mod utils;

pub use asset_localizer::{AssetPath, AssetType, FetchError, Localizer};
pub use bake::{BakeContext, BakeError, BakeReport, Baker, PageOutcome, bake_site};
pub use config::BakeConfig;
pub use document::{BakedPage, PageDocument, RewritePlan, rewrite_page};
pub use link_classifier::{FriendlyPathIndex, LinkClassifier, PageEntry};
pub use output::save_baked_page;
pub use render_driver::{
    ChromiumRenderDriver, RenderDriver, RenderError, RenderRequest, RenderedPage,
};
pub use sprite::SpriteCache;
pub use stylesheet::{localize_stylesheet, rewrite_stylesheet};
