//! Bake orchestration
//!
//! Renders each page through a [`RenderDriver`], rewrites it, and writes the
//! result. Pages run concurrently up to `max_concurrent_pages`; a page that
//! fails is reported and never stops its siblings.

mod context;
mod error;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use log::{debug, error, info, warn};
use tokio::sync::Semaphore;
use url::Url;

pub use context::BakeContext;
pub use error::BakeError;

use crate::config::BakeConfig;
use crate::document::{BakedPage, rewrite_page};
use crate::link_classifier::PageEntry;
use crate::output::save_baked_page;
use crate::render_driver::{ChromiumRenderDriver, RenderDriver, RenderRequest};

/// Result of baking one page
#[derive(Debug)]
pub struct PageOutcome {
    pub entry: PageEntry,
    /// Path of the written `page.json`
    pub result: Result<PathBuf, BakeError>,
}

/// Results of a whole run, in input order
#[derive(Debug, Default)]
pub struct BakeReport {
    pub outcomes: Vec<PageOutcome>,
}

impl BakeReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PageEntry, &BakeError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.entry, e)))
    }
}

/// Drives pages through render, rewrite and output
pub struct Baker<D> {
    ctx: Arc<BakeContext>,
    driver: Arc<D>,
}

impl<D> Clone for Baker<D> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
            driver: Arc::clone(&self.driver),
        }
    }
}

impl<D: RenderDriver + 'static> Baker<D> {
    pub fn new(ctx: Arc<BakeContext>, driver: Arc<D>) -> Self {
        Self { ctx, driver }
    }

    /// Render and rewrite one page without writing it
    pub async fn bake_page(&self, entry: &PageEntry) -> Result<BakedPage, BakeError> {
        let page_url = Url::parse(&entry.render_url).map_err(|e| BakeError::InvalidUrl {
            url: entry.render_url.clone(),
            message: e.to_string(),
        })?;
        let origin = self.ctx.config().source_origin_url();

        let rendered = self
            .driver
            .render(RenderRequest {
                url: &page_url,
                source_origin: &origin,
            })
            .await
            .map_err(|source| BakeError::Render {
                url: page_url.to_string(),
                source,
            })?;

        rewrite_page(&self.ctx, &page_url, &rendered).await
    }

    /// Bake one page and write it to the output directory
    pub async fn bake_and_save(&self, entry: &PageEntry) -> Result<PathBuf, BakeError> {
        let page = self.bake_page(entry).await?;
        save_baked_page(self.ctx.config().output_dir(), &entry.friendly_path, page)
            .await
            .map_err(|e| BakeError::Output {
                friendly_path: entry.friendly_path.clone(),
                message: format!("{e:#}"),
            })
    }

    /// Bake every page with bounded parallelism
    pub async fn bake_all(&self, pages: Vec<PageEntry>) -> BakeReport {
        let start = Instant::now();
        let total = pages.len();
        let semaphore = Arc::new(Semaphore::new(self.ctx.config().max_concurrent_pages()));
        let mut active_tasks = FuturesUnordered::new();
        let mut outcomes: Vec<Option<PageOutcome>> = Vec::with_capacity(total);

        info!("Baking {total} pages");

        for (index, entry) in pages.into_iter().enumerate() {
            outcomes.push(None);

            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                error!("Semaphore closed unexpectedly");
                break;
            };

            let baker = self.clone();
            let task_entry = entry.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                baker.bake_and_save(&task_entry).await
            });

            active_tasks.push(async move { (index, entry, handle.await) });
        }

        while let Some((index, entry, joined)) = active_tasks.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("Page task for {} panicked: {e}", entry.friendly_path);
                    Err(BakeError::Aborted {
                        friendly_path: entry.friendly_path.clone(),
                        message: e.to_string(),
                    })
                }
            };

            match &result {
                Ok(path) => debug!("Baked {} -> {}", entry.friendly_path, path.display()),
                Err(e) => warn!("Failed to bake {}: {e}", entry.friendly_path),
            }
            outcomes[index] = Some(PageOutcome { entry, result });
        }

        let report = BakeReport {
            outcomes: outcomes.into_iter().flatten().collect(),
        };
        info!(
            "Baked {} of {total} pages in {:.1}s ({} failed)",
            report.succeeded(),
            start.elapsed().as_secs_f64(),
            report.failed()
        );
        report
    }
}

/// Bake `pages` with a freshly launched Chromium
///
/// Fails only when the browser or HTTP client cannot be set up; page failures
/// are in the report.
pub async fn bake_site(config: BakeConfig, pages: Vec<PageEntry>) -> anyhow::Result<BakeReport> {
    let config = Arc::new(config);
    let ctx = Arc::new(BakeContext::new(Arc::clone(&config), &pages)?);
    let driver = Arc::new(ChromiumRenderDriver::launch(Arc::clone(&config)).await?);

    let report = Baker::new(ctx, Arc::clone(&driver)).bake_all(pages).await;

    match Arc::try_unwrap(driver) {
        Ok(driver) => {
            if let Err(e) = driver.close().await {
                warn!("{e:#}");
            }
        }
        Err(_) => warn!("Render driver still shared after bake; skipping browser shutdown"),
    }

    Ok(report)
}
