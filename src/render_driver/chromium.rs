//! Headless Chromium render driver

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::network::{
    EventRequestWillBeSent, Headers, ResourceType, SetExtraHttpHeadersParams,
};
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use super::browser::launch_browser;
use super::{RenderDriver, RenderError, RenderRequest, RenderedPage};
use crate::config::BakeConfig;
use crate::utils::is_same_origin;

/// Renders pages in one shared Chromium instance, one tab per page
pub struct ChromiumRenderDriver {
    browser: Browser,
    handler: JoinHandle<()>,
    config: Arc<BakeConfig>,
}

impl ChromiumRenderDriver {
    /// Find or download Chromium and launch it
    pub async fn launch(config: Arc<BakeConfig>) -> anyhow::Result<Self> {
        let (browser, handler) = launch_browser(&config).await?;
        info!("Browser ready for rendering");
        Ok(Self {
            browser,
            handler,
            config,
        })
    }

    /// Close the browser and wait for its process to exit
    pub async fn close(mut self) -> anyhow::Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to close browser: {e}"))?;
        if let Err(e) = self.browser.wait().await {
            warn!("Browser process did not exit cleanly: {e}");
        }
        self.handler.abort();
        Ok(())
    }

    async fn render_page(&self, request: RenderRequest<'_>) -> Result<RenderedPage, RenderError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Browser(e.to_string()))?;

        let result = self.drive(&page, request).await;

        if let Err(e) = page.close().await {
            debug!("Failed to close tab for {}: {e}", request.url);
        }
        result
    }

    async fn drive(&self, page: &Page, request: RenderRequest<'_>) -> Result<RenderedPage, RenderError> {
        let url = request.url.as_str();
        let navigation_error = |message: String| RenderError::Navigation {
            url: url.to_string(),
            message,
        };

        // Extra headers apply to every request the tab makes, not only the
        // top-level navigation
        if let Some(auth) = self.config.auth_header() {
            let headers = Headers::new(serde_json::json!({ "Authorization": auth }));
            page.execute(SetExtraHttpHeadersParams::new(headers))
                .await
                .map_err(|e| navigation_error(format!("setting headers: {e}")))?;
        }

        let observed = Arc::new(Mutex::new(ObservedResources::default()));
        let mut events = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(|e| navigation_error(format!("subscribing to requests: {e}")))?;
        let collector = {
            let observed = Arc::clone(&observed);
            let origin = request.source_origin.clone();
            tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    observed
                        .lock()
                        .record(&event.request.url, event.r#type.as_ref(), &origin);
                }
            })
        };

        let outcome = async {
            with_timeout(
                async {
                    page.goto(url)
                        .await
                        .map(|_| ())
                        .map_err(|e| navigation_error(e.to_string()))
                },
                self.config.page_load_timeout_secs(),
                "Page load",
                url,
            )
            .await?;

            with_timeout(
                async {
                    page.wait_for_navigation()
                        .await
                        .map(|_| ())
                        .map_err(|e| navigation_error(e.to_string()))
                },
                self.config.navigation_timeout_secs(),
                "Navigation",
                url,
            )
            .await?;

            tokio::time::sleep(self.config.settle_delay()).await;

            page.content().await.map_err(|e| RenderError::Content {
                url: url.to_string(),
                message: e.to_string(),
            })
        }
        .await;

        collector.abort();
        let html = outcome?;
        let ObservedResources {
            stylesheets,
            scripts,
            ..
        } = std::mem::take(&mut *observed.lock());

        debug!(
            "Rendered {url}: {} bytes, {} stylesheets, {} scripts",
            html.len(),
            stylesheets.len(),
            scripts.len()
        );

        Ok(RenderedPage {
            html,
            stylesheets,
            scripts,
        })
    }
}

impl RenderDriver for ChromiumRenderDriver {
    fn render<'a>(
        &'a self,
        request: RenderRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<RenderedPage, RenderError>> + Send + 'a>> {
        Box::pin(self.render_page(request))
    }
}

async fn with_timeout<F, T>(
    operation: F,
    secs: u64,
    name: &'static str,
    url: &str,
) -> Result<T, RenderError>
where
    F: Future<Output = Result<T, RenderError>>,
{
    match tokio::time::timeout(Duration::from_secs(secs), operation).await {
        Ok(result) => result,
        Err(_) => Err(RenderError::Timeout {
            url: url.to_string(),
            operation: name,
            secs,
        }),
    }
}

/// Stylesheet and script requests seen while a page loads
#[derive(Debug, Default)]
pub(crate) struct ObservedResources {
    seen: HashSet<String>,
    stylesheets: Vec<String>,
    scripts: Vec<String>,
}

impl ObservedResources {
    pub(crate) fn record(&mut self, raw_url: &str, kind: Option<&ResourceType>, origin: &Url) {
        let target = match kind {
            Some(ResourceType::Stylesheet) => &mut self.stylesheets,
            Some(ResourceType::Script) => &mut self.scripts,
            _ => return,
        };

        let Ok(url) = Url::parse(raw_url) else {
            return;
        };
        if !is_same_origin(&url, origin) {
            return;
        }
        if self.seen.insert(url.to_string()) {
            target.push(url.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_same_origin_styles_and_scripts_once() {
        let origin = Url::parse("http://src.test").unwrap();
        let mut observed = ObservedResources::default();

        observed.record("http://src.test/a.css", Some(&ResourceType::Stylesheet), &origin);
        observed.record("http://src.test/app.js", Some(&ResourceType::Script), &origin);
        observed.record("http://src.test/a.css", Some(&ResourceType::Stylesheet), &origin);
        observed.record("https://cdn.example/b.css", Some(&ResourceType::Stylesheet), &origin);
        observed.record("http://src.test/logo.png", Some(&ResourceType::Image), &origin);
        observed.record("http://src.test/c.css", None, &origin);

        assert_eq!(observed.stylesheets, vec!["http://src.test/a.css"]);
        assert_eq!(observed.scripts, vec!["http://src.test/app.js"]);
    }
}
