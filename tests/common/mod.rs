//! Test utilities shared by the pagebake integration tests

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use mockito::{Mock, Server};
use pagebake::{
    BakeConfig, BakeContext, Localizer, PageEntry, RenderDriver, RenderError, RenderRequest,
    RenderedPage,
};
use tempfile::TempDir;

/// Creates a temporary directory for test output
#[allow(dead_code)]
pub fn create_test_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Sets up a mock HTTP server acting as the source origin
#[allow(dead_code)]
pub async fn setup_mock_server() -> mockito::ServerGuard {
    Server::new_async().await
}

/// Creates a mock endpoint that serves `body` with `content_type`
#[allow(dead_code)]
pub async fn create_asset_mock(
    server: &mut Server,
    path: &str,
    content_type: &str,
    body: &str,
) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", content_type)
        .with_body(body)
        .create_async()
        .await
}

/// Creates a mock endpoint that returns an error status
#[allow(dead_code)]
pub async fn create_error_mock(server: &mut Server, path: &str, status: usize) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .with_body("Error")
        .create_async()
        .await
}

/// Configuration for tests rooted at `output_dir` with `origin` as source
#[allow(dead_code)]
pub fn test_config(output_dir: &Path, origin: &str) -> Arc<BakeConfig> {
    Arc::new(
        BakeConfig::builder()
            .output_dir(output_dir)
            .source_origin(origin)
            .asset_timeout_secs(5)
            .build()
            .expect("Failed to create test config"),
    )
}

/// Localizer for tests
#[allow(dead_code)]
pub fn test_localizer(config: Arc<BakeConfig>) -> Localizer {
    Localizer::new(config).expect("Failed to build localizer")
}

/// Bake context for tests
#[allow(dead_code)]
pub fn test_context(config: Arc<BakeConfig>, pages: &[PageEntry]) -> Arc<BakeContext> {
    Arc::new(BakeContext::new(config, pages).expect("Failed to build bake context"))
}

/// Asserts `haystack` does not mention `host` anywhere
#[allow(dead_code)]
pub fn assert_no_host(haystack: &str, host: &str) {
    assert!(
        !haystack.contains(host),
        "Expected no reference to {host} in:\n{haystack}"
    );
}

/// Render driver that serves canned pages
///
/// Pages missing from the map fail to render.
#[allow(dead_code)]
#[derive(Default)]
pub struct StubRenderDriver {
    pages: HashMap<String, RenderedPage>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl StubRenderDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, page: RenderedPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RenderDriver for StubRenderDriver {
    fn render<'a>(
        &'a self,
        request: RenderRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<RenderedPage, RenderError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages
                .get(request.url.as_str())
                .cloned()
                .ok_or_else(|| RenderError::Navigation {
                    url: request.url.to_string(),
                    message: "net::ERR_CONNECTION_REFUSED".to_string(),
                })
        })
    }
}

/// Helper to create test URLs
#[allow(dead_code)]
pub fn test_url(server: &Server, path: &str) -> String {
    format!("{}{}", server.url(), path)
}
