//! Writing baked pages to the output directory

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::timeout;

use crate::document::BakedPage;

/// Serialization of a pathological page must not stall a worker forever
const BLOCKING_SERIALIZATION_TIMEOUT: Duration = Duration::from_secs(10);

/// `<output_dir>/pages/<friendly path>/page.json`
///
/// The root path maps to `<output_dir>/pages/page.json`. Paths that would
/// escape the pages directory are rejected.
pub fn page_output_path(output_dir: &Path, friendly_path: &str) -> Result<PathBuf> {
    let mut path = output_dir.join("pages");
    for component in Path::new(friendly_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(segment) => path.push(segment),
            Component::CurDir => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Friendly path '{friendly_path}' escapes the output directory"
                ));
            }
        }
    }
    Ok(path.join("page.json"))
}

/// Save a baked page as pretty-printed JSON and return the written path
pub async fn save_baked_page(
    output_dir: &Path,
    friendly_path: &str,
    page: BakedPage,
) -> Result<PathBuf> {
    let path = page_output_path(output_dir, friendly_path)?;

    let blocking_task = tokio::task::spawn_blocking(move || serde_json::to_string_pretty(&page));
    let json = match timeout(BLOCKING_SERIALIZATION_TIMEOUT, blocking_task).await {
        Ok(Ok(result)) => result.context("Failed to serialize baked page")?,
        Ok(Err(e)) => return Err(anyhow::anyhow!("JSON serialization task panicked: {e}")),
        Err(_) => {
            return Err(anyhow::anyhow!(
                "JSON serialization timed out after {BLOCKING_SERIALIZATION_TIMEOUT:?}"
            ));
        }
    };

    let target = path.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        use std::io::Write;

        let dir = target
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Path has no parent directory"))?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let mut temp =
            tempfile::NamedTempFile::new_in(dir).context("Failed to create temporary page file")?;
        temp.write_all(json.as_bytes())
            .context("Failed to write temporary page file")?;
        temp.persist(&target)
            .map_err(|e| anyhow::anyhow!("Failed to persist {}: {}", target.display(), e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| anyhow::anyhow!("Spawn blocking join error: {e}"))??;

    log::debug!("Wrote {}", path.display());
    Ok(path)
}
