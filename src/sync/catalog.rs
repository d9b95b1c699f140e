use thiserror::Error;

use crate::model::config::ThemesConfig;
use crate::model::theme::{CatalogEntry, ThemeCatalog};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("theme catalog request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("theme catalog returned HTTP {0}")]
    Status(u16),
}

/// Fetch the community theme list and index it by [`crate::model::theme::ThemeId`].
pub async fn fetch_catalog(
    client: &reqwest::Client,
    themes: &ThemesConfig,
) -> Result<ThemeCatalog, CatalogError> {
    let resp = client.get(&themes.catalog_url).send().await?;
    if !resp.status().is_success() {
        return Err(CatalogError::Status(resp.status().as_u16()));
    }

    let entries: Vec<CatalogEntry> = resp.json().await?;
    let catalog = ThemeCatalog::from_entries(entries, themes);
    tracing::info!("theme catalog loaded: {} themes", catalog.len());
    Ok(catalog)
}
