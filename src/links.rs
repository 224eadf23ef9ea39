//! Service link list loading.
//!
//! Reads the dashboard's link list from a YAML file. Individual malformed
//! rows are skipped with a warning; only an unreadable or structurally
//! invalid file is an error.

use std::fs;
use std::path::Path;

use crate::models::LinkItem;

#[derive(Debug, thiserror::Error)]
pub enum LinksError {
    #[error("failed to read links file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("links file {path} is not a YAML list: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Load link records from `path`. A missing file yields an empty list.
pub fn load_links(path: &Path) -> Result<Vec<LinkItem>, LinksError> {
    if !path.exists() {
        log::warn!("links file not found at {}; returning empty list", path.display());
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path).map_err(|source| LinksError::Read {
        path: path.display().to_string(),
        source,
    })?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<serde_yaml::Value> =
        serde_yaml::from_str(&text).map_err(|source| LinksError::Parse {
            path: path.display().to_string(),
            source,
        })?;

    let mut links = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_yaml::from_value::<LinkItem>(row) {
            Ok(item) => links.push(item),
            Err(err) => log::warn!("skipping invalid link row: {err}"),
        }
    }
    Ok(links)
}
