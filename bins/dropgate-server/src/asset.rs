//! Protected asset access
//!
//! The asset is a single file on disk, opened only after a token has been
//! verified. Absence of the file is an operational failure, reported
//! distinctly from token rejection.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs::File;

use crate::config::AssetConfig;

/// Byte source for the protected file
#[derive(Debug, Clone)]
pub struct AssetStore {
    path: PathBuf,
    download_name: String,
    content_type: String,
}

impl AssetStore {
    pub fn new(config: &AssetConfig) -> Self {
        Self {
            path: PathBuf::from(&config.path),
            download_name: config.download_name.clone(),
            content_type: config.content_type.clone(),
        }
    }

    /// Open the asset for streaming, returning the file and its length
    pub async fn open(&self) -> Result<(File, u64)> {
        let file = File::open(&self.path)
            .await
            .with_context(|| format!("failed to open asset at {:?}", self.path))?;

        let len = file
            .metadata()
            .await
            .context("failed to read asset metadata")?
            .len();

        Ok((file, len))
    }

    /// Filename offered to the client
    pub fn download_name(&self) -> &str {
        &self.download_name
    }

    /// Content-Type of the served file
    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}
