//! Cover art download.
//!
//! Streams the thumbnail image reported by the extractor straight to a temp
//! file. Any failure leaves no file behind.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::core::config;
use crate::core::utils::format_mib;
use crate::download::error::DownloadError;

/// Downloads a remote image to a local path
#[async_trait]
pub trait ThumbnailRetriever: Send + Sync {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<PathBuf, DownloadError>;
}

/// `ThumbnailRetriever` over HTTP(S) with `reqwest`
#[derive(Debug, Clone)]
pub struct HttpThumbnailRetriever {
    client: Client,
}

impl HttpThumbnailRetriever {
    /// Client with the configured thumbnail and connect timeouts
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_timeouts(config::network::thumbnail_timeout(), config::network::connect_timeout())
    }

    pub fn with_timeouts(timeout: Duration, connect_timeout: Duration) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .user_agent(config::network::USER_AGENT)
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { client })
    }

    async fn stream_to_file(&self, url: &str, destination: &Path) -> Result<u64, DownloadError> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        let mut file = tokio::fs::File::create(destination).await?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

#[async_trait]
impl ThumbnailRetriever for HttpThumbnailRetriever {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<PathBuf, DownloadError> {
        log::debug!("Fetching thumbnail {} -> {}", url, destination.display());

        match self.stream_to_file(url, destination).await {
            Ok(written) => {
                log::info!("Thumbnail saved to {} ({})", destination.display(), format_mib(written));
                Ok(destination.to_path_buf())
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(destination).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        log::warn!("Failed to remove partial thumbnail {}: {}", destination.display(), rm);
                    }
                }
                // write errors are reported as network failures too
                Err(match e {
                    DownloadError::Io(io) => DownloadError::Network(format!("thumbnail write failed: {}", io)),
                    other => other,
                })
            }
        }
    }
}
