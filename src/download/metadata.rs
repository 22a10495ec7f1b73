//! Source metadata lookup via yt-dlp.
//!
//! Resolves a media URL to the handful of fields the pipeline needs: the
//! title (default file name and tag), uploader, thumbnail URL, upload date and
//! album. The query runs `yt-dlp --dump-single-json` without downloading.

use async_trait::async_trait;
use chrono::Datelike;
use serde::Deserialize;
use std::time::Duration;
use tokio::process::Command;
use url::Url;

use crate::core::config;
use crate::core::process::{failure_message, run_with_timeout};
use crate::download::error::DownloadError;

/// Media metadata reported by the extractor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaMetadata {
    pub title: String,
    pub uploader: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Upload date as `YYYYMMDD`
    pub upload_date: Option<String>,
    pub album: Option<String>,
}

impl MediaMetadata {
    /// Year for the ID3 tag: the `YYYY` of the upload date, else the current year
    pub fn upload_year(&self) -> i32 {
        self.upload_date
            .as_deref()
            .and_then(parse_upload_year)
            .unwrap_or_else(|| chrono::Local::now().year())
    }
}

/// Takes the year out of a `YYYYMMDD` date string
pub fn parse_upload_year(date: &str) -> Option<i32> {
    let year = date.trim().get(..4)?;
    if year.bytes().all(|b| b.is_ascii_digit()) {
        year.parse().ok()
    } else {
        None
    }
}

/// Subset of the yt-dlp info JSON we read
#[derive(Debug, Deserialize)]
struct InfoJson {
    title: Option<String>,
    uploader: Option<String>,
    thumbnail: Option<String>,
    upload_date: Option<String>,
    album: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parses yt-dlp `--dump-single-json` output
pub fn parse_metadata_json(raw: &str) -> Result<MediaMetadata, DownloadError> {
    let info: InfoJson = serde_json::from_str(raw)
        .map_err(|e| DownloadError::Extraction(format!("could not parse yt-dlp metadata: {}", e)))?;

    let title = non_empty(info.title)
        .ok_or_else(|| DownloadError::Extraction("yt-dlp returned no title for this URL".to_string()))?;

    Ok(MediaMetadata {
        title,
        uploader: non_empty(info.uploader),
        thumbnail_url: non_empty(info.thumbnail),
        upload_date: non_empty(info.upload_date),
        album: non_empty(info.album),
    })
}

/// Rejects anything that isn't an absolute http(s) URL before spawning yt-dlp
pub fn validate_source_url(url: &str) -> Result<Url, DownloadError> {
    match Url::parse(url.trim()) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some() => Ok(parsed),
        _ => Err(DownloadError::Extraction(format!("Unsupported URL: {}", url))),
    }
}

/// Resolves a URL to `MediaMetadata`
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<MediaMetadata, DownloadError>;
}

/// `MetadataFetcher` backed by the yt-dlp binary
#[derive(Debug, Clone)]
pub struct YtDlpMetadataFetcher {
    bin: String,
    timeout: Duration,
}

impl YtDlpMetadataFetcher {
    /// Uses `YTDL_BIN` and the configured metadata timeout
    pub fn new() -> Self {
        Self::with_binary(config::YTDL_BIN.as_str(), config::download::ytdlp_timeout())
    }

    pub fn with_binary(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }

    fn build_args(url: &Url) -> Vec<String> {
        vec![
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
            "--no-check-certificate".to_string(),
            "--prefer-free-formats".to_string(),
            "--no-playlist".to_string(),
            url.as_str().to_string(),
        ]
    }
}

impl Default for YtDlpMetadataFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataFetcher for YtDlpMetadataFetcher {
    async fn fetch(&self, url: &str) -> Result<MediaMetadata, DownloadError> {
        let url = validate_source_url(url)?;
        let args = Self::build_args(&url);
        log::debug!("yt-dlp command for metadata: {} {}", self.bin, args.join(" "));

        let mut cmd = Command::new(&self.bin);
        cmd.args(&args);
        let output = run_with_timeout(&mut cmd, "yt-dlp", self.timeout).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::error!("yt-dlp failed to get metadata for {}: {}", url, stderr.trim());
            return Err(DownloadError::Extraction(failure_message("yt-dlp", &stderr, output.status)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let metadata = parse_metadata_json(&stdout)?;
        log::info!(
            "Got metadata from yt-dlp: title='{}', uploader={:?}",
            metadata.title,
            metadata.uploader
        );
        Ok(metadata)
    }
}
