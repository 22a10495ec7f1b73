//! Media acquisition through yt-dlp.
//!
//! Runs yt-dlp once per request, either merging the best mp4-compatible video
//! and audio streams straight into the destination, or extracting the best
//! audio stream into a container for later transcoding. Progress is read from
//! the `[download] N%` lines yt-dlp prints with `--newline`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::core::config;
use crate::core::process::{collect_tail, failure_message, LossyLines};
use crate::download::error::DownloadError;
use crate::download::progress::parse_download_percent;

/// Which streams to ask yt-dlp for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSelector {
    /// Best mp4 video + m4a audio, falling back to any best pair, then any single best file
    BestMuxedMp4,
    /// Best m4a audio, falling back to any best audio
    BestAudio,
}

impl FormatSelector {
    /// The `--format` expression
    pub fn format_spec(&self) -> &'static str {
        match self {
            FormatSelector::BestMuxedMp4 => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/bestvideo+bestaudio/best",
            FormatSelector::BestAudio => "bestaudio[ext=m4a]/bestaudio",
        }
    }
}

/// Output template handed to `-o`.
///
/// Extracted audio goes through `%(ext)s` so the post-processed file lands on
/// `destination` instead of next to it.
fn output_template(destination: &Path, selector: FormatSelector, output_container: Option<&str>) -> PathBuf {
    match (selector, output_container) {
        (FormatSelector::BestAudio, Some(_)) => destination.with_extension("%(ext)s"),
        _ => destination.to_path_buf(),
    }
}

/// Builds the yt-dlp argument list for one acquisition
pub fn build_acquire_args(
    url: &str,
    destination: &Path,
    selector: FormatSelector,
    output_container: Option<&str>,
    ffmpeg_location: Option<&str>,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-o".to_string(),
        output_template(destination, selector, output_container)
            .to_string_lossy()
            .into_owned(),
        "--format".to_string(),
        selector.format_spec().to_string(),
    ];

    if let Some(container) = output_container {
        match selector {
            FormatSelector::BestMuxedMp4 => {
                args.push("--merge-output-format".to_string());
                args.push(container.to_string());
            }
            FormatSelector::BestAudio => {
                args.push("--extract-audio".to_string());
                args.push("--audio-format".to_string());
                args.push(container.to_string());
            }
        }
    }

    args.extend(
        [
            "--newline",
            "--no-playlist",
            "--no-warnings",
            "--no-check-certificate",
            "--socket-timeout",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args.push(config::download::SOCKET_TIMEOUT_SECS.to_string());

    if let Some(location) = ffmpeg_location {
        args.push("--ffmpeg-location".to_string());
        args.push(location.to_string());
    }

    args.push(url.to_string());
    args
}

/// Fetches media for a URL into a local file, reporting percent progress
#[async_trait]
pub trait MediaAcquirer: Send + Sync {
    async fn acquire(
        &self,
        url: &str,
        destination: &Path,
        selector: FormatSelector,
        output_container: Option<&str>,
        progress: mpsc::UnboundedSender<u8>,
    ) -> Result<(), DownloadError>;
}

/// `MediaAcquirer` backed by the yt-dlp binary
#[derive(Debug, Clone)]
pub struct YtDlpAcquirer {
    bin: String,
    ffmpeg_location: Option<String>,
}

impl YtDlpAcquirer {
    /// Uses `YTDL_BIN` and forwards `FFMPEG_BIN` when configured
    pub fn new() -> Self {
        Self {
            bin: config::YTDL_BIN.clone(),
            ffmpeg_location: config::FFMPEG_LOCATION.clone(),
        }
    }

    pub fn with_binary(bin: impl Into<String>, ffmpeg_location: Option<String>) -> Self {
        Self {
            bin: bin.into(),
            ffmpeg_location,
        }
    }
}

impl Default for YtDlpAcquirer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaAcquirer for YtDlpAcquirer {
    async fn acquire(
        &self,
        url: &str,
        destination: &Path,
        selector: FormatSelector,
        output_container: Option<&str>,
        progress: mpsc::UnboundedSender<u8>,
    ) -> Result<(), DownloadError> {
        let args = build_acquire_args(
            url,
            destination,
            selector,
            output_container,
            self.ffmpeg_location.as_deref(),
        );
        log::debug!("yt-dlp command for {:?}: {} {}", selector, self.bin, args.join(" "));

        let mut child = Command::new(&self.bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DownloadError::from_spawn("yt-dlp", e))?;

        let stderr_task = child.stderr.take().map(|stderr| {
            let tx = progress.clone();
            collect_tail(stderr, config::download::STDERR_TAIL_LINES, move |line| {
                log::debug!("yt-dlp stderr: {}", line);
                if let Some(percent) = parse_download_percent(line) {
                    let _ = tx.send(percent);
                }
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = LossyLines::new(stdout);
            while let Some(line) = lines.next_line().await {
                log::trace!("yt-dlp stdout: {}", line);
                if let Some(percent) = parse_download_percent(&line) {
                    let _ = progress.send(percent);
                }
            }
        }

        let status = child.wait().await?;
        let stderr_tail = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            log::error!("yt-dlp failed for {} ({}): {}", url, status, stderr_tail);
            return Err(DownloadError::Acquisition(failure_message("yt-dlp", &stderr_tail, status)));
        }

        if !destination.exists() {
            log::error!("yt-dlp finished but {} is missing", destination.display());
            return Err(DownloadError::Acquisition(format!(
                "yt-dlp did not produce {}",
                destination.display()
            )));
        }

        log::info!("yt-dlp wrote {}", destination.display());
        Ok(())
    }
}
