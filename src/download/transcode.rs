//! Audio transcoding through ffmpeg.
//!
//! The source duration is probed with ffprobe first, then ffmpeg runs with
//! `-progress pipe:1`. Each key=value block it prints becomes one
//! `FfmpegProgress`, and the percentage (when the duration is known) is
//! forwarded to the caller.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::core::config;
use crate::core::process::{collect_tail, failure_message, run_with_timeout, LossyLines};
use crate::download::error::DownloadError;

/// Codec, container and bitrate for an audio conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTarget {
    pub codec: String,
    pub container: String,
    pub bitrate: String,
}

impl AudioTarget {
    /// MP3 via libmp3lame at the configured bitrate
    pub fn mp3() -> Self {
        Self {
            codec: "libmp3lame".to_string(),
            container: "mp3".to_string(),
            bitrate: config::audio::MP3_BITRATE.to_string(),
        }
    }
}

/// One structured progress report from `ffmpeg -progress`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FfmpegProgress {
    /// Position reached in the output
    pub out_time: Option<Duration>,
    /// Encoding speed relative to realtime (`1.5` for `speed=1.5x`)
    pub speed: Option<f64>,
    /// Completion in percent, only when the source duration is known
    pub percent: Option<f64>,
    /// Set on the final block (`progress=end`)
    pub finished: bool,
}

/// Accumulates `-progress` key=value lines into `FfmpegProgress` blocks
#[derive(Debug, Default)]
pub struct FfmpegProgressParser {
    duration_secs: Option<f64>,
    out_time_us: Option<u64>,
    speed: Option<f64>,
}

impl FfmpegProgressParser {
    pub fn new(duration_secs: Option<f64>) -> Self {
        Self {
            duration_secs: duration_secs.filter(|d| *d > 0.0),
            ..Default::default()
        }
    }

    /// Feeds one line; returns a report when the line closes a block.
    pub fn feed_line(&mut self, line: &str) -> Option<FfmpegProgress> {
        let (key, value) = line.trim().split_once('=')?;
        let value = value.trim();
        match key.trim() {
            // out_time_ms is microseconds as well, ffmpeg kept the old name
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<u64>() {
                    self.out_time_us = Some(us);
                }
                None
            }
            "speed" => {
                self.speed = value.trim_end_matches('x').trim().parse::<f64>().ok();
                None
            }
            "progress" => {
                let finished = value == "end";
                Some(self.report(finished))
            }
            _ => None,
        }
    }

    fn report(&self, finished: bool) -> FfmpegProgress {
        let out_time = self.out_time_us.map(Duration::from_micros);
        let percent = self.duration_secs.map(|total| {
            if finished {
                100.0
            } else {
                let done = out_time.map(|t| t.as_secs_f64()).unwrap_or(0.0);
                (done / total * 100.0).clamp(0.0, 100.0)
            }
        });
        FfmpegProgress {
            out_time,
            speed: self.speed,
            percent,
            finished,
        }
    }
}

/// Builds the ffmpeg argument list for an audio conversion
pub fn build_ffmpeg_args(source: &Path, destination: &Path, target: &AudioTarget) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-y".to_string(),
        "-i".to_string(),
        source.to_string_lossy().into_owned(),
        "-vn".to_string(),
        "-acodec".to_string(),
        target.codec.clone(),
        "-b:a".to_string(),
        target.bitrate.clone(),
        "-f".to_string(),
        target.container.clone(),
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-nostats".to_string(),
        destination.to_string_lossy().into_owned(),
    ]
}

/// Converts an audio file, reporting percent progress
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn convert(
        &self,
        source: &Path,
        destination: &Path,
        target: &AudioTarget,
        progress: mpsc::UnboundedSender<u8>,
    ) -> Result<(), DownloadError>;
}

/// `Transcoder` backed by the ffmpeg and ffprobe binaries
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg_bin: String,
    ffprobe_bin: String,
    probe_timeout: Duration,
}

impl FfmpegTranscoder {
    /// Uses `FFMPEG_BIN`/`FFPROBE_BIN` and the configured probe timeout
    pub fn new() -> Self {
        Self::with_binaries(
            config::FFMPEG_BIN.as_str(),
            config::FFPROBE_BIN.as_str(),
            config::audio::ffprobe_timeout(),
        )
    }

    pub fn with_binaries(ffmpeg_bin: impl Into<String>, ffprobe_bin: impl Into<String>, probe_timeout: Duration) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
            probe_timeout,
        }
    }

    /// Get media duration in seconds using ffprobe; `None` when it can't be read
    pub async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let mut cmd = Command::new(&self.ffprobe_bin);
        cmd.args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path);

        let output = match run_with_timeout(&mut cmd, "ffprobe", self.probe_timeout).await {
            Ok(output) => output,
            Err(e) => {
                log::warn!("ffprobe failed for {}: {}", path.display(), e);
                return None;
            }
        };

        if !output.status.success() {
            log::warn!(
                "ffprobe exited with {} for {}: {}",
                output.status,
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        let duration = String::from_utf8_lossy(&output.stdout).trim().parse::<f64>().ok();
        log::debug!("ffprobe duration for {}: {:?}", path.display(), duration);
        duration.filter(|d| d.is_finite() && *d > 0.0)
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

async fn remove_partial_output(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => log::debug!("Removed partial ffmpeg output {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove partial ffmpeg output {}: {}", path.display(), e),
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn convert(
        &self,
        source: &Path,
        destination: &Path,
        target: &AudioTarget,
        progress: mpsc::UnboundedSender<u8>,
    ) -> Result<(), DownloadError> {
        if !source.exists() {
            return Err(DownloadError::Transcode(format!(
                "input file not found: {}",
                source.display()
            )));
        }

        let duration = self.probe_duration(source).await;
        let args = build_ffmpeg_args(source, destination, target);
        log::debug!("ffmpeg command: {} {}", self.ffmpeg_bin, args.join(" "));

        let mut child = Command::new(&self.ffmpeg_bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DownloadError::from_spawn("ffmpeg", e))?;

        let stderr_task = child.stderr.take().map(|stderr| {
            collect_tail(stderr, config::download::STDERR_TAIL_LINES, |line| {
                log::debug!("ffmpeg stderr: {}", line);
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let mut parser = FfmpegProgressParser::new(duration);
            let mut lines = LossyLines::new(stdout);
            while let Some(line) = lines.next_line().await {
                if let Some(report) = parser.feed_line(&line) {
                    log::trace!("ffmpeg progress: {:?}", report);
                    if let Some(percent) = report.percent {
                        let _ = progress.send(percent.round() as u8);
                    }
                }
            }
        }

        let status = match child.wait().await {
            Ok(status) => status,
            Err(e) => {
                remove_partial_output(destination).await;
                return Err(DownloadError::Transcode(format!("ffmpeg process failed: {}", e)));
            }
        };
        let stderr_tail = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            log::error!("ffmpeg failed converting {}: {}", source.display(), stderr_tail);
            remove_partial_output(destination).await;
            return Err(DownloadError::Transcode(failure_message("ffmpeg", &stderr_tail, status)));
        }

        log::info!(
            "Converted {} -> {} ({} @ {})",
            source.display(),
            destination.display(),
            target.codec,
            target.bitrate
        );
        Ok(())
    }
}
