//! Process execution utilities for the external tools (yt-dlp, ffmpeg, ffprobe)
//!
//! Provides a timeout-bounded `output()` helper for short queries, a line
//! reader for tool output and a stderr tail collector for long-running,
//! streamed tool invocations.

use std::collections::VecDeque;
use std::process::Output;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::download::error::DownloadError;

/// Run an async Command with a timeout.
///
/// Returns the process Output on success. A missing binary maps to
/// `DownloadError::ToolMissing`, an expired timeout to `DownloadError::Network`
/// (the message contains "timeout" so it classifies as a network problem).
pub async fn run_with_timeout(cmd: &mut Command, tool: &str, timeout: Duration) -> Result<Output, DownloadError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(DownloadError::from_spawn(tool, e)),
        Err(_) => Err(DownloadError::Network(format!(
            "{} timeout after {}s",
            tool,
            timeout.as_secs()
        ))),
    }
}

/// Reads a tool's output line by line, replacing invalid UTF-8.
///
/// Titles and file names in yt-dlp and ffmpeg output are not always valid
/// UTF-8; a bad line must not stop the pipe from being drained.
pub struct LossyLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LossyLines<R> {
    pub fn new(stream: R) -> Self {
        Self {
            reader: BufReader::new(stream),
            buf: Vec::new(),
        }
    }

    /// Next line without its terminator, or `None` at end of stream
    pub async fn next_line(&mut self) -> Option<String> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf).await {
            Ok(0) => None,
            Ok(_) => {
                while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
                    self.buf.pop();
                }
                Some(String::from_utf8_lossy(&self.buf).into_owned())
            }
            Err(e) => {
                log::warn!("Stopped reading tool output: {}", e);
                None
            }
        }
    }
}

/// Drains a child's stderr in the background, keeping only the last `max_lines` lines.
///
/// Every line is also passed to `on_line` (used to pick progress out of stderr).
pub fn collect_tail<R, F>(stream: R, max_lines: usize, mut on_line: F) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
    F: FnMut(&str) + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = LossyLines::new(stream);
        let mut tail: VecDeque<String> = VecDeque::with_capacity(max_lines.min(64));
        while let Some(line) = lines.next_line().await {
            on_line(&line);
            tail.push_back(line);
            if tail.len() > max_lines {
                tail.pop_front();
            }
        }
        tail.make_contiguous().join("\n")
    })
}

/// Picks the most useful failure text from a finished tool run.
///
/// yt-dlp and ffmpeg put their diagnostics on stderr; when that is empty fall
/// back to the exit status so the message is never blank.
pub fn failure_message(tool: &str, stderr: &str, status: std::process::ExitStatus) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        format!("{} exited with {}", tool, status)
    } else {
        trimmed.to_string()
    }
}

/// Runs `bin version_arg` and returns the first line of its output.
///
/// Used by `check-tools`; yt-dlp answers `--version`, ffmpeg/ffprobe `-version`.
pub async fn probe_tool_version(bin: &str, tool: &str, version_arg: &str, timeout: Duration) -> Result<String, DownloadError> {
    let mut cmd = Command::new(bin);
    cmd.arg(version_arg);
    let output = run_with_timeout(&mut cmd, tool, timeout).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DownloadError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            failure_message(tool, &stderr, output.status),
        )));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}
