//! Progress parsing and the notification channel to the presentation layer.
//!
//! yt-dlp reports progress as `[download]  45.2% of ...` text lines; this
//! module turns those into integer percentages, filters them so a stage never
//! moves backwards, and defines the `Notification` values the pipeline emits.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;

static DOWNLOAD_PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)%").expect("download percent regex"));

/// Width of the classic progress bar, in cells
const BAR_CELLS: usize = 10;

/// Parses a yt-dlp output line for a download percentage.
///
/// Returns `None` for every line that isn't a `[download] N%` progress line
/// (destination notices, merger output, warnings). The value is rounded to the
/// nearest integer and clamped to `0..=100`.
///
/// # Example
///
/// ```
/// use mediagrab::download::progress::parse_download_percent;
///
/// assert_eq!(parse_download_percent("[download]  45.6% of 3.20MiB at 1.00MiB/s"), Some(46));
/// assert_eq!(parse_download_percent("[download] Destination: a.m4a"), None);
/// ```
pub fn parse_download_percent(line: &str) -> Option<u8> {
    let caps = DOWNLOAD_PERCENT_RE.captures(line)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some(value.round().clamp(0.0, 100.0) as u8)
}

/// Forwards only strictly increasing percentages within one stage.
///
/// Values above 100 are clamped first; anything not greater than the last
/// admitted value is dropped. A fresh gate is used for each stage.
#[derive(Debug, Default, Clone)]
pub struct ProgressGate {
    last: Option<u8>,
}

impl ProgressGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value to emit, or `None` when it must be dropped.
    pub fn admit(&mut self, percent: u8) -> Option<u8> {
        let percent = percent.min(100);
        match self.last {
            Some(last) if percent <= last => None,
            _ => {
                self.last = Some(percent);
                Some(percent)
            }
        }
    }

    /// Last value that passed the gate
    pub fn last(&self) -> Option<u8> {
        self.last
    }
}

/// Outcome and progress notifications sent from the pipeline to whoever renders it.
///
/// A run emits `Status` first, then any mix of `Status` and `Progress`, and
/// finishes with exactly one of `Cancelled`, `Complete` or `Error`.
///
/// Serialises as `{"type": "progress", "payload": 42}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Notification {
    /// Human-readable stage description
    Status(String),
    /// Stage progress in percent (0-100)
    Progress(u8),
    /// The user declined to choose a save location
    Cancelled,
    /// The output file was written
    Complete(PathBuf),
    /// User-facing failure message
    Error(String),
}

impl Notification {
    /// True for the three outcomes that end a run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Notification::Cancelled | Notification::Complete(_) | Notification::Error(_)
        )
    }
}

/// Creates a classic `[█████░░░░░]` progress bar
pub fn progress_bar(percent: u8) -> String {
    let percent = percent.min(100);
    let filled = percent as usize * BAR_CELLS / 100;
    let empty = BAR_CELLS - filled;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}
