//! mediagrab - fetch a media URL as MP4 video or tagged MP3 audio
//!
//! This library provides the download pipeline behind the `mediagrab` CLI:
//! yt-dlp for metadata and media, ffmpeg for MP3 conversion, reqwest for
//! cover art and id3 for tagging, with progress and outcomes reported over a
//! typed notification channel.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, process helpers and small utilities
//! - `download`: Pipeline orchestrator and its collaborators
//! - `cli`: Command-line surface, terminal save prompt and terminal renderer

pub mod cli;
pub mod core;
pub mod download;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError};
pub use download::{DownloadError, DownloadRequest, Notification, OutputFormat, Pipeline};
