//! Fake pipeline collaborators
//!
//! Stand-ins for yt-dlp, ffmpeg, the thumbnail fetch, the ID3 writer and the
//! save prompt. They write small files where the real tools would, emit
//! scripted progress and record every call for assertions.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc;

use mediagrab::download::metadata::{MediaMetadata, MetadataFetcher};
use mediagrab::download::pipeline::SavePathChooser;
use mediagrab::download::request::OutputFormat;
use mediagrab::download::tags::{TagWriter, TrackTags};
use mediagrab::download::thumbnail::ThumbnailRetriever;
use mediagrab::download::transcode::{AudioTarget, Transcoder};
use mediagrab::download::ytdlp::{FormatSelector, MediaAcquirer};
use mediagrab::download::DownloadError;

/// Bytes the fake acquirer writes
pub const MEDIA_BYTES: &[u8] = b"fake media stream";

/// Bytes the fake thumbnail fetch writes
pub const COVER_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];

/// Sorted list of the files directly inside `dir` (empty when it doesn't exist)
pub fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default();
    files.sort();
    files
}

// ======================== Metadata ========================

pub struct MockMetadataFetcher {
    metadata: MediaMetadata,
    error: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl MockMetadataFetcher {
    pub fn ok(metadata: MediaMetadata) -> Self {
        Self {
            metadata,
            error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fails every fetch with an extraction error carrying `message`
    pub fn failing(message: &str) -> Self {
        Self {
            metadata: MediaMetadata::default(),
            error: Some(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MetadataFetcher for MockMetadataFetcher {
    async fn fetch(&self, url: &str) -> Result<MediaMetadata, DownloadError> {
        self.calls.lock().unwrap().push(url.to_string());
        match &self.error {
            Some(message) => Err(DownloadError::Extraction(message.clone())),
            None => Ok(self.metadata.clone()),
        }
    }
}

// ======================== Acquirer ========================

#[derive(Debug, Clone, PartialEq)]
pub struct AcquireCall {
    pub url: String,
    pub destination: PathBuf,
    pub selector: FormatSelector,
    pub output_container: Option<String>,
}

pub struct MockAcquirer {
    progress: Vec<u8>,
    error: Option<String>,
    pub calls: Mutex<Vec<AcquireCall>>,
}

impl MockAcquirer {
    /// Writes `MEDIA_BYTES` and reports the given percentages in order
    pub fn with_progress(progress: &[u8]) -> Self {
        Self {
            progress: progress.to_vec(),
            error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Reports some progress, then fails like yt-dlp with `stderr` as the message
    pub fn failing(stderr: &str) -> Self {
        Self {
            progress: vec![5, 10],
            error: Some(stderr.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaAcquirer for MockAcquirer {
    async fn acquire(
        &self,
        url: &str,
        destination: &Path,
        selector: FormatSelector,
        output_container: Option<&str>,
        progress: mpsc::UnboundedSender<u8>,
    ) -> Result<(), DownloadError> {
        self.calls.lock().unwrap().push(AcquireCall {
            url: url.to_string(),
            destination: destination.to_path_buf(),
            selector,
            output_container: output_container.map(str::to_string),
        });

        for percent in &self.progress {
            let _ = progress.send(*percent);
            tokio::task::yield_now().await;
        }

        if let Some(stderr) = &self.error {
            return Err(DownloadError::Acquisition(stderr.clone()));
        }

        tokio::fs::write(destination, MEDIA_BYTES).await?;
        Ok(())
    }
}

// ======================== Thumbnail ========================

pub struct MockThumbnails {
    fail: bool,
    pub calls: Mutex<Vec<(String, PathBuf)>>,
}

impl MockThumbnails {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ThumbnailRetriever for MockThumbnails {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<PathBuf, DownloadError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), destination.to_path_buf()));
        if self.fail {
            return Err(DownloadError::Network("network error: HTTP status 404 Not Found".to_string()));
        }
        tokio::fs::write(destination, COVER_BYTES).await?;
        Ok(destination.to_path_buf())
    }
}

// ======================== Transcoder ========================

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertCall {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub target: AudioTarget,
    pub source_existed: bool,
}

pub struct MockTranscoder {
    progress: Vec<u8>,
    error: Option<String>,
    pub calls: Mutex<Vec<ConvertCall>>,
}

impl MockTranscoder {
    /// Copies source to destination and reports the given percentages
    pub fn with_progress(progress: &[u8]) -> Self {
        Self {
            progress: progress.to_vec(),
            error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            progress: vec![30],
            error: Some(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn convert(
        &self,
        source: &Path,
        destination: &Path,
        target: &AudioTarget,
        progress: mpsc::UnboundedSender<u8>,
    ) -> Result<(), DownloadError> {
        self.calls.lock().unwrap().push(ConvertCall {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            target: target.clone(),
            source_existed: source.exists(),
        });

        for percent in &self.progress {
            let _ = progress.send(*percent);
            tokio::task::yield_now().await;
        }

        if let Some(message) = &self.error {
            return Err(DownloadError::Transcode(message.clone()));
        }

        tokio::fs::copy(source, destination).await?;
        Ok(())
    }
}

// ======================== Tag writer ========================

#[derive(Debug, Clone, PartialEq)]
pub struct TagCall {
    pub path: PathBuf,
    pub tags: TrackTags,
    pub temp_files_at_call: Vec<PathBuf>,
}

pub struct MockTagWriter {
    result: bool,
    watch_dir: Option<PathBuf>,
    pub calls: Mutex<Vec<TagCall>>,
}

impl MockTagWriter {
    pub fn returning(result: bool) -> Self {
        Self {
            result,
            watch_dir: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Also records which files exist in `dir` when tagging happens
    pub fn watching(mut self, dir: &Path) -> Self {
        self.watch_dir = Some(dir.to_path_buf());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<TagCall> {
        self.calls.lock().unwrap().last().cloned()
    }
}

impl TagWriter for MockTagWriter {
    fn write(&self, path: &Path, tags: &TrackTags) -> bool {
        let temp_files_at_call = self
            .watch_dir
            .as_deref()
            .map(files_in)
            .unwrap_or_default();
        self.calls.lock().unwrap().push(TagCall {
            path: path.to_path_buf(),
            tags: tags.clone(),
            temp_files_at_call,
        });
        self.result
    }
}

// ======================== Save path ========================

pub struct MockSavePath {
    answer: Option<PathBuf>,
    pub calls: Mutex<Vec<(String, OutputFormat)>>,
}

impl MockSavePath {
    pub fn answering(path: impl Into<PathBuf>) -> Self {
        Self {
            answer: Some(path.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The user closes the dialog
    pub fn cancelling() -> Self {
        Self {
            answer: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn proposed_names(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }
}

#[async_trait]
impl SavePathChooser for MockSavePath {
    async fn choose(&self, default_file_name: &str, format: OutputFormat) -> Option<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .push((default_file_name.to_string(), format));
        self.answer.clone()
    }
}
