//! Common test utilities
//!
//! This module is shared across all integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

use mediagrab::download::metadata::MediaMetadata;
use mediagrab::download::{DownloadRequest, Notification, OutputFormat, Pipeline};

use crate::mocks::{MockAcquirer, MockMetadataFetcher, MockSavePath, MockTagWriter, MockThumbnails, MockTranscoder};

pub const SOURCE_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

/// Metadata as yt-dlp would report it for a typical music video
pub fn sample_metadata() -> MediaMetadata {
    MediaMetadata {
        title: "Foo: Bar? <Live>".to_string(),
        uploader: Some("Foo Official".to_string()),
        thumbnail_url: Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg".to_string()),
        upload_date: Some("20191122".to_string()),
        album: None,
    }
}

/// A pipeline wired to fakes, with its own temp and output directories
pub struct TestEnvironment {
    pub pipeline: Arc<Pipeline>,
    pub metadata: Arc<MockMetadataFetcher>,
    pub acquirer: Arc<MockAcquirer>,
    pub thumbnails: Arc<MockThumbnails>,
    pub transcoder: Arc<MockTranscoder>,
    pub tagger: Arc<MockTagWriter>,
    pub save_path: Arc<MockSavePath>,
    pub temp_dir: TempDir,
    pub out_dir: TempDir,
}

/// Collaborator overrides; anything left `None` gets a well-behaved fake
#[derive(Default)]
pub struct Fakes {
    pub metadata: Option<MockMetadataFetcher>,
    pub acquirer: Option<MockAcquirer>,
    pub thumbnails: Option<MockThumbnails>,
    pub transcoder: Option<MockTranscoder>,
    pub tagger: Option<MockTagWriter>,
    /// `Some(None)` cancels the save prompt; `None` saves to `<out_dir>/output`
    pub save_path: Option<Option<PathBuf>>,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::with(Fakes::default())
    }

    pub fn with(fakes: Fakes) -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let out_dir = TempDir::new().expect("out dir");

        let metadata = Arc::new(
            fakes
                .metadata
                .unwrap_or_else(|| MockMetadataFetcher::ok(sample_metadata())),
        );
        let acquirer = Arc::new(
            fakes
                .acquirer
                .unwrap_or_else(|| MockAcquirer::with_progress(&[10, 50, 40, 100])),
        );
        let thumbnails = Arc::new(fakes.thumbnails.unwrap_or_else(MockThumbnails::ok));
        let transcoder = Arc::new(
            fakes
                .transcoder
                .unwrap_or_else(|| MockTranscoder::with_progress(&[0, 25, 25, 75, 100])),
        );
        let tagger = Arc::new(
            fakes
                .tagger
                .unwrap_or_else(|| MockTagWriter::returning(true))
                .watching(temp_dir.path()),
        );
        let save_path = Arc::new(match fakes.save_path {
            Some(Some(path)) => MockSavePath::answering(path),
            Some(None) => MockSavePath::cancelling(),
            None => MockSavePath::answering(out_dir.path().join("output")),
        });

        let pipeline = Pipeline::new(
            metadata.clone(),
            acquirer.clone(),
            thumbnails.clone(),
            transcoder.clone(),
            tagger.clone(),
            save_path.clone(),
        )
        .with_temp_dir(temp_dir.path());

        Self {
            pipeline: Arc::new(pipeline),
            metadata,
            acquirer,
            thumbnails,
            transcoder,
            tagger,
            save_path,
            temp_dir,
            out_dir,
        }
    }

    /// Runs one request and returns every notification in order
    pub async fn run(&self, format: OutputFormat) -> Vec<Notification> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.pipeline
            .run(DownloadRequest::new(SOURCE_URL, format), &tx)
            .await;
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    pub fn temp_files(&self) -> Vec<PathBuf> {
        crate::mocks::files_in(self.temp_dir.path())
    }

    pub fn output_files(&self) -> Vec<PathBuf> {
        crate::mocks::files_in(self.out_dir.path())
    }
}

/// Status messages in emission order
pub fn statuses(events: &[Notification]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            Notification::Status(message) => Some(message.clone()),
            _ => None,
        })
        .collect()
}

/// Progress values in emission order
pub fn progress_values(events: &[Notification]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            Notification::Progress(p) => Some(*p),
            _ => None,
        })
        .collect()
}
