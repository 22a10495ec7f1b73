//! Download pipeline orchestrator.
//!
//! One request runs as a single sequential pipeline:
//!   fetch metadata → choose save path → acquire media
//!   → (mp3 only) fetch cover art → transcode → tag
//!   → clean temp files → terminal notification
//!
//! Collaborators are trait objects held by `Pipeline`, so the binary wires in
//! yt-dlp/ffmpeg/id3/reqwest and tests wire in fakes. Everything the user sees
//! goes through the `Notification` channel.

use async_trait::async_trait;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::config;
use crate::core::utils::{sanitize_title, with_extension_filter};
use crate::download::artifacts::{ArtifactKind, TempArtifacts};
use crate::download::error::DownloadError;
use crate::download::metadata::{MediaMetadata, MetadataFetcher, YtDlpMetadataFetcher};
use crate::download::progress::{Notification, ProgressGate};
use crate::download::request::{DownloadRequest, OutputFormat};
use crate::download::tags::{Id3TagWriter, TagWriter, TrackTags};
use crate::download::thumbnail::{HttpThumbnailRetriever, ThumbnailRetriever};
use crate::download::transcode::{AudioTarget, FfmpegTranscoder, Transcoder};
use crate::download::ytdlp::{FormatSelector, MediaAcquirer, YtDlpAcquirer};
use crate::download::ytdlp_errors::classify_error;

pub const STATUS_FETCHING_INFO: &str = "Fetching video information...";
pub const STATUS_DOWNLOADING_VIDEO: &str = "Downloading video...";
pub const STATUS_PROCESSING_VIDEO: &str = "Processing video...";
pub const STATUS_DOWNLOADING_AUDIO: &str = "Downloading audio...";
pub const STATUS_DOWNLOADING_COVER: &str = "Downloading cover art...";
pub const STATUS_CONVERTING: &str = "Converting to MP3 and adding metadata...";
pub const STATUS_TAGGING: &str = "Adding metadata and cover art...";

/// Asks the user where the output should go.
///
/// `None` means the user backed out; the run then ends with `Cancelled`.
#[async_trait]
pub trait SavePathChooser: Send + Sync {
    async fn choose(&self, default_file_name: &str, format: OutputFormat) -> Option<PathBuf>;
}

/// The download-convert-tag pipeline and its collaborators
pub struct Pipeline {
    metadata: Arc<dyn MetadataFetcher>,
    acquirer: Arc<dyn MediaAcquirer>,
    thumbnails: Arc<dyn ThumbnailRetriever>,
    transcoder: Arc<dyn Transcoder>,
    tagger: Arc<dyn TagWriter>,
    save_paths: Arc<dyn SavePathChooser>,
    temp_dir: PathBuf,
}

impl Pipeline {
    /// Assembles a pipeline using the configured temp directory
    pub fn new(
        metadata: Arc<dyn MetadataFetcher>,
        acquirer: Arc<dyn MediaAcquirer>,
        thumbnails: Arc<dyn ThumbnailRetriever>,
        transcoder: Arc<dyn Transcoder>,
        tagger: Arc<dyn TagWriter>,
        save_paths: Arc<dyn SavePathChooser>,
    ) -> Self {
        Self {
            metadata,
            acquirer,
            thumbnails,
            transcoder,
            tagger,
            save_paths,
            temp_dir: config::TEMP_FILES_DIR.clone(),
        }
    }

    /// Pipeline backed by yt-dlp, ffmpeg, reqwest and id3
    pub fn system(save_paths: Arc<dyn SavePathChooser>) -> Result<Self, DownloadError> {
        Ok(Self::new(
            Arc::new(YtDlpMetadataFetcher::new()),
            Arc::new(YtDlpAcquirer::new()),
            Arc::new(HttpThumbnailRetriever::new()?),
            Arc::new(FfmpegTranscoder::new()),
            Arc::new(Id3TagWriter::new()),
            save_paths,
        ))
    }

    /// Overrides where temp artifacts are written
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Spawns `run` on the runtime.
    ///
    /// Returns the notification stream and a handle resolving to the terminal notification.
    pub fn start(self: Arc<Self>, request: DownloadRequest) -> (mpsc::UnboundedReceiver<Notification>, JoinHandle<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move { self.run(request, &tx).await });
        (rx, handle)
    }

    /// Runs one request to completion.
    ///
    /// Sends `Status`/`Progress` notifications while working and exactly one
    /// terminal notification at the end, after temp files are gone. The
    /// terminal notification is also returned.
    pub async fn run(&self, request: DownloadRequest, events: &mpsc::UnboundedSender<Notification>) -> Notification {
        log::info!("Starting {} download for {}", request.format.label(), request.url);

        let mut artifacts = TempArtifacts::new(&self.temp_dir);
        let outcome = self.execute(&request, events, &mut artifacts).await;

        let removed = artifacts.cleanup();
        if removed > 0 {
            log::debug!("Cleaned up {} temp artifact(s)", removed);
        }

        let terminal = match outcome {
            Ok(Some(path)) => {
                log::info!("Download complete: {}", path.display());
                Notification::Complete(path)
            }
            Ok(None) => {
                log::info!("Download cancelled: no save location chosen");
                Notification::Cancelled
            }
            Err(e) => {
                log::error!("Download failed [{}] for {}: {}", e.subcategory(), request.url, e);
                Notification::Error(classify_error(&e).to_string())
            }
        };

        let _ = events.send(terminal.clone());
        terminal
    }

    async fn execute(
        &self,
        request: &DownloadRequest,
        events: &mpsc::UnboundedSender<Notification>,
        artifacts: &mut TempArtifacts,
    ) -> Result<Option<PathBuf>, DownloadError> {
        send_status(events, STATUS_FETCHING_INFO);
        let metadata = self.metadata.fetch(&request.url).await?;

        let extension = request.format.extension();
        let default_file_name = format!("{}.{}", sanitize_title(&metadata.title), extension);
        let Some(chosen) = self.save_paths.choose(&default_file_name, request.format).await else {
            return Ok(None);
        };
        let destination = with_extension_filter(&chosen, extension);
        log::info!("Saving to {}", destination.display());

        match request.format {
            OutputFormat::Mp4 => self.download_video(request, &destination, events).await?,
            OutputFormat::Mp3 => {
                self.download_audio(request, &metadata, &destination, events, artifacts)
                    .await?
            }
        }

        Ok(Some(destination))
    }

    async fn download_video(
        &self,
        request: &DownloadRequest,
        destination: &Path,
        events: &mpsc::UnboundedSender<Notification>,
    ) -> Result<(), DownloadError> {
        send_status(events, STATUS_DOWNLOADING_VIDEO);
        run_stage(events, |progress| {
            self.acquirer.acquire(
                &request.url,
                destination,
                FormatSelector::BestMuxedMp4,
                Some(OutputFormat::Mp4.extension()),
                progress,
            )
        })
        .await?;

        send_status(events, STATUS_PROCESSING_VIDEO);
        Ok(())
    }

    async fn download_audio(
        &self,
        request: &DownloadRequest,
        metadata: &MediaMetadata,
        destination: &Path,
        events: &mpsc::UnboundedSender<Notification>,
        artifacts: &mut TempArtifacts,
    ) -> Result<(), DownloadError> {
        send_status(events, STATUS_DOWNLOADING_AUDIO);
        let audio_path = artifacts.allocate(ArtifactKind::Audio)?;
        run_stage(events, |progress| {
            self.acquirer.acquire(
                &request.url,
                &audio_path,
                FormatSelector::BestAudio,
                Some(config::audio::INTERMEDIATE_CONTAINER),
                progress,
            )
        })
        .await?;

        send_status(events, STATUS_DOWNLOADING_COVER);
        let thumbnail_path = artifacts.allocate(ArtifactKind::Thumbnail)?;
        let cover = self.fetch_cover(metadata, &thumbnail_path).await;

        send_status(events, STATUS_CONVERTING);
        let target = AudioTarget::mp3();
        run_stage(events, |progress| {
            self.transcoder.convert(&audio_path, destination, &target, progress)
        })
        .await?;

        send_status(events, STATUS_TAGGING);
        let tags = build_track_tags(request, metadata, cover);
        let tagger = Arc::clone(&self.tagger);
        let tag_path = destination.to_path_buf();
        let tagged = tokio::task::spawn_blocking(move || tagger.write(&tag_path, &tags))
            .await
            .unwrap_or(false);
        if !tagged {
            log::warn!("Could not write tags to {}, keeping untagged file", destination.display());
        }

        Ok(())
    }

    /// Downloads cover art; every failure is logged and yields `None`.
    async fn fetch_cover(&self, metadata: &MediaMetadata, thumbnail_path: &Path) -> Option<Vec<u8>> {
        let Some(url) = metadata.thumbnail_url.as_deref() else {
            log::warn!("No thumbnail URL for '{}', continuing without cover art", metadata.title);
            return None;
        };

        if let Err(e) = self.thumbnails.fetch(url, thumbnail_path).await {
            log::warn!("Thumbnail download failed, continuing without cover art: {}", e);
        }

        if !thumbnail_path.exists() {
            return None;
        }
        match tokio::fs::read(thumbnail_path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log::warn!("Failed to read thumbnail {}: {}", thumbnail_path.display(), e);
                None
            }
        }
    }
}

/// Tag values for a finished MP3
pub fn build_track_tags(request: &DownloadRequest, metadata: &MediaMetadata, cover: Option<Vec<u8>>) -> TrackTags {
    TrackTags {
        title: metadata.title.clone(),
        artist: metadata
            .uploader
            .clone()
            .unwrap_or_else(|| config::audio::DEFAULT_ARTIST.to_string()),
        album: metadata
            .album
            .clone()
            .unwrap_or_else(|| config::audio::DEFAULT_ALBUM.to_string()),
        year: metadata.upload_year(),
        comment: format!("Downloaded from: {}", request.url),
        cover,
    }
}

fn send_status(events: &mpsc::UnboundedSender<Notification>, message: &str) {
    log::info!("{}", message);
    let _ = events.send(Notification::Status(message.to_string()));
}

/// Drains a stage's progress channel into `Progress` notifications through a fresh gate
async fn forward_progress(mut rx: mpsc::UnboundedReceiver<u8>, events: &mpsc::UnboundedSender<Notification>) {
    let mut gate = ProgressGate::new();
    while let Some(percent) = rx.recv().await {
        if let Some(percent) = gate.admit(percent) {
            let _ = events.send(Notification::Progress(percent));
        }
    }
}

/// Runs one stage while forwarding its progress.
///
/// The stage owns the sender; forwarding ends once the stage drops it.
async fn run_stage<T, F, Fut>(events: &mpsc::UnboundedSender<Notification>, stage: F) -> T
where
    F: FnOnce(mpsc::UnboundedSender<u8>) -> Fut,
    Fut: Future<Output = T>,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let (result, ()) = tokio::join!(stage(tx), forward_progress(rx, events));
    result
}
