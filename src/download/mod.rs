//! Download, conversion and tagging pipeline

pub mod artifacts;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod request;
pub mod tags;
pub mod thumbnail;
pub mod transcode;
pub mod ytdlp;
pub mod ytdlp_errors;

// Re-exports for convenience
pub use error::DownloadError;
pub use metadata::{MediaMetadata, MetadataFetcher};
pub use pipeline::{Pipeline, SavePathChooser};
pub use progress::Notification;
pub use request::{DownloadRequest, OutputFormat};
