//! Mock implementations of the pipeline collaborators
//!
//! This module provides fakes for yt-dlp, ffmpeg, the thumbnail fetch, the
//! tag writer and the save prompt, so the orchestrator can be tested without
//! external tools or network access.

pub mod mock_tools;

#[allow(unused_imports)]
pub use mock_tools::{
    files_in, AcquireCall, ConvertCall, MockAcquirer, MockMetadataFetcher, MockSavePath, MockTagWriter,
    MockThumbnails, MockTranscoder, TagCall, COVER_BYTES, MEDIA_BYTES,
};
