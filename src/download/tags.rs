//! ID3 tagging for finished MP3 files.

use std::path::Path;

use id3::TagLike;

use crate::core::config;
use crate::download::error::DownloadError;

/// Descriptive metadata embedded into an MP3
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackTags {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: i32,
    pub comment: String,
    /// JPEG front cover
    pub cover: Option<Vec<u8>>,
}

/// Writes tags into a file.
///
/// Tagging is best-effort: implementations report failure as `false` and the
/// caller keeps going.
pub trait TagWriter: Send + Sync {
    fn write(&self, path: &Path, tags: &TrackTags) -> bool;
}

/// `TagWriter` producing ID3v2.4 tags with the `id3` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct Id3TagWriter;

impl Id3TagWriter {
    pub fn new() -> Self {
        Self
    }

    fn build_tag(tags: &TrackTags) -> id3::Tag {
        let mut tag = id3::Tag::new();

        tag.set_title(tags.title.as_str());
        tag.set_artist(tags.artist.as_str());
        tag.set_album(tags.album.as_str());
        tag.set_year(tags.year);

        tag.add_frame(id3::frame::Comment {
            lang: config::audio::COMMENT_LANG.to_string(),
            description: String::new(),
            text: tags.comment.clone(),
        });

        if let Some(data) = &tags.cover {
            tag.add_frame(id3::frame::Picture {
                mime_type: "image/jpeg".to_string(),
                picture_type: id3::frame::PictureType::CoverFront,
                description: "Cover".to_string(),
                data: data.clone(),
            });
        }

        tag
    }

    /// Like `write`, but keeps the error for logging
    pub fn try_write(&self, path: &Path, tags: &TrackTags) -> Result<(), DownloadError> {
        Self::build_tag(tags)
            .write_to_path(path, id3::Version::Id3v24)
            .map_err(|e| DownloadError::TagWrite(format!("failed to write ID3 tags to {}: {}", path.display(), e)))
    }
}

impl TagWriter for Id3TagWriter {
    fn write(&self, path: &Path, tags: &TrackTags) -> bool {
        match self.try_write(path, tags) {
            Ok(()) => {
                log::info!(
                    "Wrote ID3 tags to {} (cover: {})",
                    path.display(),
                    if tags.cover.is_some() { "yes" } else { "no" }
                );
                true
            }
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }
}
