//! Temporary files owned by a single pipeline run.
//!
//! The mp3 branch downloads raw audio and cover art into the temp directory
//! before producing the final file. `TempArtifacts` hands out those paths and
//! deletes whatever exists on disk when the run ends, including when the run
//! future is dropped half way.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::config;
use crate::download::error::DownloadError;

/// What a temp file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Extracted audio stream awaiting conversion
    Audio,
    /// Cover art for the ID3 tag
    Thumbnail,
}

impl ArtifactKind {
    fn file_name(&self, millis: i64) -> String {
        match self {
            ArtifactKind::Audio => format!("temp_audio_{}.{}", millis, config::audio::INTERMEDIATE_CONTAINER),
            ArtifactKind::Thumbnail => format!("thumbnail_{}.jpg", millis),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Audio => f.write_str("audio"),
            ArtifactKind::Thumbnail => f.write_str("thumbnail"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

/// At most one artifact per kind, removed by `cleanup` or on drop.
///
/// Names are keyed by the wall clock in milliseconds, so only one run at a
/// time should share a temp directory.
#[derive(Debug)]
pub struct TempArtifacts {
    dir: PathBuf,
    items: Vec<TempArtifact>,
}

impl TempArtifacts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            items: Vec::new(),
        }
    }

    /// Returns the path for `kind`, creating the temp directory on first use.
    ///
    /// Asking twice for the same kind returns the same path.
    pub fn allocate(&mut self, kind: ArtifactKind) -> Result<PathBuf, DownloadError> {
        if let Some(existing) = self.path(kind) {
            return Ok(existing.to_path_buf());
        }

        std::fs::create_dir_all(&self.dir)?;
        let millis = chrono::Utc::now().timestamp_millis();
        let path = self.dir.join(kind.file_name(millis));
        log::debug!("Allocated {} artifact {}", kind, path.display());

        self.items.push(TempArtifact {
            path: path.clone(),
            kind,
        });
        Ok(path)
    }

    pub fn path(&self, kind: ArtifactKind) -> Option<&Path> {
        self.items
            .iter()
            .find(|a| a.kind == kind)
            .map(|a| a.path.as_path())
    }

    pub fn artifacts(&self) -> &[TempArtifact] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Deletes every allocated artifact that exists on disk, together with
    /// any sibling sharing its stem (`<stem>.*`).
    ///
    /// yt-dlp writes through an `%(ext)s` template and leaves `.part`, `.ytdl`
    /// and pre-extraction files next to the expected path when it fails.
    /// Failures are logged and skipped. Returns the number of files removed.
    pub fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for artifact in self.items.drain(..) {
            for path in stem_siblings(&self.dir, &artifact.path) {
                match std::fs::remove_file(&path) {
                    Ok(()) => {
                        log::debug!("Removed {} artifact {}", artifact.kind, path.display());
                        removed += 1;
                    }
                    Err(e) => log::warn!("Failed to remove {} artifact {}: {}", artifact.kind, path.display(), e),
                }
            }
        }
        removed
    }
}

/// Files in `dir` named `<stem of path>.*`, plus `path` itself when it exists
fn stem_siblings(dir: &Path, path: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    if path.is_file() {
        found.push(path.to_path_buf());
    }

    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return found;
    };
    let prefix = format!("{}.", stem);

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to scan {} for leftovers: {}", dir.display(), e);
            }
            return found;
        }
    };

    for entry in entries.flatten() {
        let candidate = entry.path();
        let matches = entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with(&prefix))
            .unwrap_or(false);
        if matches && candidate.is_file() && !found.contains(&candidate) {
            found.push(candidate);
        }
    }
    found
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        if !self.items.is_empty() {
            self.cleanup();
        }
    }
}
