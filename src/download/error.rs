use thiserror::Error;

/// Structured error type for pipeline stages.
///
/// Each variant corresponds to one external boundary so the orchestrator can
/// decide what is fatal (metadata, acquisition, transcoding) and what is
/// recovered locally (thumbnail, tags).
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Metadata extraction failed (bad/unsupported URL, private or unavailable video)
    #[error("{0}")]
    Extraction(String),
    /// The download tool failed while fetching media
    #[error("{0}")]
    Acquisition(String),
    /// Connectivity or timeout failures, including the thumbnail fetch
    #[error("{0}")]
    Network(String),
    /// The conversion tool failed
    #[error("{0}")]
    Transcode(String),
    /// Tags could not be written (non-fatal)
    #[error("{0}")]
    TagWrite(String),
    /// An external binary could not be started
    #[error("{tool} is not installed or not on PATH")]
    ToolMissing { tool: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Returns subcategory for logging
    pub fn subcategory(&self) -> &'static str {
        match self {
            DownloadError::Extraction(_) => "extraction",
            DownloadError::Acquisition(_) => "acquisition",
            DownloadError::Network(_) => "network",
            DownloadError::Transcode(_) => "transcode",
            DownloadError::TagWrite(_) => "tag_write",
            DownloadError::ToolMissing { .. } => "tool_missing",
            DownloadError::Io(_) => "io",
        }
    }

    /// Maps a spawn failure to `ToolMissing` when the binary is absent.
    pub fn from_spawn(tool: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            DownloadError::ToolMissing { tool: tool.to_string() }
        } else {
            DownloadError::Io(err)
        }
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(err: reqwest::Error) -> Self {
        DownloadError::Network(format!("network error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_display() {
        let err = DownloadError::Acquisition("yt-dlp failed".into());
        assert_eq!(err.to_string(), "yt-dlp failed");
    }

    #[test]
    fn test_download_error_subcategory() {
        assert_eq!(DownloadError::Extraction("".into()).subcategory(), "extraction");
        assert_eq!(DownloadError::Acquisition("".into()).subcategory(), "acquisition");
        assert_eq!(DownloadError::Network("".into()).subcategory(), "network");
        assert_eq!(DownloadError::Transcode("".into()).subcategory(), "transcode");
        assert_eq!(DownloadError::TagWrite("".into()).subcategory(), "tag_write");
    }

    #[test]
    fn test_from_spawn_not_found() {
        let err = DownloadError::from_spawn("yt-dlp", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(matches!(err, DownloadError::ToolMissing { ref tool } if tool == "yt-dlp"));
        assert_eq!(err.to_string(), "yt-dlp is not installed or not on PATH");
    }

    #[test]
    fn test_from_spawn_other_io() {
        let err = DownloadError::from_spawn("ffmpeg", std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(matches!(err, DownloadError::Io(_)));
    }
}
