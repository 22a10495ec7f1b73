use crate::download::error::DownloadError;
use thiserror::Error;

/// Centralized error types for the application
///
/// Pipeline stages report `DownloadError`; everything the binary does around
/// the pipeline (argument validation, printing notifications) funnels into
/// this enum.
///
/// # Example
///
/// ```
/// use mediagrab::core::error::AppError;
///
/// let err = AppError::Validation("unknown format: wav".to_string());
/// assert_eq!(err.to_string(), "Validation error: unknown format: wav");
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Download pipeline errors
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_wraps() {
        let err: AppError = DownloadError::Transcode("ffmpeg exited with 1".into()).into();
        assert_eq!(err.to_string(), "Download error: ffmpeg exited with 1");
    }

    #[test]
    fn test_json_error_wraps() {
        let err: AppError = serde_json::from_str::<u8>("\"x\"").unwrap_err().into();
        assert!(matches!(err, AppError::Json(_)));
        assert!(err.to_string().starts_with("JSON error: "));
    }

    #[test]
    fn test_io_error_wraps() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::Other, "disk full").into();
        assert!(err.to_string().contains("disk full"));
    }
}
