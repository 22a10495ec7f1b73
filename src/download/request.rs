use std::fmt;
use std::str::FromStr;

use crate::core::error::AppError;

/// Output formats the pipeline can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Muxed video+audio, written straight by yt-dlp
    #[default]
    Mp4,
    /// Audio transcoded by ffmpeg and tagged with ID3
    Mp3,
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Mp3 => "mp3",
        }
    }

    /// Display label, e.g. for the save prompt
    pub fn label(&self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "MP4",
            OutputFormat::Mp3 => "MP3",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(OutputFormat::Mp4),
            "mp3" => Ok(OutputFormat::Mp3),
            other => Err(AppError::Validation(format!(
                "unsupported format '{}', expected mp3 or mp4",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One user request: a source URL and the wanted output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub format: OutputFormat,
}

impl DownloadRequest {
    /// Surrounding whitespace is stripped from `url` so every stage sees the same value
    pub fn new(url: impl Into<String>, format: OutputFormat) -> Self {
        let url = url.into();
        let trimmed = url.trim();
        Self {
            url: if trimmed.len() == url.len() { url } else { trimmed.to_string() },
            format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("mp3".parse::<OutputFormat>().unwrap(), OutputFormat::Mp3);
        assert_eq!("MP4".parse::<OutputFormat>().unwrap(), OutputFormat::Mp4);
        assert_eq!(" Mp3 ".parse::<OutputFormat>().unwrap(), OutputFormat::Mp3);
    }

    #[test]
    fn test_output_format_rejects_others() {
        let err = "wav".parse::<OutputFormat>().unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("wav")));
    }

    #[test]
    fn test_output_format_extension_and_label() {
        assert_eq!(OutputFormat::Mp3.extension(), "mp3");
        assert_eq!(OutputFormat::Mp4.label(), "MP4");
        assert_eq!(OutputFormat::Mp3.to_string(), "mp3");
    }

    #[test]
    fn test_download_request_new() {
        let req = DownloadRequest::new("https://youtu.be/abc", OutputFormat::Mp3);
        assert_eq!(req.url, "https://youtu.be/abc");
        assert_eq!(req.format, OutputFormat::Mp3);
    }

    #[test]
    fn test_download_request_trims_url() {
        let req = DownloadRequest::new("  https://youtu.be/abc\n", OutputFormat::Mp4);
        assert_eq!(req.url, "https://youtu.be/abc");
    }
}
