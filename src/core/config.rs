use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Expands a leading `~` and turns the result into a path.
fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// ffmpeg binary path
/// Read from FFMPEG_BIN environment variable, defaults to "ffmpeg" on PATH
pub static FFMPEG_BIN: Lazy<String> = Lazy::new(|| env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()));

/// ffprobe binary path
/// Read from FFPROBE_BIN environment variable, defaults to "ffprobe" on PATH
pub static FFPROBE_BIN: Lazy<String> =
    Lazy::new(|| env::var("FFPROBE_BIN").unwrap_or_else(|_| "ffprobe".to_string()));

/// Explicit ffmpeg location handed to yt-dlp via `--ffmpeg-location`.
///
/// Only set when FFMPEG_BIN is configured; otherwise yt-dlp finds ffmpeg on PATH itself.
pub static FFMPEG_LOCATION: Lazy<Option<String>> = Lazy::new(|| {
    env::var("FFMPEG_BIN")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| shellexpand::tilde(&v).into_owned())
});

/// Temporary files directory for in-flight artifacts (raw audio, cover art)
/// Read from TEMP_FILES_DIR environment variable, defaults to the platform temp dir
/// Supports tilde (~) expansion
pub static TEMP_FILES_DIR: Lazy<PathBuf> = Lazy::new(|| match env::var("TEMP_FILES_DIR") {
    Ok(dir) if !dir.trim().is_empty() => expand_path(&dir),
    _ => env::temp_dir(),
});

/// Folder proposed for output files when the user accepts the default name
/// Read from DOWNLOAD_FOLDER environment variable, defaults to the current directory
pub static DOWNLOAD_FOLDER: Lazy<PathBuf> = Lazy::new(|| match env::var("DOWNLOAD_FOLDER") {
    Ok(dir) if !dir.trim().is_empty() => expand_path(&dir),
    _ => PathBuf::from("."),
});

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: <temp dir>/mediagrab.log
pub static LOG_FILE_PATH: Lazy<PathBuf> = Lazy::new(|| match env::var("LOG_FILE_PATH") {
    Ok(path) if !path.trim().is_empty() => expand_path(&path),
    _ => env::temp_dir().join("mediagrab.log"),
});

/// Terminal log level (error, warn, info, debug, trace)
/// Read from LOG_LEVEL environment variable, defaults to "warn" so log lines
/// don't interleave with the progress bar
pub static LOG_LEVEL: Lazy<log::LevelFilter> = Lazy::new(|| {
    env::var("LOG_LEVEL")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(log::LevelFilter::Warn)
});

/// Download configuration
pub mod download {
    use super::Duration;

    /// Timeout for the yt-dlp metadata query (in seconds)
    pub const YTDLP_TIMEOUT_SECS: u64 = 240; // 4 minutes, slow extractors need it

    /// Socket timeout handed to yt-dlp for media transfers (in seconds)
    pub const SOCKET_TIMEOUT_SECS: u64 = 30;

    /// Number of stderr lines kept from a tool run for error reporting
    pub const STDERR_TAIL_LINES: usize = 200;

    /// yt-dlp metadata timeout duration
    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(YTDLP_TIMEOUT_SECS)
    }
}

/// Audio conversion and tagging configuration
pub mod audio {
    use super::Duration;

    /// Fixed MP3 bitrate
    pub const MP3_BITRATE: &str = "320k";

    /// Container the raw audio stream is extracted to before conversion
    pub const INTERMEDIATE_CONTAINER: &str = "m4a";

    /// Artist tag used when the extractor reports no uploader
    pub const DEFAULT_ARTIST: &str = "Unknown Artist";

    /// Album tag used when the extractor reports no album
    pub const DEFAULT_ALBUM: &str = "YouTube Download";

    /// ID3 comment language
    pub const COMMENT_LANG: &str = "eng";

    /// Timeout for ffprobe duration queries (in seconds)
    pub const FFPROBE_TIMEOUT_SECS: u64 = 30;

    /// ffprobe timeout duration
    pub fn ffprobe_timeout() -> Duration {
        Duration::from_secs(FFPROBE_TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Whole-request timeout for the thumbnail fetch (in seconds)
    pub const THUMBNAIL_TIMEOUT_SECS: u64 = 30;

    /// Connect timeout for the thumbnail fetch (in seconds)
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    /// User agent sent with the thumbnail request
    pub const USER_AGENT: &str = concat!("mediagrab/", env!("CARGO_PKG_VERSION"));

    /// Thumbnail timeout duration
    pub fn thumbnail_timeout() -> Duration {
        Duration::from_secs(THUMBNAIL_TIMEOUT_SECS)
    }

    /// Connect timeout duration
    pub fn connect_timeout() -> Duration {
        Duration::from_secs(CONNECT_TIMEOUT_SECS)
    }
}
