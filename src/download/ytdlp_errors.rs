//! Maps pipeline failures to the short messages shown to the user.
//!
//! yt-dlp and ffmpeg report problems as free text, so classification is a
//! case-insensitive substring match on the failure message. The first match
//! wins; the table order matters.

use crate::download::error::DownloadError;

/// Kinds of failure the user is told about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The extractor doesn't understand the URL
    UnsupportedUrl,
    /// The video exists but is private
    PrivateVideo,
    /// The video is gone, region-locked or otherwise unavailable
    VideoUnavailable,
    /// Connectivity problems and timeouts
    Network,
    /// Age-gated content that needs a signed-in session
    AgeRestricted,
    /// Anything else
    Unknown,
}

/// Analyses a failure message and determines its kind
///
/// # Parameters
/// - `message`: the error text (usually the tail of the tool's stderr)
///
/// # Returns
/// - `FailureKind`: the first matching kind, `Unknown` when nothing matches
pub fn analyze_failure(message: &str) -> FailureKind {
    let lower = message.to_lowercase();

    if lower.contains("unsupported url") {
        return FailureKind::UnsupportedUrl;
    }

    // Must run before "video unavailable": yt-dlp prints both for private videos
    if lower.contains("private video") {
        return FailureKind::PrivateVideo;
    }

    if lower.contains("video unavailable") {
        return FailureKind::VideoUnavailable;
    }

    if lower.contains("network") || lower.contains("timeout") {
        return FailureKind::Network;
    }

    if lower.contains("sign in to confirm") {
        return FailureKind::AgeRestricted;
    }

    FailureKind::Unknown
}

/// Returns the user-facing message for a failure kind
pub fn user_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::UnsupportedUrl => "Invalid YouTube URL. Please check the link and try again.",
        FailureKind::PrivateVideo => "This video is private and cannot be downloaded.",
        FailureKind::VideoUnavailable => "This video is unavailable or private.",
        FailureKind::Network => "Network error. Please check your connection and try again.",
        FailureKind::AgeRestricted => "Age-restricted video. Unable to download without authentication.",
        FailureKind::Unknown => "An error occurred during download",
    }
}

/// Classifies a pipeline error straight into its user-facing message
pub fn classify_error(err: &DownloadError) -> &'static str {
    let kind = analyze_failure(&err.to_string());
    log::debug!("Classified {} failure as {:?}", err.subcategory(), kind);
    user_message(kind)
}
