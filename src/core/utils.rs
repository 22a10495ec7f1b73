use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Everything that is not an ASCII word character, whitespace or hyphen.
static TITLE_STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s-]").expect("title strip regex"));

/// Stem used when a title sanitises down to nothing.
pub const UNTITLED: &str = "Untitled";

/// Strips a media title down to a safe default filename stem.
///
/// ASCII word characters (letters, digits, underscore), whitespace and
/// hyphens are kept; everything else, accented and non-Latin letters
/// included, is removed and the result is trimmed.
///
/// # Example
///
/// ```
/// use mediagrab::core::utils::sanitize_title;
///
/// assert_eq!(sanitize_title("Foo: Bar? <Live>"), "Foo Bar Live");
/// ```
pub fn sanitize_title(title: &str) -> String {
    let stripped = TITLE_STRIP_RE.replace_all(title, "");
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Restricts a chosen path to the requested extension.
///
/// Paths already ending in `.{extension}` (any case) are returned unchanged;
/// otherwise `.{extension}` is appended, keeping whatever the user typed.
pub fn with_extension_filter(path: &Path, extension: &str) -> PathBuf {
    let matches = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false);

    if matches {
        path.to_path_buf()
    } else {
        let mut raw = path.as_os_str().to_os_string();
        raw.push(".");
        raw.push(extension);
        PathBuf::from(raw)
    }
}

/// Formats a byte count as MiB for log lines.
pub fn format_mib(bytes: u64) -> String {
    format!("{:.2} MiB", bytes as f64 / (1024.0 * 1024.0))
}
