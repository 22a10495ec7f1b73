//! Logging initialization and tool configuration checks
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Tool configuration logging at startup

use anyhow::Result;
use simplelog::*;
use std::fs::File;
use std::path::Path;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// The terminal logger uses `console_level` so it stays out of the way of the
/// progress display; the file logger always records `Info` and above.
///
/// # Arguments
/// * `log_file_path` - Path to the log file
/// * `console_level` - Minimum level printed to the terminal
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &Path, console_level: LevelFilter) -> Result<()> {
    if let Some(parent) = log_file_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("Failed to create log directory {}: {}", parent.display(), e))?;
        }
    }
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(console_level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the resolved tool and directory configuration at startup
pub fn log_tool_configuration() {
    log::info!("yt-dlp binary: {}", config::YTDL_BIN.as_str());
    log::info!("ffmpeg binary: {}", config::FFMPEG_BIN.as_str());
    log::info!("ffprobe binary: {}", config::FFPROBE_BIN.as_str());
    match config::FFMPEG_LOCATION.as_deref() {
        Some(location) => log::info!("yt-dlp will use ffmpeg at {}", location),
        None => log::debug!("yt-dlp will look up ffmpeg on PATH"),
    }
    log::info!("Temp directory: {}", config::TEMP_FILES_DIR.display());
    log::info!("Download folder: {}", config::DOWNLOAD_FOLDER.display());

    if !config::TEMP_FILES_DIR.is_dir() {
        log::warn!(
            "Temp directory {} does not exist; it will be created on first use",
            config::TEMP_FILES_DIR.display()
        );
    }
}
