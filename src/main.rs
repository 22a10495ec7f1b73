use anyhow::Result;
use clap::CommandFactory;
use dotenvy::dotenv;
use std::sync::Arc;

use mediagrab::cli::{Cli, Commands, TerminalPresenter, TerminalSavePrompt};
use mediagrab::core::process::probe_tool_version;
use mediagrab::core::{config, init_logger, log_tool_configuration};
use mediagrab::download::{DownloadRequest, Notification, OutputFormat, Pipeline};

/// Main entry point for the mediagrab CLI
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, HTTP client creation).
#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present, before any config static is read
    let _ = dotenv();

    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH, *config::LOG_LEVEL)?;
    log_tool_configuration();

    let exit_code = match cli.command {
        Some(Commands::Download {
            url,
            format,
            output,
            yes,
            json,
        }) => run_download(url, format, output, yes, json).await?,
        Some(Commands::CheckTools) => run_check_tools().await,
        None => {
            Cli::command().print_help()?;
            println!();
            0
        }
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}

/// Run one download and render its notifications; returns the process exit code
async fn run_download(url: String, format: OutputFormat, output: Option<String>, yes: bool, json: bool) -> Result<i32> {
    log::info!("CLI download: {} as {}", url, format);

    let prompt = TerminalSavePrompt::new(output, yes);
    let pipeline = Arc::new(
        Pipeline::system(Arc::new(prompt)).map_err(|e| anyhow::anyhow!("Failed to set up pipeline: {}", e))?,
    );

    let (rx, handle) = pipeline.start(DownloadRequest::new(url, format));
    let rendered = TerminalPresenter::new(json).drive(rx).await;
    let terminal = handle
        .await
        .map_err(|e| anyhow::anyhow!("Download task failed: {}", e))?;

    if rendered.as_ref() != Some(&terminal) {
        log::warn!("Rendered outcome {:?} differs from returned {:?}", rendered, terminal);
    }

    Ok(match terminal {
        Notification::Error(_) => 1,
        _ => 0,
    })
}

/// Print the detected tool versions; non-zero when one of them is missing
async fn run_check_tools() -> i32 {
    let timeout = config::audio::ffprobe_timeout();
    let tools = [
        ("yt-dlp", config::YTDL_BIN.as_str(), "--version"),
        ("ffmpeg", config::FFMPEG_BIN.as_str(), "-version"),
        ("ffprobe", config::FFPROBE_BIN.as_str(), "-version"),
    ];

    let mut missing = 0;
    for (tool, bin, version_arg) in tools {
        match probe_tool_version(bin, tool, version_arg, timeout).await {
            Ok(version) => println!("✅ {:<8} {} ({})", tool, version, bin),
            Err(e) => {
                missing += 1;
                log::error!("{} check failed: {}", tool, e);
                println!("❌ {:<8} {}", tool, e);
            }
        }
    }

    if missing == 0 {
        0
    } else {
        1
    }
}
