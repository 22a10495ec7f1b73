use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::core::config;
use crate::core::error::AppResult;
use crate::download::pipeline::SavePathChooser;
use crate::download::progress::{progress_bar, Notification};
use crate::download::request::OutputFormat;

#[derive(Parser)]
#[command(name = "mediagrab")]
#[command(author, version, about = "Download media by URL as MP4 video or tagged MP3 audio", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download a URL as mp4 or mp3
    Download {
        /// Source URL
        url: String,

        /// Output format: mp4 or mp3
        #[arg(short, long, default_value = "mp4")]
        format: OutputFormat,

        /// Write to this path instead of asking
        #[arg(short, long)]
        output: Option<String>,

        /// Accept the proposed file name in DOWNLOAD_FOLDER without asking
        #[arg(short = 'y', long)]
        yes: bool,

        /// Print notifications as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Print yt-dlp, ffmpeg and ffprobe versions
    CheckTools,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Save location chooser for the terminal.
///
/// `--output` wins, then `--yes` (default name in the download folder),
/// otherwise the user is asked on stderr.
#[derive(Debug, Clone)]
pub struct TerminalSavePrompt {
    output: Option<String>,
    assume_yes: bool,
    download_folder: PathBuf,
}

impl TerminalSavePrompt {
    pub fn new(output: Option<String>, assume_yes: bool) -> Self {
        Self {
            output,
            assume_yes,
            download_folder: config::DOWNLOAD_FOLDER.clone(),
        }
    }

    pub fn with_download_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.download_folder = folder.into();
        self
    }
}

fn expand_user_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw.trim()).into_owned())
}

/// Turns a prompt answer into a path.
///
/// `None` (end of input) and `q` cancel, an empty line takes the default, an
/// existing directory gets the default file name appended.
pub fn interpret_answer(answer: Option<&str>, default_path: &Path) -> Option<PathBuf> {
    let answer = answer?.trim();
    if answer.is_empty() {
        return Some(default_path.to_path_buf());
    }
    if answer.eq_ignore_ascii_case("q") {
        return None;
    }

    let path = expand_user_path(answer);
    if path.is_dir() {
        if let Some(name) = default_path.file_name() {
            return Some(path.join(name));
        }
    }
    Some(path)
}

/// Prints `prompt` to stderr and reads one line; `None` on end of input or read error.
fn read_answer(prompt: &str) -> Option<String> {
    let mut stderr = std::io::stderr();
    let _ = write!(stderr, "{}", prompt);
    let _ = stderr.flush();

    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line),
        Err(e) => {
            log::warn!("Failed to read save path from stdin: {}", e);
            None
        }
    }
}

#[async_trait]
impl SavePathChooser for TerminalSavePrompt {
    async fn choose(&self, default_file_name: &str, format: OutputFormat) -> Option<PathBuf> {
        if let Some(output) = &self.output {
            return Some(expand_user_path(output));
        }

        let default_path = self.download_folder.join(default_file_name);
        if self.assume_yes {
            return Some(default_path);
        }

        let prompt = format!(
            "Save {} as [{}] (Enter to accept, q to cancel): ",
            format.label(),
            default_path.display()
        );
        let answer = tokio::task::spawn_blocking(move || read_answer(&prompt))
            .await
            .ok()
            .flatten();
        interpret_answer(answer.as_deref(), &default_path)
    }
}

/// Renders notifications on the terminal, as text or JSON lines
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    json: bool,
    bar_open: bool,
}

impl TerminalPresenter {
    pub fn new(json: bool) -> Self {
        Self { json, bar_open: false }
    }

    /// Text to write for one notification.
    ///
    /// The progress bar redraws in place with `\r`; anything after it starts
    /// on a fresh line.
    pub fn render(&mut self, notification: &Notification) -> AppResult<String> {
        if self.json {
            return Ok(format!("{}\n", serde_json::to_string(notification)?));
        }

        if let Notification::Progress(percent) = notification {
            self.bar_open = true;
            return Ok(format!("\r{} {:>3}%", progress_bar(*percent), percent));
        }

        let prefix = if std::mem::take(&mut self.bar_open) { "\n" } else { "" };
        let body = match notification {
            Notification::Status(message) => message.clone(),
            Notification::Cancelled => "🚫 Cancelled: no save location chosen".to_string(),
            Notification::Complete(path) => format!("✅ Saved to {}", path.display()),
            Notification::Error(message) => format!("❌ {}", message),
            Notification::Progress(_) => String::new(),
        };
        Ok(format!("{}{}\n", prefix, body))
    }

    /// Renders one notification into `out` and flushes it
    pub fn write_to<W: Write>(&mut self, notification: &Notification, out: &mut W) -> AppResult<()> {
        let text = self.render(notification)?;
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Prints every notification until the channel closes; returns the terminal one.
    pub async fn drive(mut self, mut rx: mpsc::UnboundedReceiver<Notification>) -> Option<Notification> {
        let mut terminal = None;
        while let Some(notification) = rx.recv().await {
            if let Err(e) = self.write_to(&notification, &mut std::io::stdout().lock()) {
                log::warn!("Failed to print notification {:?}: {}", notification, e);
            }
            if notification.is_terminal() {
                terminal = Some(notification);
            }
        }
        terminal
    }
}
