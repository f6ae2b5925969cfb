//! Fire-and-forget downloads into the media directory.
//!
//! The fetch utility runs detached from the playback session. Observers learn
//! about progress through [`DownloadEvent`]s and refresh the catalog once a
//! download finishes.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::broadcast;

const EVENT_BUFFER: usize = 16;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DownloadError {
    #[error("download URL is empty")]
    EmptyUrl,
    #[error("download URL must not start with '-': {0}")]
    OptionLike(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DownloadEvent {
    Started { url: String },
    /// `code` is `None` when the utility could not be started or was killed by a signal.
    Finished { url: String, code: Option<i32> },
}

#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub program: String,
    pub args: Vec<String>,
    pub dir: PathBuf,
}

#[derive(Clone)]
pub struct Downloader {
    config: Arc<DownloadConfig>,
    events: broadcast::Sender<DownloadEvent>,
}

/// Trimmed URL, refusing values the fetch utility would read as an option.
pub fn validate_url(url: &str) -> Result<&str, DownloadError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(DownloadError::EmptyUrl);
    }
    if url.starts_with('-') {
        return Err(DownloadError::OptionLike(url.to_string()));
    }
    Ok(url)
}

impl Downloader {
    pub fn new(config: DownloadConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            config: Arc::new(config),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DownloadEvent> {
        self.events.subscribe()
    }

    /// Start downloading `url` in the background. Returns once the job is queued.
    pub fn download(&self, url: &str) -> Result<(), DownloadError> {
        let url = validate_url(url)?.to_string();
        tracing::info!("Downloading {}", url);
        // No subscribers is fine; nobody is watching.
        let _ = self.events.send(DownloadEvent::Started { url: url.clone() });
        tokio::spawn(run(Arc::clone(&self.config), url, self.events.clone()));
        Ok(())
    }
}

async fn run(config: Arc<DownloadConfig>, url: String, events: broadcast::Sender<DownloadEvent>) {
    let code = match fetch(&config, &url).await {
        Ok(code) => code,
        Err(e) => {
            tracing::warn!("Failed to run {} for {}: {}", config.program, url, e);
            None
        }
    };
    tracing::info!("Download of {} ended with code {:?}", url, code);
    let _ = events.send(DownloadEvent::Finished { url, code });
}

async fn fetch(config: &DownloadConfig, url: &str) -> io::Result<Option<i32>> {
    let mut child = Command::new(&config.program)
        .args(&config.args)
        .arg(url)
        .current_dir(&config.dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (_, _, status) = tokio::join!(
        log_lines(stdout, false),
        log_lines(stderr, true),
        child.wait()
    );
    Ok(status?.code())
}

async fn log_lines<R: AsyncRead + Unpin>(stream: Option<R>, is_stderr: bool) {
    let Some(stream) = stream else {
        return;
    };
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if is_stderr {
            tracing::warn!("download error: {}", line);
        } else {
            tracing::debug!("downloading: {}", line);
        }
    }
}
