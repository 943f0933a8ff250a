//! Durable per-day audit trail of fetches, matches and notifications.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use pge_outage_client::{FetchResult, TIMESTAMP_FORMAT};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Sink for structured fetch entries and free-text leveled messages.
///
/// Implementations must not fail the caller: write problems are their own
/// business.
#[async_trait]
pub trait Journal: Send + Sync {
    async fn record_fetch(&self, result: &FetchResult);

    async fn record_message(&self, at: NaiveDateTime, level: LogLevel, message: &str);
}

/// Appends entries to `<dir>/<YYYYMMDD>-log.txt`, one file per local date.
pub struct DailyLogFile {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl DailyLogFile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, at: NaiveDateTime) -> PathBuf {
        self.dir.join(format!("{}-log.txt", at.format("%Y%m%d")))
    }

    /// Append one entry with a single write. Entries are separated by a blank
    /// line, so a leading newline is added when the file already has content.
    async fn append(&self, at: NaiveDateTime, entry: &str) -> std::io::Result<PathBuf> {
        let _guard = self.write_lock.lock().await;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(at);

        let has_content = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.len() > 0,
            Err(_) => false,
        };

        let mut buf = String::with_capacity(entry.len() + 1);
        if has_content {
            buf.push('\n');
        }
        buf.push_str(entry);

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(buf.as_bytes()).await?;
        file.flush().await?;

        Ok(path)
    }
}

#[async_trait]
impl Journal for DailyLogFile {
    async fn record_fetch(&self, result: &FetchResult) {
        if result.is_failure() {
            error!(
                url = %result.url,
                status = ?result.status_code,
                error = result.error.as_deref().unwrap_or(""),
                "Outage fetch failed"
            );
        } else {
            info!(url = %result.url, status = ?result.status_code, "Outage fetch complete");
        }

        let entry = format_fetch_entry(result);
        if let Err(e) = self.append(result.requested_at, &entry).await {
            warn!(error = %e, dir = %self.dir.display(), "Failed to write fetch log entry");
        }
    }

    async fn record_message(&self, at: NaiveDateTime, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => info!("{message}"),
            LogLevel::Error => error!("{message}"),
        }

        let entry = format_message_entry(at, level, message);
        if let Err(e) = self.append(at, &entry).await {
            warn!(error = %e, dir = %self.dir.display(), "Failed to write log message");
        }
    }
}

pub fn fetch_level(result: &FetchResult) -> LogLevel {
    if result.is_failure() {
        LogLevel::Error
    } else {
        LogLevel::Info
    }
}

/// Header lines, a blank line, then the response body (pretty JSON when it
/// decoded, raw text otherwise).
pub fn format_fetch_entry(result: &FetchResult) -> String {
    let ts = result.requested_at.format(TIMESTAMP_FORMAT);
    let status = result
        .status_code
        .map(|s| s.to_string())
        .unwrap_or_else(|| "ERROR".to_string());

    let mut lines = vec![
        format!("{ts} [{}] ", fetch_level(result)),
        format!("requested_at={ts}"),
        format!("url={}", result.url),
        format!("status_code={status}"),
    ];
    if let Some(err) = &result.error {
        lines.push(format!("error={err}"));
    }

    let body = match (&result.json_body, &result.text_body) {
        (Some(json), _) => serde_json::to_string_pretty(json).unwrap_or_default(),
        (None, Some(text)) => text.clone(),
        (None, None) => String::new(),
    };

    let mut entry = lines.join("\n");
    entry.push_str("\n\n");
    if !body.is_empty() {
        entry.push_str(&body);
        entry.push('\n');
    }
    entry
}

pub fn format_message_entry(at: NaiveDateTime, level: LogLevel, message: &str) -> String {
    format!("{} [{level}] \n{message}\n\n", at.format(TIMESTAMP_FORMAT))
}
