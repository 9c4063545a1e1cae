//! Structured logging and the request log files.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Emit one access line per request, plus an error block on faults
//! - Append those lines to daily files without blocking requests
//!
//! # File Layout
//! ```text
//! <dir>/logs_HTTP_2026-10-16.txt    yyyy-MM-dd HH:mm:ss | Request: GET /users | Response Status: 200
//! <dir>/logs_ERROR_2026-10-16.txt   access line + TraceId, exception text, separator
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber. `RUST_LOG` overrides `level`.
pub fn init_tracing(level: &str) {
    let default_filter = format!("users_api={level},tower_http={level}");
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Which daily file a record goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Info,
    Error,
}

impl LogCategory {
    pub fn file_name(self, date: &str) -> String {
        match self {
            LogCategory::Info => format!("logs_HTTP_{date}.txt"),
            LogCategory::Error => format!("logs_ERROR_{date}.txt"),
        }
    }
}

#[derive(Debug)]
struct LogRecord {
    category: LogCategory,
    date: String,
    text: String,
}

/// Details of a fault translated to a 500.
#[derive(Debug, Clone)]
pub struct Fault {
    pub trace_id: String,
    pub detail: String,
}

/// Sends log records to a background task that appends them to disk.
#[derive(Debug, Clone)]
pub struct FileLogSink {
    tx: mpsc::UnboundedSender<LogRecord>,
}

impl FileLogSink {
    /// Start the writer task for `dir`.
    ///
    /// The task ends once every clone of the sink has been dropped and the
    /// queue has drained.
    pub fn spawn(dir: impl Into<PathBuf>) -> (Self, JoinHandle<()>) {
        let dir = dir.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<LogRecord>();

        let handle = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                if let Err(e) = append(&dir, &record).await {
                    tracing::warn!(
                        error = %e,
                        dir = %dir.display(),
                        "Failed to write request log"
                    );
                }
            }
        });

        (Self { tx }, handle)
    }

    fn send(&self, category: LogCategory, date: String, text: String) {
        if self.tx.send(LogRecord { category, date, text }).is_err() {
            tracing::warn!("Request log writer has stopped; dropping record");
        }
    }
}

async fn append(dir: &Path, record: &LogRecord) -> std::io::Result<()> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(record.category.file_name(&record.date));
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(record.text.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await
}

pub fn access_line(at: &DateTime<Local>, method: &str, path: &str, status: u16) -> String {
    format!(
        "{} | Request: {} {} | Response Status: {}",
        at.format("%Y-%m-%d %H:%M:%S"),
        method,
        path,
        status
    )
}

pub fn error_block(
    at: &DateTime<Local>,
    method: &str,
    path: &str,
    status: u16,
    fault: &Fault,
) -> String {
    format!(
        "{} | TraceId: {}\nException: {}\n----------------------------------------\n",
        access_line(at, method, path, status),
        fault.trace_id,
        fault.detail
    )
}

/// Writes the per-request log contract to tracing and, optionally, files.
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    sink: Option<FileLogSink>,
}

impl RequestLogger {
    pub fn new(sink: Option<FileLogSink>) -> Self {
        Self { sink }
    }

    /// Record the outcome of one request.
    pub fn record(&self, method: &str, path: &str, status: u16, fault: Option<&Fault>) {
        let now = Local::now();
        let date = now.format("%Y-%m-%d").to_string();

        let line = access_line(&now, method, path, status);
        tracing::info!(method, path, status, "{line}");
        if let Some(sink) = &self.sink {
            sink.send(LogCategory::Info, date.clone(), line);
        }

        if let Some(fault) = fault {
            tracing::error!(
                trace_id = %fault.trace_id,
                exception = %fault.detail,
                "Unhandled exception occurred."
            );
            if let Some(sink) = &self.sink {
                sink.send(
                    LogCategory::Error,
                    date,
                    error_block(&now, method, path, status, fault),
                );
            }
        }
    }
}
