//! Tracing setup for the command-line tools.
//!
//! Each tool run gets its own file `<tool>_<timestamp>.log` under the app
//! logs directory, and only the newest `max_files` runs of that tool are
//! kept. Console output goes to stderr so that stdout carries only the
//! tool's results. `RUST_LOG` overrides the configured level.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::{OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs;
use crate::config::LoggingSettings;

const LOG_EXTENSION: &str = "log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("log directory unavailable: {0}")]
    Dir(#[from] app_dirs::AppDirError),
    #[error("invalid log level {level:?}: {source}")]
    Level {
        level: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("log file {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to format log file name: {0}")]
    FormatTime(#[from] time::error::Format),
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Keeps the file writer flushing until dropped at the end of `main`.
#[derive(Debug)]
pub struct LogSession {
    _guard: WorkerGuard,
}

/// Install the global subscriber for `tool`.
pub fn init(tool: &str, settings: &LoggingSettings) -> Result<LogSession, LoggingError> {
    let filter = build_filter(&settings.level)?;
    let dir = app_dirs::logs_dir()?;
    let file_name = log_file_name(tool, now_local_or_utc())?;
    let path = dir.join(&file_name);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LoggingError::File {
            path: path.clone(),
            source,
        })?;
    prune_tool_logs(&dir, tool, settings.max_files.max(1))?;

    let (writer, guard) = tracing_appender::non_blocking(file);
    let timer = fmt::time::OffsetTime::new(
        UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        DISPLAY_FORMAT,
    );
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_timer(timer.clone())
        .with_writer(writer);
    let console_layer = settings.console.then(|| {
        fmt::layer()
            .with_target(false)
            .with_timer(timer)
            .with_writer(std::io::stderr)
    });
    tracing::subscriber::set_global_default(
        Registry::default()
            .with(filter)
            .with(file_layer)
            .with(console_layer),
    )?;

    tracing::debug!("{tool} logging to {}", path.display());
    Ok(LogSession { _guard: guard })
}

/// [`init`], reporting a failure on stderr so the tool can run without logs.
pub fn init_or_report(tool: &str, settings: &LoggingSettings) -> Option<LogSession> {
    match init(tool, settings) {
        Ok(session) => Some(session),
        Err(err) => {
            eprintln!("Logging disabled: {err}");
            None
        }
    }
}

const DISPLAY_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => configured_filter(level),
    }
}

fn configured_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(level).map_err(|source| LoggingError::Level {
        level: level.to_string(),
        source,
    })
}

fn log_file_name(tool: &str, now: OffsetDateTime) -> Result<String, LoggingError> {
    const NAME_FORMAT: &[BorrowedFormatItem<'static>] =
        format_description!("[year][month][day]-[hour][minute][second]");
    Ok(format!("{tool}_{}.{LOG_EXTENSION}", now.format(NAME_FORMAT)?))
}

/// Remove all but the newest `keep` logs written by `tool`.
///
/// Timestamps in the names sort chronologically, so name order is age order.
/// Logs of other tools are left alone.
fn prune_tool_logs(dir: &Path, tool: &str, keep: usize) -> Result<(), LoggingError> {
    let prefix = format!("{tool}_");
    let read_err = |source| LoggingError::File {
        path: dir.to_path_buf(),
        source,
    };
    let mut runs: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(read_err)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == LOG_EXTENSION)
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&prefix))
        })
        .collect();
    runs.sort();
    let excess = runs.len().saturating_sub(keep);
    for path in runs.into_iter().take(excess) {
        fs::remove_file(&path).map_err(|source| LoggingError::File { path, source })?;
    }
    Ok(())
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
