//! Shared logging setup for the MagIC command-line tools.
//!
//! Each run appends to `<logs>/<app>.log`. A log that has outgrown
//! [`MAX_LOG_FILE_SIZE`] is shifted to `<app>.log.1` (and older ones to
//! `.2`, `.3`, ...) before the run starts, keeping at most [`MAX_LOG_FILES`].

use anyhow::{Context, Result};
use magic_protocol::paths::default_logs_dir;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str =
    "magic=info,magic_contribution=info,magic_schema=info,magic_upgrade=info";
pub const MAX_LOG_FILES: usize = 5;
pub const MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Logging configuration for a MagIC binary.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Override for the log directory (defaults to ~/.magic/logs)
    pub log_dir: Option<PathBuf>,
}

/// Initialize tracing with a per-run log file and stderr output.
///
/// The console only shows warnings unless `verbose` is set; the file gets
/// whatever `RUST_LOG` (or the default filter) allows.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = config.log_dir.unwrap_or_else(default_logs_dir);
    let log_file = open_log_file(&log_dir, config.app_name, MAX_LOG_FILES, MAX_LOG_FILE_SIZE)
        .with_context(|| format!("Failed to open log file in {}", log_dir.display()))?;

    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.verbose {
        file_filter.clone()
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(log_file))
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Open the app's log for appending, rotating it first when it is larger
/// than `max_size`.
pub fn open_log_file(dir: &Path, app_name: &str, keep: usize, max_size: u64) -> io::Result<File> {
    fs::create_dir_all(dir)?;
    let stem = log_file_stem(app_name);
    let current = dir.join(format!("{}.log", stem));

    let oversized = fs::metadata(&current).is_ok_and(|meta| meta.len() > max_size);
    if oversized {
        rotate_logs(dir, &stem, keep)?;
    }

    OpenOptions::new().create(true).append(true).open(current)
}

/// Shift `<stem>.log` to `<stem>.log.1`, `.1` to `.2` and so on, dropping
/// whatever would land past `keep` files.
fn rotate_logs(dir: &Path, stem: &str, keep: usize) -> io::Result<()> {
    let generation = |n: usize| match n {
        0 => dir.join(format!("{}.log", stem)),
        n => dir.join(format!("{}.log.{}", stem, n)),
    };

    let last = keep.max(1) - 1;
    let evicted = generation(last);
    if evicted.exists() {
        fs::remove_file(evicted)?;
    }
    for n in (0..last).rev() {
        let from = generation(n);
        if from.exists() {
            fs::rename(from, generation(n + 1))?;
        }
    }
    Ok(())
}

/// Log file names only carry ASCII letters, digits, `-` and `_`.
fn log_file_stem(app_name: &str) -> String {
    app_name
        .chars()
        .map(|ch| match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => ch,
            _ => '_',
        })
        .collect()
}
