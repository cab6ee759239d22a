// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output is always available. With the `file-logging` feature, a
//! timestamped run folder receives a combined JSON log:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── chassis.log
//! ```

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use tracing_subscriber::EnvFilter;

use crate::cli::CrateDebugFlags;

/// Prefix of every run folder created by [`init_logging`]
pub const RUN_FOLDER_PREFIX: &str = "run_";

const RUN_FOLDER_FORMAT: &str = "%Y%m%d_%H%M%S";

fn build_filter(debug_flags: &CrateDebugFlags, default_level: &str) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string(default_level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter directives: {}", directives))
}

/// Initialize console-only logging
///
/// Returns an error if a global subscriber is already installed.
pub fn init_console_logging(debug_flags: &CrateDebugFlags, default_level: &str) -> Result<()> {
    let filter = build_filter(debug_flags, default_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

/// Logging initialization result; flushes file output on drop
#[cfg(feature = "file-logging")]
pub struct LoggingGuard {
    _file_guard: tracing_appender::non_blocking::WorkerGuard,
    log_dir: PathBuf,
}

#[cfg(feature = "file-logging")]
impl LoggingGuard {
    /// Get the run folder path
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Initialize console logging plus a JSON log file in a new run folder
///
/// # Arguments
/// * `debug_flags` - Per-crate debug flags for filtering
/// * `default_level` - Level for crates without a debug flag
/// * `log_dir` - Base directory for logs (default: `./logs`)
/// * `retention_runs` - Keep N most recent runs (default: 10)
#[cfg(feature = "file-logging")]
pub fn init_logging(
    debug_flags: &CrateDebugFlags,
    default_level: &str,
    log_dir: Option<PathBuf>,
    retention_runs: Option<usize>,
) -> Result<LoggingGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{Layer, Registry};

    let base_log_dir = log_dir.unwrap_or_else(|| PathBuf::from("./logs"));

    let timestamp = chrono::Local::now().format(RUN_FOLDER_FORMAT);
    let run_folder = base_log_dir.join(format!("{}{}", RUN_FOLDER_PREFIX, timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

    cleanup_old_logs(&base_log_dir, retention_runs.unwrap_or(10))?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_filter(build_filter(debug_flags, default_level)?)
        .boxed();

    let file_appender = tracing_appender::rolling::never(&run_folder, "chassis.log");
    let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .with_filter(build_filter(debug_flags, default_level)?)
        .boxed();

    Registry::default()
        .with(vec![console_layer, file_layer])
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_dir: run_folder,
    })
}

/// Remove all but the `retention_runs` most recent run folders
///
/// Returns the number of folders removed. Entries that do not look like run
/// folders are left alone.
pub fn cleanup_old_logs(base_log_dir: &Path, retention_runs: usize) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let stamp = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(RUN_FOLDER_PREFIX))
            .and_then(|s| NaiveDateTime::parse_from_str(s, RUN_FOLDER_FORMAT).ok());
        if let Some(dt) = stamp {
            runs.push((path, dt));
        }
    }

    if runs.len() <= retention_runs {
        return Ok(0);
    }

    // Oldest first
    runs.sort_by_key(|(_, dt)| *dt);
    let to_remove = runs.len() - retention_runs;
    let mut removed = 0;
    for (path, _) in runs.iter().take(to_remove) {
        match std::fs::remove_dir_all(path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            ),
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_cleanup_keeps_most_recent_runs() {
        let dir = tempdir().unwrap();
        for stamp in ["20250101_120000", "20250102_120000", "20250103_120000"] {
            std::fs::create_dir(dir.path().join(format!("run_{}", stamp))).unwrap();
        }
        std::fs::create_dir(dir.path().join("not_a_run")).unwrap();

        let removed = cleanup_old_logs(dir.path(), 2).unwrap();

        assert_eq!(removed, 1);
        assert!(!dir.path().join("run_20250101_120000").exists());
        assert!(dir.path().join("run_20250102_120000").exists());
        assert!(dir.path().join("run_20250103_120000").exists());
        assert!(dir.path().join("not_a_run").exists());
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("logs");
        assert_eq!(cleanup_old_logs(&missing, 3).unwrap(), 0);
    }

    #[test]
    fn test_invalid_level_rejected() {
        let flags = CrateDebugFlags::default();
        assert!(build_filter(&flags, "chassis=verbose").is_err());
        assert!(build_filter(&flags, "debug").is_ok());
    }
}
