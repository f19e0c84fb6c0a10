// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output is always installed. With the `file-logging` feature a JSON
//! log is also written into a timestamped run folder:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── rangelink.log
//! ```

use anyhow::{anyhow, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::DebugFlags;

#[cfg(feature = "file-logging")]
use std::path::{Path, PathBuf};

/// Build the filter: `RUST_LOG` if set, otherwise the flags
fn build_filter(debug_flags: &DebugFlags, default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(debug_flags.to_filter_string(default_level)))
}

fn console_layer<S>(filter: EnvFilter) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(filter)
        .boxed()
}

/// Install a console subscriber
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_console_logging(debug_flags: &DebugFlags, default_level: &str) -> Result<()> {
    Registry::default()
        .with(console_layer(build_filter(debug_flags, default_level)))
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))
}

/// Keeps the file writer alive; logs are flushed when dropped
#[cfg(feature = "file-logging")]
pub struct LoggingGuard {
    _file_guard: tracing_appender::non_blocking::WorkerGuard,
    run_dir: PathBuf,
}

#[cfg(feature = "file-logging")]
impl LoggingGuard {
    /// Folder this run writes into
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }
}

/// Install console plus JSON file logging
///
/// Keeps the `retention_runs` most recent run folders under `log_dir`.
#[cfg(feature = "file-logging")]
pub fn init_file_logging(
    debug_flags: &DebugFlags,
    default_level: &str,
    log_dir: &Path,
    retention_runs: usize,
) -> Result<LoggingGuard> {
    use anyhow::Context;

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let run_dir = log_dir.join(format!("run_{}", timestamp));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("Failed to create log directory: {}", run_dir.display()))?;

    prune_old_runs(log_dir, retention_runs)?;

    let appender = tracing_appender::rolling::never(&run_dir, "rangelink.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .with_filter(build_filter(debug_flags, default_level))
        .boxed();

    Registry::default()
        .with(console_layer(build_filter(debug_flags, default_level)))
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(LoggingGuard {
        _file_guard: guard,
        run_dir,
    })
}

/// Delete all but the newest `keep` run folders
#[cfg(feature = "file-logging")]
fn prune_old_runs(log_dir: &Path, keep: usize) -> Result<()> {
    let mut runs: Vec<PathBuf> = std::fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_dir()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("run_"))
        })
        .collect();

    // run_YYYYmmdd_HHMMSS sorts chronologically by name
    runs.sort();
    let excess = runs.len().saturating_sub(keep);
    for path in runs.iter().take(excess) {
        if let Err(e) = std::fs::remove_dir_all(path) {
            eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            );
        }
    }
    Ok(())
}

#[cfg(all(test, feature = "file-logging"))]
mod tests {
    use super::*;

    #[test]
    fn test_prune_keeps_newest_runs() {
        let dir = std::env::temp_dir().join(format!("rangelink-logs-{}", std::process::id()));
        for name in ["run_20250101_000000", "run_20250102_000000", "run_20250103_000000", "other"] {
            std::fs::create_dir_all(dir.join(name)).unwrap();
        }

        prune_old_runs(&dir, 2).unwrap();

        assert!(!dir.join("run_20250101_000000").exists());
        assert!(dir.join("run_20250102_000000").exists());
        assert!(dir.join("run_20250103_000000").exists());
        assert!(dir.join("other").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
