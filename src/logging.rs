//! Tracing setup.
//!
//! The TUI owns the terminal, so interactive runs log to a file (or not at
//! all). Non-interactive runs log to stderr.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// No subscriber is installed.
    Discard,
    Stderr,
    /// Appended to this file.
    File(PathBuf),
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides `level` when set.
pub fn init(level: &str, target: LogTarget) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let installed = match target {
        LogTarget::Discard => return Ok(()),
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    installed.map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!(level, "Logging initialized");
    Ok(())
}
