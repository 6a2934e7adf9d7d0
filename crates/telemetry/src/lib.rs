//! Logging setup for buildspec tools
//!
//! - Structured logging with tracing, filtered by `RUST_LOG` or CLI verbosity
//! - Per-process session id on every initialization event
//! - Operation timers reported as debug events

use once_cell::sync::Lazy;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Initialize logging for a CLI run
///
/// Events go to stderr so machine-readable output on stdout stays clean.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.show_target)
                .with_ansi(config.ansi)
                .compact(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub show_target: bool,
    /// Color escape codes in log lines
    pub ansi: bool,
}

impl TelemetryConfig {
    /// Map CLI `-v` count and `--quiet` to a log level
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        let log_level = match (quiet, verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, 2) => "debug",
            (false, _) => "trace",
        };
        Self {
            log_level: log_level.to_string(),
            show_target: verbose >= 2,
            ansi: true,
        }
    }

    /// Turn color escape codes in log lines on or off
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Filter directive: our crates at `log_level`, everything else at warn
    pub fn filter_directive(&self) -> String {
        format!(
            "warn,buildspec={level},buildspec_android={level},buildspec_core={level},buildspec_telemetry={level}",
            level = self.log_level
        )
    }
}

/// Timer for measuring operation duration
pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    /// Start a new timer
    pub fn start(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    /// Stop the timer and log the duration
    pub fn stop(self) -> Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = self.name,
            duration_us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX),
            "Timer completed"
        );
        duration
    }
}
