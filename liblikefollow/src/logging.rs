//! Logging setup shared by the likefollow binaries
//!
//! All log output goes to stderr. `lf-follow` prints its one-line run summary
//! on stdout, so the two streams can be redirected independently.
//!
//! ```no_run
//! use liblikefollow::logging::{LogFormat, LoggingConfig};
//!
//! LoggingConfig::new(LogFormat::Json, "debug", false).init();
//! ```
//!
//! Binaries normally call [`init_default`], which reads
//! `LIKEFOLLOW_LOG_FORMAT` (`text`, `json` or `pretty`) and
//! `LIKEFOLLOW_LOG_LEVEL`. `RUST_LOG` still wins when set.

use std::str::FromStr;
use tracing_subscriber::EnvFilter;

pub const FORMAT_VAR: &str = "LIKEFOLLOW_LOG_FORMAT";
pub const LEVEL_VAR: &str = "LIKEFOLLOW_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Plain lines, no colors
    #[default]
    Text,
    /// One JSON object per event
    Json,
    /// Multi-line colored output for local runs
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!(
                "Unknown log format '{}' (expected text, json or pretty)",
                other
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
    /// Forces `debug` unless `RUST_LOG` says otherwise
    pub verbose: bool,
}

impl LoggingConfig {
    pub fn new(format: LogFormat, level: impl Into<String>, verbose: bool) -> Self {
        Self {
            format,
            level: level.into(),
            verbose,
        }
    }

    pub fn from_env(verbose: bool) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), verbose)
    }

    /// Build from an arbitrary lookup; unparseable formats fall back to text
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F, verbose: bool) -> Self {
        let format = lookup(FORMAT_VAR)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let level = lookup(LEVEL_VAR)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "info".to_string());

        Self::new(format, level, verbose)
    }

    /// The filter directive used when `RUST_LOG` is absent
    pub fn directive(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.level
        }
    }

    /// Install the global subscriber
    ///
    /// A second call is a no-op, so tests and binaries may both call it.
    pub fn init(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.directive()));

        let installed = match self.format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_line_number(true)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false)
                .try_init(),
        };

        if installed.is_err() {
            tracing::debug!("Logging already initialized");
        }
    }
}

/// Initialize logging from `LIKEFOLLOW_LOG_FORMAT` / `LIKEFOLLOW_LOG_LEVEL`
pub fn init_default(verbose: bool) {
    LoggingConfig::from_env(verbose).init();
}
