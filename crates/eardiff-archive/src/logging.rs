//! Logging and tracing utilities for eardiff
//!
//! This module provides structured logging using the `tracing` crate,
//! with support for spans, events, and instrumentation.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Whether tracing has been initialized
static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize the default tracing subscriber
///
/// This should be called once at application startup. Multiple calls are safe
/// and will be ignored.
pub fn init_default() {
    init_with_config(TracingConfig::default());
}

/// Initialize tracing with a custom configuration
///
/// `RUST_LOG` takes precedence over `config.default_level`. Output goes to
/// stderr so reports on stdout stay clean.
pub fn init_with_config(config: TracingConfig) {
    if TRACING_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
        .is_ok()
    {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.show_target)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_file)
            .with_line_number(config.show_line_number);

        let _ = tracing_subscriber::registry()
            .with(fmt_layer)
            .with(filter)
            .try_init();
    }
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Default log level filter (e.g., "info", "debug", "warn")
    pub default_level: String,
    /// Show the target (module path) in log output
    pub show_target: bool,
    /// Show thread IDs in log output
    pub show_thread_ids: bool,
    /// Show source file in log output
    pub show_file: bool,
    /// Show line number in log output
    pub show_line_number: bool,
}

impl TracingConfig {
    /// Map a `-v` count onto a configuration
    pub fn from_verbosity(verbosity: u8) -> Self {
        let default_level = match verbosity {
            0 => "warn",
            1 => "warn,eardiff=info,eardiff_archive=info,eardiff_diff=info",
            2 => "info,eardiff=debug,eardiff_archive=debug,eardiff_diff=debug",
            _ => "trace",
        };

        Self {
            default_level: default_level.to_string(),
            show_target: verbosity >= 2,
            show_thread_ids: verbosity >= 3,
            show_file: verbosity >= 3,
            show_line_number: verbosity >= 3,
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: "warn,eardiff=info".to_string(),
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
        }
    }
}

/// Macros for common logging patterns
#[macro_export]
macro_rules! log_scan_start {
    ($path:expr) => {
        tracing::info!(
            archive = %$path.display(),
            "Starting scan"
        );
    };
}

#[macro_export]
macro_rules! log_scan_complete {
    ($path:expr, $duration:expr, $entries:expr) => {
        tracing::info!(
            archive = %$path.display(),
            duration_ms = %$duration.as_millis(),
            entries = %$entries,
            "Scan complete"
        );
    };
}

#[macro_export]
macro_rules! log_scan_error {
    ($path:expr, $error:expr) => {
        tracing::error!(
            archive = %$path.display(),
            error = %$error,
            "Scan failed"
        );
    };
}

/// Create a span for one level of nested archive descent
pub fn nested_span(entry: &str, depth: u32) -> tracing::Span {
    tracing::debug_span!("nested", entry = %entry, depth = depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_config_default() {
        let config = TracingConfig::default();
        assert!(config.default_level.contains("info"));
        assert!(config.show_target);
        assert!(!config.show_thread_ids);
    }

    #[test]
    fn test_verbosity_mapping() {
        assert_eq!(TracingConfig::from_verbosity(0).default_level, "warn");
        assert!(TracingConfig::from_verbosity(2).default_level.contains("debug"));
        assert!(TracingConfig::from_verbosity(3).show_line_number);
        assert!(TracingConfig::from_verbosity(9).show_file);
    }

    #[test]
    fn test_init_is_idempotent() {
        init_default();
        init_with_config(TracingConfig::from_verbosity(3));
    }
}
