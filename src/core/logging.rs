//! Logging Module
//!
//! Sets up `tracing` with a JSON file layer (daily rolling) and a readable
//! stdout layer, and forwards `log` records into `tracing`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

const LOG_FILE_NAME: &str = "wordchain.log";

/// Default log directory inside the user's data directory.
pub fn default_log_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("wordchain").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the logging system.
///
/// `RUST_LOG` overrides the configured level. Returns a `WorkerGuard` which
/// must be kept alive so buffered file logs are flushed on shutdown.
pub fn init(config: &LoggingConfig) -> WorkerGuard {
    let log_dir = config.log_dir.clone().unwrap_or_else(default_log_dir);
    init_with_dir(&log_dir, &config.level, config.console)
}

/// Initialize logging into `log_dir`, optionally echoing to the console.
pub fn init_with_dir(log_dir: &Path, level: &str, console: bool) -> WorkerGuard {
    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // File Layer: JSON format for easy parsing
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(env_filter(level));

    // Console Layer: human-readable, on stderr so stdout stays machine-readable
    let console_layer = console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .compact()
            .with_filter(env_filter(level))
    });

    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer);
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize tracing subscriber: {}", e);
    }

    // Redirect standard `log` macros to `tracing`
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to initialize LogTracer: {}", e);
    }

    log::info!(
        "Logging initialized. Writing to: {:?} (daily rolling)",
        log_dir.join(LOG_FILE_NAME)
    );

    guard
}
