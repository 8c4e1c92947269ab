//! Logging initialization.
//!
//! Logs go to a file under `~/.cadmium/logs/` so they never draw over the
//! chat view. Each run gets its own file.
//!
//! # Configuration
//!
//! The level comes from `RUST_LOG` (default `info`). `--debug-api` adds
//! `cadmium::api=debug`, which logs every request and response status.

use std::fs;
use std::path::Path;

use chrono::Local;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber writing to `log_dir`.
///
/// Failing to create the log file is not fatal: the client runs without logs.
pub fn init_logging(log_dir: &Path, debug_api: bool) {
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("Warning: Failed to create logs directory: {}", e);
        return;
    }

    // Format: cadmium.2024-12-06-14-30-25.log
    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    let log_path = log_dir.join(format!("cadmium.{}.log", timestamp));

    let log_file = match fs::File::create(&log_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: Failed to create log file: {}", e);
            return;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    let mut env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if debug_api {
        match "cadmium::api=debug".parse() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(e) => eprintln!("Warning: Bad log directive: {}", e),
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    // The writer flushes on drop; keep it alive for the whole process.
    std::mem::forget(guard);

    tracing::info!("Logging initialized - writing to {}", log_path.display());
}
