//! Session logger — installs the global `tracing` subscriber.
//!
//! Output goes to stderr, or to `LoggingConfig::file` when set. A log file is
//! **truncated (overwritten) at each launch**, so it only ever contains output
//! from the most-recent session. `RUST_LOG` overrides the configured level.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Returns the path to the current session log file, if logging to a file.
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

/// Initialise logging. Safe to call more than once; only the first call
/// installs a subscriber.
pub fn init(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let installed = match config.file.as_ref().and_then(|p| open_session_file(p)) {
        Some((path, file)) => {
            let ok = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .is_ok();
            if ok {
                let _ = LOG_PATH.set(path);
            }
            ok
        }
        None => builder.with_writer(std::io::stderr).try_init().is_ok(),
    };

    if !installed {
        return;
    }

    tracing::info!("=== socialsync session started ===");
    if let Some(path) = log_path() {
        tracing::info!("Log file: {}", path.display());
    }

    // Mirror panics into the log, then run the default handler
    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("PANIC: {}", info);
        prev(info);
    }));
}

/// Create (or truncate) the session log file. Failure is not fatal; the
/// caller falls back to stderr.
fn open_session_file(path: &Path) -> Option<(PathBuf, fs::File)> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
    {
        Ok(file) => Some((path.to_path_buf(), file)),
        Err(e) => {
            eprintln!("[logger] Failed to open log file {:?}: {}", path, e);
            None
        }
    }
}
