//! Log output setup.
//!
//! Each personality writes to its own append-only file,
//! `<directory>/<ServiceName>.log` (for example `/tmp/LedManager.log`), so the
//! interactive clients keep their terminal free for prompts and responses.
//! When the file cannot be opened, or `--log-stderr` is given, logs go to
//! stderr instead.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from the configured
//! level.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Where log lines end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    File(PathBuf),
    Stderr,
}

/// Path of the log file for `service_name` inside `directory`.
pub fn log_file_path(directory: &Path, service_name: &str) -> PathBuf {
    directory.join(format!("{service_name}.log"))
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Installs the global `tracing` subscriber.
///
/// Returns where logs are written.  Calling it a second time in one process
/// leaves the first subscriber in place.
pub fn init_logging(
    service_name: &str,
    directory: &Path,
    level: &str,
    force_stderr: bool,
) -> LogDestination {
    if !force_stderr {
        let path = log_file_path(directory, service_name);
        match open_log_file(&path) {
            Ok(file) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(env_filter(level))
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
                return LogDestination::File(path);
            }
            Err(e) => {
                eprintln!("cannot open log file {}: {e}; logging to stderr", path.display());
            }
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(io::stderr)
        .try_init();
    LogDestination::Stderr
}
