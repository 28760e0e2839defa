//! Logger backing the controller's diagnostic output.
//!
//! The motion controller reports everything through the [`log`] crate's
//! facade: command starts, settle verdicts, calibration results, per-tick
//! trace telemetry. This module provides the concrete logger, writing each
//! line to the console and, when the file can be opened, to `log.txt` in
//! the working directory.
//!
//! # Usage
//!
//! Initialize the logger once at the start of your program:
//!
//! ```ignore
//! use talos::fs::logger;
//! use log::{LevelFilter, info};
//!
//! fn main() {
//!     logger::init(LevelFilter::Debug).expect("logger init failed");
//!     info!("program started");
//! }
//! ```
//!
//! # Log Output
//!
//! Each entry carries the level, time since the logger was initialized,
//! the module that emitted it, and the message:
//!
//! ```text
//! INFO [2m 5s 123ms] talos::motion::drive - drive control loop started
//! WARN [2m 9s 80ms] talos::motion::drive - drive wait gave up (big threshold)
//! ```

use std::{
    fs::OpenOptions,
    io::{BufWriter, Write},
    sync::{Mutex, OnceLock},
    time::{Duration, Instant},
};

use humantime::{FormattedDuration, format_duration};
use log::{LevelFilter, Metadata, Record, SetLoggerError};

/// A dual-output logger.
///
/// Writes log messages to both the console and a file (`log.txt`). The
/// file is created/truncated when the logger is initialized.
pub struct TalosLogger {
    /// Buffered file writer for log output.
    ///
    /// Wrapped in a mutex for thread-safe access. May be `None` if the
    /// file could not be opened (e.g. a read-only working directory).
    file_writer: Mutex<Option<BufWriter<std::fs::File>>>,
}

impl TalosLogger {
    fn new() -> Self {
        let file_writer = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open("log.txt")
            .ok()
            .map(BufWriter::new);

        Self {
            file_writer: Mutex::new(file_writer),
        }
    }
}

impl log::Log for TalosLogger {
    fn enabled(&self, metadata: &Metadata) -> bool { metadata.level() <= log::max_level() }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let log_line = format!(
                "{} [{}] {} - {}\n",
                record.level(),
                get_time(),
                record.target(),
                record.args()
            );

            // Print to console
            print!("{}", log_line);

            if let Ok(mut writer_guard) = self.file_writer.lock() {
                if let Some(ref mut writer) = *writer_guard {
                    let _ = writer.write_all(log_line.as_bytes());
                }
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut writer_guard) = self.file_writer.lock() {
            if let Some(ref mut writer) = *writer_guard {
                let _ = writer.flush();
            }
        }
    }
}

static LOGGER: OnceLock<TalosLogger> = OnceLock::new();
static STARTED: OnceLock<Instant> = OnceLock::new();

/// Initializes the logger.
///
/// This function must be called once before any logging macros are used.
/// It sets up the global logger to write to both the console and
/// `log.txt`.
///
/// # Arguments
///
/// * `level` - The minimum log level to record. Messages below this level
///   will be ignored. Use [`LevelFilter::Trace`] for maximum verbosity
///   (including per-tick controller telemetry) or [`LevelFilter::Error`]
///   for critical messages only.
///
/// # Errors
///
/// Returns [`SetLoggerError`] if a logger has already been set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    STARTED.get_or_init(Instant::now);
    let logger = LOGGER.get_or_init(TalosLogger::new);
    log::set_logger(logger).map(|()| log::set_max_level(level))
}

/// Returns the formatted duration since the logger was initialized,
/// truncated to milliseconds.
fn get_time() -> FormattedDuration {
    let elapsed = STARTED.get().map(Instant::elapsed).unwrap_or_default();
    format_duration(Duration::from_millis(elapsed.as_millis() as u64))
}

#[cfg(test)]
mod tests {
    use log::{LevelFilter, debug, error, info, trace, warn};

    #[test]
    #[ignore = "filesystem access needed (file write)"]
    fn log_full_test() {
        super::init(LevelFilter::Trace).expect("Failed to initialize logger");

        trace!("This is a trace message");
        debug!("This is a debug message");
        info!("This is an info message");
        warn!("This is a warning message");
        error!("This is an error message");

        log::logger().flush();

        assert!(
            log::logger().enabled(
                &log::Metadata::builder()
                    .level(log::Level::Error)
                    .target("test")
                    .build()
            )
        );
    }
}
