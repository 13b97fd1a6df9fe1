//! Logging for the harbormaster binary.
//!
//! fern dual dispatch: colored lines on stdout for interactive runs, plain
//! lines appended to `harbormaster.log` for post-mortems.

use crate::error::HarborError;

use common::ErrorLocation;

use std::io::stdout;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{BrightBlack, Cyan, Green, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339_millis;
use log::{LevelFilter, info, warn};

/// Log file name, created inside the data dir's `logs/` subdirectory.
const LOG_FILE_NAME: &str = "harbormaster.log";

/// Debug builds trace the protocol; release builds keep decisions only.
const LOG_LEVEL: LevelFilter = if cfg!(debug_assertions) {
    LevelFilter::Debug
} else {
    LevelFilter::Info
};

static INSTALL_ONCE: Once = Once::new();
static INSTALL_ATTEMPTED: AtomicBool = AtomicBool::new(false);

/// Install the process-wide logger.
///
/// Safe to call more than once: only the first call installs anything,
/// later calls log a warning and return Ok.
///
/// # Errors
///
/// Returns an error when the log file cannot be created or another logger
/// is already registered with the `log` facade.
pub fn initialize(log_dir: &Path) -> Result<(), HarborError> {
    if INSTALL_ATTEMPTED.swap(true, Ordering::SeqCst) {
        warn!("Logger already initialized");
        return Ok(());
    }

    let mut outcome = Ok(());

    INSTALL_ONCE.call_once(|| {
        outcome = install(log_dir);
    });

    if outcome.is_ok() {
        info!(
            "Logging at {LOG_LEVEL:?} to stdout and {}",
            log_dir.join(LOG_FILE_NAME).display()
        );
    }

    outcome
}

#[track_caller]
fn install(log_dir: &Path) -> Result<(), HarborError> {
    let file_path = log_dir.join(LOG_FILE_NAME);

    let log_file = fern::log_file(&file_path).map_err(|e| HarborError::Harbor {
        message: format!("Failed to create log file {}: {e}", file_path.display()),
        location: ErrorLocation::from(std::panic::Location::caller()),
    })?;

    Dispatch::new()
        .level(LOG_LEVEL)
        .chain(stdout_dispatch())
        .chain(file_dispatch(log_file))
        .apply()
        .map_err(|e| HarborError::Harbor {
            message: format!("Failed to install logger: {e}"),
            location: ErrorLocation::from(std::panic::Location::caller()),
        })
}

/// Colored stdout chain. Millisecond timestamps; the probe and poll
/// intervals this binary logs around are all sub-second.
fn stdout_dispatch() -> Dispatch {
    let palette = ColoredLevelConfig::new()
        .trace(BrightBlack)
        .debug(Cyan)
        .info(Green)
        .warn(Yellow)
        .error(Red);

    Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{date} {level} {message} ({file}:{line})",
                date = format_rfc3339_millis(SystemTime::now()),
                level = palette.color(record.level()),
                message = message,
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0),
            ))
        })
        .chain(stdout())
}

/// Plain-text chain for the log file.
fn file_dispatch(log_file: std::fs::File) -> Dispatch {
    Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{date} {level:<5} {message} ({file}:{line})",
                date = format_rfc3339_millis(SystemTime::now()),
                level = record.level(),
                message = message,
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0),
            ))
        })
        .chain(log_file)
}
