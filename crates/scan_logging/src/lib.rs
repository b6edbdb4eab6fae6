#![deny(missing_docs)]
//! Shared logging utilities for the praise counter workspace.
//!
//! This crate provides the `scan_*` logging macros used across the codebase,
//! the logger initialization for the binary, and a minimal test initializer.
//! Every line emitted through the macros carries the number of the scan pass
//! that produced it.

use std::cell::Cell;
use std::fs::File;
use std::path::Path;

use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

#[doc(hidden)]
pub use log;

pub use log::LevelFilter;

thread_local! {
    /// Thread-local storage for the number of the scan pass in progress.
    static PASS_ID: Cell<u64> = const { Cell::new(0) };
}

/// Sets the scan pass number for the current thread.
/// The worker calls this once at the start of every pass.
pub fn set_pass_id(pass: u64) {
    PASS_ID.with(|v| v.set(pass));
}

/// Retrieves the scan pass number for the current thread.
/// Returns 0 outside of a pass.
pub fn current_pass_id() -> u64 {
    PASS_ID.with(|v| v.get())
}

/// Logs a trace-level message tagged with the current pass.
#[macro_export]
macro_rules! scan_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!("[pass {}] {}", $crate::current_pass_id(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the current pass.
#[macro_export]
macro_rules! scan_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!("[pass {}] {}", $crate::current_pass_id(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the current pass.
#[macro_export]
macro_rules! scan_info {
    ($($arg:tt)*) => {{
        $crate::log::info!("[pass {}] {}", $crate::current_pass_id(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the current pass.
#[macro_export]
macro_rules! scan_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!("[pass {}] {}", $crate::current_pass_id(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the current pass.
#[macro_export]
macro_rules! scan_error {
    ($($arg:tt)*) => {{
        $crate::log::error!("[pass {}] {}", $crate::current_pass_id(), format_args!($($arg)*));
    }};
}

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    /// Write to the given log file only.
    File,
    /// Write to the terminal (stdout/stderr).
    Terminal,
    /// Write to both the log file and the terminal.
    Both,
}

/// Initializes the global logger.
///
/// `log_path` is only consulted for `File` and `Both`. If the file cannot be
/// created, a warning is printed and the terminal logger (if any) is still
/// installed.
pub fn initialize(destination: LogDestination, level: LevelFilter, log_path: Option<&Path>) {
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if matches!(destination, LogDestination::Terminal | LogDestination::Both) {
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ));
    }
    if matches!(destination, LogDestination::File | LogDestination::Both) {
        if let Some(file_logger) = log_path.and_then(|path| create_file_logger(level, config, path))
        {
            loggers.push(file_logger);
        }
    }
    if loggers.is_empty() {
        return;
    }

    let _ = CombinedLogger::init(loggers);
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    level: LevelFilter,
    config: Config,
    path: &Path,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}
