#![deny(missing_docs)]
//! Shared logging utilities for the scan workspace.
//!
//! This crate provides the `scan_*` logging macros used across the codebase,
//! the process logger setup used by the CLI, and a minimal test initializer
//! for the global logger. Every macro prefixes its line with the current
//! thread's session token once one has been set.

use std::cell::Cell;
use std::fmt;
use std::fs::File;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

thread_local! {
    /// Token of the capture session the current thread is working on.
    static SESSION_TOKEN: Cell<u64> = const { Cell::new(0) };
}

/// Records the capture session token for the current thread.
/// The controller sets this when it starts an acquisition or a submission.
pub fn set_session_token(token: u64) {
    SESSION_TOKEN.with(|v| v.set(token));
}

/// Retrieves the capture session token for the current thread.
/// Returns 0 if no session has been entered yet.
pub fn session_token() -> u64 {
    SESSION_TOKEN.with(|v| v.get())
}

/// Renders as `[session N] ` for a non-zero token, and as nothing otherwise.
#[doc(hidden)]
pub struct SessionPrefix;

impl fmt::Display for SessionPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match session_token() {
            0 => Ok(()),
            token => write!(f, "[session {token}] "),
        }
    }
}

/// Future adapter that sets the session token every time it is polled, so
/// log lines from a task keep its token when the task moves between threads.
pub struct WithSessionToken<F> {
    token: u64,
    inner: Pin<Box<F>>,
}

/// Runs `future` with `token` as its session token.
pub fn with_session_token<F: Future>(token: u64, future: F) -> WithSessionToken<F> {
    WithSessionToken {
        token,
        inner: Box::pin(future),
    }
}

impl<F: Future> Future for WithSessionToken<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        set_session_token(self.token);
        self.inner.as_mut().poll(cx)
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! scan_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::SessionPrefix, format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! scan_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::SessionPrefix, format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! scan_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::SessionPrefix, format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! scan_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::SessionPrefix, format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! scan_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::SessionPrefix, format_args!($($arg)*));
    }};
}

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogDestination {
    /// Write to the given log file only.
    File,
    /// Write to the terminal (stderr for warnings and errors).
    #[default]
    Terminal,
    /// Write to both file and terminal.
    Both,
}

/// Initializes the process logger.
///
/// `log_file` is only used for [`LogDestination::File`] and
/// [`LogDestination::Both`]. If the file cannot be created the terminal
/// logger is still installed where requested.
pub fn initialize(destination: LogDestination, level: LevelFilter, log_file: &Path) {
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
        match File::create(log_file) {
            Ok(file) => loggers.push(WriteLogger::new(level, config, file)),
            Err(err) => {
                eprintln!("Warning: Could not create log file at {log_file:?}: {err}");
            }
        }
    }
    if loggers.is_empty() {
        return;
    }

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

/// Initializes a simple terminal logger for use in unit tests.
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
