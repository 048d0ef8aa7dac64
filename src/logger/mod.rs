//! Structured logging for the AiFi launch service
//!
//! Provides leveled, tagged logging with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug control via --debug-<module> flags
//! - Dual output: colored console + file persistence under logs/
//!
//! ## Usage
//!
//! ```rust
//! use aifi::logger::{self, LogTag};
//!
//! logger::error(LogTag::Rpc, "Connection failed");
//! logger::info(LogTag::Launch, "Funding confirmed");
//! logger::debug(LogTag::Wallet, "Signature details: ..."); // Only with --debug-wallet
//! ```
//!
//! Call `logger::init()` once at startup, before any logging occurs.

mod config;
mod core;
mod file;
mod levels;
mod tags;

pub use config::{get_logger_config, init_from_args, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Parses command-line arguments for debug flags and opens the log file.
/// Call this once in main.rs before starting services.
pub fn init() {
    config::init_from_args();
    file::init_file_logging();
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (important issues, hidden by --quiet)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level (only shown with the matching --debug-<module> flag)
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (only shown with --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Force flush pending log writes during shutdown
pub fn flush() {
    file::flush_file_logging();
}
