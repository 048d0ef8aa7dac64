/// File persistence for log output
///
/// One log file per process start under logs/, named by startup timestamp.
use once_cell::sync::Lazy;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

static LOG_FILE: Lazy<Mutex<Option<File>>> = Lazy::new(|| Mutex::new(None));

/// Open the log file. Failures are non-fatal: console logging still works.
pub fn init_file_logging() {
    let path = format!(
        "{}/aifi_{}.log",
        crate::paths::logs_dir(),
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );

    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            if let Ok(mut slot) = LOG_FILE.lock() {
                *slot = Some(file);
            }
        }
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", path, e);
        }
    }
}

/// Append a line to the log file (no-op if the file never opened)
pub(crate) fn write_line(line: &str) {
    if let Ok(mut slot) = LOG_FILE.lock() {
        if let Some(file) = slot.as_mut() {
            let _ = writeln!(file, "{}", line);
        }
    }
}

/// Flush buffered writes (called during shutdown)
pub fn flush_file_logging() {
    if let Ok(mut slot) = LOG_FILE.lock() {
        if let Some(file) = slot.as_mut() {
            let _ = file.flush();
        }
    }
}
