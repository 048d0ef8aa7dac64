/// Filesystem layout for runtime data
///
/// Everything lives under the working directory: data/ for databases,
/// logs/ for log files.
use std::fs;

pub const DATA_DIR: &str = "data";
pub const LOGS_DIR: &str = "logs";

/// Path of the application SQLite database
pub fn database_path() -> String {
    format!("{}/aifi.db", DATA_DIR)
}

/// Directory for log files
pub fn logs_dir() -> &'static str {
    LOGS_DIR
}

/// Create all required directories. Must run before logger initialization
/// (the logger needs logs/ to create its file).
pub fn ensure_all_directories() -> Result<(), String> {
    for dir in [DATA_DIR, LOGS_DIR] {
        fs::create_dir_all(dir).map_err(|e| format!("Failed to create {}: {}", dir, e))?;
    }
    Ok(())
}
