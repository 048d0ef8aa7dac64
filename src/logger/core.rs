/// Core log dispatch: level filtering, console formatting, file handoff
use super::config;
use super::file;
use super::levels::LogLevel;
use super::tags::LogTag;
use colored::Colorize;

/// Format and emit a single log line, applying filtering rules
pub(crate) fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    let cfg = config::get_logger_config();

    // Filtering: errors always pass, warnings unless --quiet, debug needs
    // the matching flag, verbose needs --verbose.
    let visible = match level {
        LogLevel::Error => true,
        LogLevel::Warning | LogLevel::Info => !cfg.quiet,
        LogLevel::Debug => cfg.debug_tags.contains(&tag) || cfg.verbose,
        LogLevel::Verbose => cfg.verbose,
    };

    let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let plain = format!("[{}] [{}] [{}] {}", timestamp, level, tag, message);

    // File output keeps everything that passed filtering
    if visible {
        file::write_line(&plain);

        let level_colored = match level {
            LogLevel::Error => level.as_str().red().bold(),
            LogLevel::Warning => level.as_str().yellow(),
            LogLevel::Info => level.as_str().green(),
            LogLevel::Debug => level.as_str().cyan(),
            LogLevel::Verbose => level.as_str().dimmed(),
        };

        if level == LogLevel::Error {
            eprintln!(
                "[{}] [{}] [{}] {}",
                timestamp,
                level_colored,
                tag.as_str().bold(),
                message
            );
        } else {
            println!(
                "[{}] [{}] [{}] {}",
                timestamp,
                level_colored,
                tag.as_str().bold(),
                message
            );
        }
    }
}
