/// Logger configuration derived from command-line arguments
use super::tags::LogTag;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::RwLock;

/// Runtime logger configuration
#[derive(Debug, Clone, Default)]
pub struct LoggerConfig {
    /// Tags with debug logging enabled via --debug-<module>
    pub debug_tags: HashSet<LogTag>,
    /// --verbose enables verbose logging everywhere
    pub verbose: bool,
    /// --quiet suppresses warnings and below
    pub quiet: bool,
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Scan command-line arguments and populate the logger configuration
pub fn init_from_args() {
    let args: Vec<String> = std::env::args().collect();
    let mut config = LoggerConfig::default();

    for tag in LogTag::all() {
        if args.iter().any(|a| a == tag.debug_flag()) || args.iter().any(|a| a == "--debug-all") {
            config.debug_tags.insert(*tag);
        }
    }
    config.verbose = args.iter().any(|a| a == "--verbose");
    config.quiet = args.iter().any(|a| a == "--quiet");

    if let Ok(mut current) = LOGGER_CONFIG.write() {
        *current = config;
    }
}

/// Get a snapshot of the current logger configuration
pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG
        .read()
        .map(|c| c.clone())
        .unwrap_or_default()
}

/// Check whether debug logging is enabled for a tag
pub fn is_debug_enabled(tag: LogTag) -> bool {
    get_logger_config().debug_tags.contains(&tag)
}
