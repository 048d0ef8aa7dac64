/// Subsystem tags for log filtering
///
/// Each tag maps to a --debug-<module> command-line flag.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Rpc,
    Wallet,
    Launch,
    Database,
    Webserver,
    Api,
    Llm,
}

impl LogTag {
    /// Display name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Rpc => "RPC",
            LogTag::Wallet => "WALLET",
            LogTag::Launch => "LAUNCH",
            LogTag::Database => "DATABASE",
            LogTag::Webserver => "WEBSERVER",
            LogTag::Api => "API",
            LogTag::Llm => "LLM",
        }
    }

    /// The --debug-<module> flag that enables debug logging for this tag
    pub fn debug_flag(&self) -> &'static str {
        match self {
            LogTag::System => "--debug-system",
            LogTag::Config => "--debug-config",
            LogTag::Rpc => "--debug-rpc",
            LogTag::Wallet => "--debug-wallet",
            LogTag::Launch => "--debug-launch",
            LogTag::Database => "--debug-database",
            LogTag::Webserver => "--debug-webserver",
            LogTag::Api => "--debug-api",
            LogTag::Llm => "--debug-llm",
        }
    }

    /// All known tags (used when scanning command-line arguments)
    pub fn all() -> &'static [LogTag] {
        &[
            LogTag::System,
            LogTag::Config,
            LogTag::Rpc,
            LogTag::Wallet,
            LogTag::Launch,
            LogTag::Database,
            LogTag::Webserver,
            LogTag::Api,
            LogTag::Llm,
        ]
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
