/// Error types for RPC, wallet and launch-flow operations
use std::fmt;

/// Errors raised anywhere along the launch path: RPC transport, wallet
/// signing, adapter calls, validation and persistence.
#[derive(Debug)]
pub enum ChainError {
    /// External service (launch API, proxy target) returned an error
    ApiError(String),
    /// HTTP transport failure
    NetworkError(reqwest::Error),
    /// Response arrived but did not have the expected shape
    InvalidResponse(String),
    /// Wallet balance below the required amount
    InsufficientBalance(String),
    /// User-supplied amount or address failed validation
    InvalidAmount(String),
    /// Configuration missing or malformed
    ConfigError(String),
    /// Transaction build, submission or on-chain execution failure
    TransactionError(String),
    /// Signing failed for a reason other than user rejection
    SigningError(String),
    /// JSON or data parsing failure
    ParseError(String),
    /// The user declined the wallet prompt. Treated as a silent cancel,
    /// never surfaced as an error banner.
    UserRejected,
    /// SQLite persistence failure
    DatabaseError(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::ApiError(msg) => write!(f, "API Error: {}", msg),
            ChainError::NetworkError(err) => write!(f, "Network Error: {}", err),
            ChainError::InvalidResponse(msg) => write!(f, "Invalid Response: {}", msg),
            ChainError::InsufficientBalance(msg) => write!(f, "Insufficient Balance: {}", msg),
            ChainError::InvalidAmount(msg) => write!(f, "Invalid Amount: {}", msg),
            ChainError::ConfigError(msg) => write!(f, "Config Error: {}", msg),
            ChainError::TransactionError(msg) => write!(f, "Transaction Error: {}", msg),
            ChainError::SigningError(msg) => write!(f, "Signing Error: {}", msg),
            ChainError::ParseError(msg) => write!(f, "Parse Error: {}", msg),
            ChainError::UserRejected => write!(f, "User rejected the request"),
            ChainError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<reqwest::Error> for ChainError {
    fn from(err: reqwest::Error) -> Self {
        ChainError::NetworkError(err)
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::ParseError(format!("JSON parsing error: {}", err))
    }
}

impl From<rusqlite::Error> for ChainError {
    fn from(err: rusqlite::Error) -> Self {
        ChainError::DatabaseError(err.to_string())
    }
}

impl ChainError {
    /// Whether this error is a user cancellation rather than a failure.
    /// Cancellations abort the flow silently: no banner, no state change.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, ChainError::UserRejected)
    }

    /// Classify a provider error by its code / message. Wallet providers
    /// signal rejection with code 4001 or a message containing
    /// "User rejected".
    pub fn from_provider_error(code: Option<i64>, message: &str) -> Self {
        if code == Some(4001) || message.contains("User rejected") {
            ChainError::UserRejected
        } else {
            ChainError::SigningError(message.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_rejection_by_code() {
        let err = ChainError::from_provider_error(Some(4001), "some provider text");
        assert!(err.is_user_rejection());
    }

    #[test]
    fn test_user_rejection_by_message() {
        let err = ChainError::from_provider_error(None, "User rejected the request.");
        assert!(err.is_user_rejection());
    }

    #[test]
    fn test_other_provider_errors_are_signing_errors() {
        let err = ChainError::from_provider_error(Some(-32603), "Internal JSON-RPC error");
        assert!(!err.is_user_rejection());
        assert!(matches!(err, ChainError::SigningError(_)));
    }
}
