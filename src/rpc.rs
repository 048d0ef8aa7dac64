/// Centralized RPC client for Solana
///
/// Raw JSON-RPC over HTTP with a primary URL and ordered fallbacks.
/// Used for balance queries, blockhash fetching, transaction submission
/// and finalized-commitment confirmation.
use crate::errors::ChainError;
use crate::global::read_configs;
use crate::logger::{self, LogTag};
use base64::{engine::general_purpose, Engine as _};
use once_cell::sync::OnceCell;
use solana_sdk::{hash::Hash, pubkey::Pubkey, transaction::Transaction};
use std::str::FromStr;
use std::time::Duration;

/// Lamports per SOL (10^9)
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// How long to poll for finalized confirmation before giving up
const CONFIRM_TIMEOUT_SECS: u64 = 90;

/// Poll interval while waiting for confirmation
const CONFIRM_POLL_INTERVAL_MS: u64 = 2_000;

/// Converts lamports to SOL amount
pub fn lamports_to_sol(lamports: u64) -> f64 {
    (lamports as f64) / (LAMPORTS_PER_SOL as f64)
}

/// Converts a SOL amount to lamports, rounding to the nearest lamport.
/// Truncation would systematically underfund transfers by a fraction of
/// a lamport, so this must round.
pub fn sol_to_lamports(sol_amount: f64) -> u64 {
    (sol_amount * (LAMPORTS_PER_SOL as f64)).round() as u64
}

/// Parse a base58 address into a Pubkey
pub fn parse_pubkey(address: &str) -> Result<Pubkey, ChainError> {
    Pubkey::from_str(address)
        .map_err(|e| ChainError::InvalidAmount(format!("Invalid address '{}': {}", address, e)))
}

/// Result of a finalized-commitment confirmation poll
#[derive(Debug, Clone)]
pub struct ConfirmationResult {
    pub signature: String,
    pub slot: Option<u64>,
}

/// RPC client with primary/fallback URL handling
pub struct RpcClient {
    client: reqwest::Client,
    rpc_url: String,
    fallback_urls: Vec<String>,
}

impl RpcClient {
    pub fn new_with_urls(rpc_url: String, fallback_urls: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            rpc_url,
            fallback_urls,
        }
    }

    pub fn from_config() -> Result<Self, ChainError> {
        let configs = read_configs().map_err(ChainError::ConfigError)?;
        Ok(Self::new_with_urls(configs.rpc_url, configs.rpc_fallbacks))
    }

    pub fn url(&self) -> &str {
        &self.rpc_url
    }

    /// All URLs in preference order: primary first, then fallbacks
    fn all_urls(&self) -> Vec<&str> {
        let mut urls = vec![self.rpc_url.as_str()];
        urls.extend(self.fallback_urls.iter().map(|s| s.as_str()));
        urls
    }

    /// Execute one JSON-RPC call, trying each URL in order.
    ///
    /// Returns the `result` field of the first successful response. An RPC
    /// `error` on the primary URL is returned directly (it is an answer,
    /// not an outage); only transport failures trigger fallback.
    async fn rpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let mut last_error: Option<ChainError> = None;

        for url in self.all_urls() {
            match self
                .client
                .post(url)
                .header("Content-Type", "application/json")
                .json(&payload)
                .send()
                .await
            {
                Ok(response) => {
                    let body: serde_json::Value = response
                        .json()
                        .await
                        .map_err(|e| ChainError::ParseError(format!("RPC body: {}", e)))?;

                    if let Some(error) = body.get("error") {
                        let message = error
                            .get("message")
                            .and_then(|m| m.as_str())
                            .unwrap_or("Unknown RPC error");
                        return Err(rpc_error_with_logs(method, message, error));
                    }

                    if let Some(result) = body.get("result") {
                        return Ok(result.clone());
                    }

                    last_error = Some(ChainError::InvalidResponse(format!(
                        "{}: response missing result",
                        method
                    )));
                }
                Err(e) => {
                    logger::warning(
                        LogTag::Rpc,
                        &format!("RPC {} failed on {}: {}", method, url, e),
                    );
                    last_error = Some(ChainError::NetworkError(e));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ChainError::ApiError(format!("{}: no RPC endpoint configured", method))))
    }

    /// Get SOL balance of an address
    pub async fn get_sol_balance(&self, wallet_address: &str) -> Result<f64, ChainError> {
        let result = self
            .rpc_call(
                "getBalance",
                serde_json::json!([wallet_address, {"commitment": "confirmed"}]),
            )
            .await?;

        let lamports = result
            .get("value")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| ChainError::InvalidResponse("getBalance: missing value".to_string()))?;

        Ok(lamports_to_sol(lamports))
    }

    /// Get the latest blockhash at finalized commitment, with the last
    /// block height at which it remains valid.
    pub async fn get_latest_blockhash(&self) -> Result<(Hash, u64), ChainError> {
        let result = self
            .rpc_call(
                "getLatestBlockhash",
                serde_json::json!([{"commitment": "finalized"}]),
            )
            .await?;

        let value = result
            .get("value")
            .ok_or_else(|| ChainError::InvalidResponse("getLatestBlockhash: missing value".to_string()))?;

        let blockhash_str = value
            .get("blockhash")
            .and_then(|b| b.as_str())
            .ok_or_else(|| ChainError::InvalidResponse("getLatestBlockhash: missing blockhash".to_string()))?;

        let blockhash = Hash::from_str(blockhash_str)
            .map_err(|e| ChainError::ParseError(format!("blockhash: {}", e)))?;

        let last_valid_block_height = value
            .get("lastValidBlockHeight")
            .and_then(|h| h.as_u64())
            .unwrap_or(0);

        Ok((blockhash, last_valid_block_height))
    }

    /// Get the circulating (UI) supply of a token mint
    pub async fn get_token_supply(&self, mint: &str) -> Result<f64, ChainError> {
        let result = self
            .rpc_call("getTokenSupply", serde_json::json!([mint]))
            .await?;

        let value = result
            .get("value")
            .ok_or_else(|| ChainError::InvalidResponse("getTokenSupply: missing value".to_string()))?;

        if let Some(ui_amount) = value.get("uiAmount").and_then(|a| a.as_f64()) {
            return Ok(ui_amount);
        }

        // uiAmount can be null for very large supplies; recompute from raw
        let amount: f64 = value
            .get("amount")
            .and_then(|a| a.as_str())
            .and_then(|a| a.parse().ok())
            .ok_or_else(|| ChainError::InvalidResponse("getTokenSupply: missing amount".to_string()))?;
        let decimals = value
            .get("decimals")
            .and_then(|d| d.as_u64())
            .unwrap_or(0);

        Ok(amount / 10f64.powi(decimals as i32))
    }

    /// Submit a fully signed transaction and return its signature.
    ///
    /// Simulation logs attached to a rejection are surfaced verbatim in the
    /// error message since they are the most actionable diagnostic.
    pub async fn send_transaction(&self, transaction: &Transaction) -> Result<String, ChainError> {
        let serialized = bincode::serialize(transaction)
            .map_err(|e| ChainError::TransactionError(format!("Failed to serialize transaction: {}", e)))?;
        let tx_base64 = general_purpose::STANDARD.encode(&serialized);

        logger::debug(
            LogTag::Rpc,
            &format!("Sending transaction ({} bytes serialized)", serialized.len()),
        );

        let result = self
            .rpc_call(
                "sendTransaction",
                serde_json::json!([
                    tx_base64,
                    {
                        "encoding": "base64",
                        "skipPreflight": false,
                        "preflightCommitment": "processed",
                        "maxRetries": 3
                    }
                ]),
            )
            .await?;

        let signature = result
            .as_str()
            .ok_or_else(|| ChainError::InvalidResponse("sendTransaction: non-string result".to_string()))?;

        logger::info(LogTag::Rpc, &format!("Transaction sent: {}", signature));
        Ok(signature.to_string())
    }

    /// Wait until a signature reaches finalized commitment.
    ///
    /// A status that carries an on-chain `err` is a failure even though the
    /// transaction was included in a block.
    pub async fn confirm_transaction_finalized(
        &self,
        signature: &str,
    ) -> Result<ConfirmationResult, ChainError> {
        let deadline = std::time::Instant::now() + Duration::from_secs(CONFIRM_TIMEOUT_SECS);

        loop {
            let result = self
                .rpc_call(
                    "getSignatureStatuses",
                    serde_json::json!([[signature], {"searchTransactionHistory": true}]),
                )
                .await?;

            let status = result
                .get("value")
                .and_then(|v| v.as_array())
                .and_then(|arr| arr.first())
                .cloned()
                .unwrap_or(serde_json::Value::Null);

            if !status.is_null() {
                if let Some(err) = status.get("err") {
                    if !err.is_null() {
                        return Err(ChainError::TransactionError(format!(
                            "Transaction {} failed on-chain: {}",
                            signature, err
                        )));
                    }
                }

                let confirmation_status = status
                    .get("confirmationStatus")
                    .and_then(|s| s.as_str())
                    .unwrap_or("");

                if confirmation_status == "finalized" {
                    return Ok(ConfirmationResult {
                        signature: signature.to_string(),
                        slot: status.get("slot").and_then(|s| s.as_u64()),
                    });
                }

                logger::debug(
                    LogTag::Rpc,
                    &format!("Signature {} at {}, waiting for finalized", signature, confirmation_status),
                );
            }

            if std::time::Instant::now() >= deadline {
                return Err(ChainError::TransactionError(format!(
                    "Timed out waiting for finalized confirmation of {}",
                    signature
                )));
            }

            tokio::time::sleep(Duration::from_millis(CONFIRM_POLL_INTERVAL_MS)).await;
        }
    }
}

/// Build a transaction error, appending simulation logs when the RPC error
/// payload carries them (`error.data.logs`).
fn rpc_error_with_logs(method: &str, message: &str, error: &serde_json::Value) -> ChainError {
    if let Some(logs) = extract_simulation_logs(error) {
        return ChainError::TransactionError(format!(
            "{} failed: {}. Logs: {}",
            method,
            message,
            logs.join(", ")
        ));
    }
    ChainError::TransactionError(format!("{} failed: {}", method, message))
}

/// Pull simulation logs out of an RPC error payload if present
pub fn extract_simulation_logs(error: &serde_json::Value) -> Option<Vec<String>> {
    let logs = error.get("data")?.get("logs")?.as_array()?;
    let collected: Vec<String> = logs
        .iter()
        .filter_map(|l| l.as_str().map(|s| s.to_string()))
        .collect();
    if collected.is_empty() {
        None
    } else {
        Some(collected)
    }
}

// =============================================================================
// GLOBAL RPC CLIENT
// =============================================================================

static RPC_CLIENT: OnceCell<RpcClient> = OnceCell::new();

/// Initialize the global RPC client from the configs
pub fn init_rpc_client() -> Result<&'static RpcClient, ChainError> {
    if let Some(client) = RPC_CLIENT.get() {
        return Ok(client);
    }
    let client = RpcClient::from_config()?;
    let _ = RPC_CLIENT.set(client);
    Ok(RPC_CLIENT.get().expect("RPC client just initialized"))
}

/// Get the global RPC client. Panics if init_rpc_client was never called.
pub fn get_rpc_client() -> &'static RpcClient {
    RPC_CLIENT
        .get()
        .expect("RPC client not initialized - call init_rpc_client() first")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sol_conversions() {
        assert_eq!(sol_to_lamports(1.0), LAMPORTS_PER_SOL);
        assert_eq!(sol_to_lamports(0.001), 1_000_000);

        let converted_back = lamports_to_sol(1_000_000);
        assert!((converted_back - 0.001).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sol_to_lamports_rounds_instead_of_truncating() {
        // 0.1 + 0.05 is not exactly representable; rounding must still
        // yield exactly 150_000_000 lamports.
        let total = 0.1_f64 + 0.05_f64;
        assert_eq!(sol_to_lamports(total), 150_000_000);

        // A value a hair below a whole lamport count must round up
        assert_eq!(sol_to_lamports(0.299999999999), 300_000_000);
    }

    #[test]
    fn test_parse_pubkey() {
        assert!(parse_pubkey("So11111111111111111111111111111111111111112").is_ok());
        assert!(parse_pubkey("not-a-pubkey").is_err());
    }

    #[test]
    fn test_extract_simulation_logs() {
        let error = serde_json::json!({
            "code": -32002,
            "message": "Transaction simulation failed",
            "data": {
                "logs": ["Program log: insufficient funds", "Program failed"]
            }
        });
        let logs = extract_simulation_logs(&error).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0], "Program log: insufficient funds");

        let no_logs = serde_json::json!({"code": -32000, "message": "nope"});
        assert!(extract_simulation_logs(&no_logs).is_none());
    }
}
