/// Solscan token-metadata client
///
/// The browser cannot call solscan directly (CORS); this client backs the
/// proxy endpoint. Requests carry browser-like headers and a short
/// timeout.
use crate::errors::ChainError;
use crate::global::read_configs;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 5;

pub struct SolscanClient {
    client: reqwest::Client,
    base_url: String,
}

impl SolscanClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn from_config() -> Result<Self, ChainError> {
        let configs = read_configs().map_err(ChainError::ConfigError)?;
        Ok(Self::new(configs.solscan_api_url))
    }

    /// Fetch token metadata, passing the upstream JSON through unchanged.
    /// Returns the upstream status alongside the body so the proxy route
    /// can mirror it.
    pub async fn token_meta(&self, address: &str) -> Result<(u16, serde_json::Value), ChainError> {
        let url = format!("{}/token/meta?address={}", self.base_url, address);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header(
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            )
            .header("Referer", "https://solscan.io/")
            .header("Origin", "https://solscan.io")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response
            .json()
            .await
            .unwrap_or(serde_json::Value::Null);
        Ok((status, body))
    }
}
