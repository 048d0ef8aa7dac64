/// Raydium liquidity-pool launch adapter
///
/// Raydium's service quotes no base fee; the flow uses the fixed 0.45 SOL
/// constant on top of the user's liquidity amount.
///
/// Endpoints:
/// - POST {base}/prepare -> { request_id, funding_wallet }
/// - POST {base}/create  -> { mintAddress }
use super::{LaunchAdapter, Platform, Prepared, TokenParams, RAYDIUM_BASE_FEE_SOL};
use crate::errors::ChainError;
use crate::global::read_configs;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct PrepareResponse {
    request_id: String,
    funding_wallet: String,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    #[serde(rename = "mintAddress")]
    mint_address: String,
}

pub struct RaydiumAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl RaydiumAdapter {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn from_config() -> Result<Self, ChainError> {
        let configs = read_configs().map_err(ChainError::ConfigError)?;
        Ok(Self::new(configs.raydium_api_url))
    }

    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ChainError::ApiError(format!(
                "Raydium service {} returned {}: {}",
                path, status, text
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl LaunchAdapter for RaydiumAdapter {
    fn platform(&self) -> Platform {
        Platform::Raydium
    }

    async fn prepare(
        &self,
        _params: &TokenParams,
        _user_amount: f64,
    ) -> Result<Prepared, ChainError> {
        let value = self.post_json("/prepare", serde_json::json!({})).await?;
        let response: PrepareResponse = serde_json::from_value(value)
            .map_err(|e| ChainError::InvalidResponse(format!("Raydium prepare: {}", e)))?;

        logger::info(
            LogTag::Launch,
            &format!(
                "Raydium prepared: request_id={} funding_wallet={} base_fee={} SOL (fixed)",
                response.request_id, response.funding_wallet, RAYDIUM_BASE_FEE_SOL
            ),
        );

        Ok(Prepared {
            request_id: response.request_id,
            funding_wallet: response.funding_wallet,
            base_fee: RAYDIUM_BASE_FEE_SOL,
            auxiliary_signer: None,
        })
    }

    async fn finalize(
        &self,
        request_id: &str,
        params: &TokenParams,
        user_amount: f64,
    ) -> Result<String, ChainError> {
        let body = serde_json::json!({
            "request_id": request_id,
            "name": params.name,
            "ticker": params.symbol,
            "description": params.description,
            "imageUrl": params.image_url,
            "developerWallet": params.developer_wallet,
            "website": params.website,
            "twitter": params.twitter,
            "telegram": params.telegram,
            "visible": params.visible,
            "decimals": params.decimals,
            "poolTax": params.pool_tax.unwrap_or(4.0),
            "mode": params.mode,
            "dev_fee_percentage": params.dev_fee_percentage.unwrap_or(50.0),
            "liquidityAmount": user_amount,
        });

        let value = self.post_json("/create", body).await?;
        let response: CreateResponse = serde_json::from_value(value)
            .map_err(|e| ChainError::InvalidResponse(format!("Raydium create: {}", e)))?;

        logger::info(
            LogTag::Launch,
            &format!("Raydium finalized: mint={}", response.mint_address),
        );
        Ok(response.mint_address)
    }
}
