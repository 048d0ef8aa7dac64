/// Meteora (revshare bonding-curve) launch adapter
///
/// Endpoints:
/// - POST {base}/api/token/prepare  -> { request_id, funding_wallet, amount_to_fund }
/// - POST {base}/api/token/finalize -> { mint }
use super::{LaunchAdapter, Platform, Prepared, TokenParams};
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
    amount_to_fund: f64,
}

#[derive(Debug, Deserialize)]
struct FinalizeResponse {
    mint: String,
}

pub struct MeteoraAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl MeteoraAdapter {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn from_config() -> Result<Self, ChainError> {
        let configs = read_configs().map_err(ChainError::ConfigError)?;
        Ok(Self::new(configs.revshare_base_url))
    }

    /// Shared metadata payload for prepare and finalize
    fn metadata_json(params: &TokenParams, user_amount: f64) -> serde_json::Value {
        serde_json::json!({
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
            "mode": params.mode,
            "taxTier": params.tax_tier,
            "dev_fee_percentage": params.dev_fee_percentage,
            "bondingCurveType": params.bonding_curve_type,
            "reward_ca": params.reward_ca,
            "initialBuyAmount": user_amount,
        })
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
                "Meteora service {} returned {}: {}",
                path, status, text
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl LaunchAdapter for MeteoraAdapter {
    fn platform(&self) -> Platform {
        Platform::Meteora
    }

    async fn prepare(
        &self,
        params: &TokenParams,
        user_amount: f64,
    ) -> Result<Prepared, ChainError> {
        let body = Self::metadata_json(params, user_amount);
        let value = self.post_json("/api/token/prepare", body).await?;
        let response: PrepareResponse = serde_json::from_value(value)
            .map_err(|e| ChainError::InvalidResponse(format!("Meteora prepare: {}", e)))?;

        logger::info(
            LogTag::Launch,
            &format!(
                "Meteora prepared: request_id={} funding_wallet={} base_fee={} SOL",
                response.request_id, response.funding_wallet, response.amount_to_fund
            ),
        );

        Ok(Prepared {
            request_id: response.request_id,
            funding_wallet: response.funding_wallet,
            base_fee: response.amount_to_fund,
            auxiliary_signer: None,
        })
    }

    async fn finalize(
        &self,
        request_id: &str,
        params: &TokenParams,
        user_amount: f64,
    ) -> Result<String, ChainError> {
        let mut body = Self::metadata_json(params, user_amount);
        body["request_id"] = serde_json::json!(request_id);

        let value = self.post_json("/api/token/finalize", body).await?;
        let response: FinalizeResponse = serde_json::from_value(value)
            .map_err(|e| ChainError::InvalidResponse(format!("Meteora finalize: {}", e)))?;

        logger::info(
            LogTag::Launch,
            &format!("Meteora finalized: mint={}", response.mint),
        );
        Ok(response.mint)
    }
}
