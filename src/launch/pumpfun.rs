/// PumpFun launch adapter
///
/// PumpFun launches differ from the other platforms in two ways: token
/// metadata is pinned to IPFS before the launch service is involved, and
/// the client generates the mint keypair itself. That keypair must co-sign
/// the funding transaction (before the wallet) so the service can verify
/// the client controls the mint it will create.
///
/// Endpoints:
/// - POST {ipfs}                     -> { metadata: { name, symbol }, metadataUri }
/// - POST {base}/token/prepare      -> { request_id, funding_wallet, amount_to_fund }
/// - POST {base}/token/finalize     -> { mint }
use super::{LaunchAdapter, Platform, Prepared, TokenParams};
use crate::errors::ChainError;
use crate::global::read_configs;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use serde::Deserialize;
use solana_sdk::{signature::Keypair, signer::Signer};
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct IpfsMetadata {
    name: String,
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct IpfsResponse {
    metadata: IpfsMetadata,
    #[serde(rename = "metadataUri")]
    metadata_uri: String,
}

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

pub struct PumpFunAdapter {
    client: reqwest::Client,
    base_url: String,
    ipfs_url: String,
}

impl PumpFunAdapter {
    pub fn new(base_url: String, ipfs_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            ipfs_url,
        }
    }

    pub fn from_config() -> Result<Self, ChainError> {
        let configs = read_configs().map_err(ChainError::ConfigError)?;
        Ok(Self::new(configs.pumpfun_api_url, configs.pumpfun_ipfs_url))
    }

    /// Fetch the token image and pin metadata to IPFS
    async fn upload_metadata(&self, params: &TokenParams) -> Result<IpfsResponse, ChainError> {
        let image = self
            .client
            .get(&params.image_url)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await?
            .bytes()
            .await?;

        let mut form = reqwest::multipart::Form::new()
            .text("name", params.name.clone())
            .text("symbol", params.symbol.clone())
            .text("description", params.description.clone())
            .text("showName", "true")
            .part(
                "file",
                reqwest::multipart::Part::bytes(image.to_vec()).file_name("token.png"),
            );

        for (field, value) in [
            ("twitter", &params.twitter),
            ("telegram", &params.telegram),
            ("website", &params.website),
        ] {
            if let Some(value) = value {
                if !value.is_empty() {
                    form = form.text(field, value.clone());
                }
            }
        }

        let response = self
            .client
            .post(&self.ipfs_url)
            .multipart(form)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ChainError::ApiError(format!(
                "PumpFun IPFS upload returned {}: {}",
                status, text
            )));
        }

        Ok(response.json().await?)
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
                "PumpFun service {} returned {}: {}",
                path, status, text
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl LaunchAdapter for PumpFunAdapter {
    fn platform(&self) -> Platform {
        Platform::Pumpfun
    }

    async fn prepare(
        &self,
        params: &TokenParams,
        user_amount: f64,
    ) -> Result<Prepared, ChainError> {
        let ipfs = self.upload_metadata(params).await?;
        logger::info(
            LogTag::Launch,
            &format!("PumpFun metadata pinned: {}", ipfs.metadata_uri),
        );

        // The mint keypair is generated client-side; its pubkey becomes the
        // token's mint address after finalization.
        let mint_keypair = Arc::new(Keypair::new());
        logger::info(
            LogTag::Launch,
            &format!("Generated mint keypair: {}", mint_keypair.pubkey()),
        );

        let body = serde_json::json!({
            "publicKey": params.developer_wallet,
            "action": "create",
            "tokenMetadata": {
                "name": ipfs.metadata.name,
                "symbol": ipfs.metadata.symbol,
                "uri": ipfs.metadata_uri,
            },
            "mint": mint_keypair.pubkey().to_string(),
            "denominatedInSol": "true",
            "amount": user_amount,
            "slippage": 10,
            "priorityFee": 0.0005,
            "pool": "pump",
        });

        let value = self.post_json("/token/prepare", body).await?;
        let response: PrepareResponse = serde_json::from_value(value)
            .map_err(|e| ChainError::InvalidResponse(format!("PumpFun prepare: {}", e)))?;

        logger::info(
            LogTag::Launch,
            &format!(
                "PumpFun prepared: request_id={} funding_wallet={} base_fee={} SOL",
                response.request_id, response.funding_wallet, response.amount_to_fund
            ),
        );

        Ok(Prepared {
            request_id: response.request_id,
            funding_wallet: response.funding_wallet,
            base_fee: response.amount_to_fund,
            auxiliary_signer: Some(mint_keypair),
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
            "publicKey": params.developer_wallet,
            "amount": user_amount,
        });

        let value = self.post_json("/token/finalize", body).await?;
        let response: FinalizeResponse = serde_json::from_value(value)
            .map_err(|e| ChainError::InvalidResponse(format!("PumpFun finalize: {}", e)))?;

        logger::info(
            LogTag::Launch,
            &format!("PumpFun finalized: mint={}", response.mint),
        );
        Ok(response.mint)
    }
}
