/// Token launch flow
///
/// The launch path is the same for every platform: prepare (the launch
/// service allocates a funding wallet and quotes a base fee), fund (a
/// native SOL transfer from the user's wallet), confirm (finalized
/// commitment), finalize (the service mints the token), persist (one
/// tokens row). Platform differences live behind the LaunchAdapter trait.
use crate::errors::ChainError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solana_sdk::signature::Keypair;
use std::sync::Arc;

pub mod funding;
pub mod meteora;
pub mod orchestrator;
pub mod pumpfun;
pub mod raydium;

pub use orchestrator::{LaunchOrchestrator, LaunchOutcome, LaunchPhase};

/// Fixed Raydium base fee. Raydium's service quotes no fee of its own.
pub const RAYDIUM_BASE_FEE_SOL: f64 = 0.45;

/// Minimum user amount accepted for any platform
pub const MIN_USER_AMOUNT_SOL: f64 = 0.1;

/// Recommended initial buy for PumpFun launches
pub const PUMPFUN_RECOMMENDED_BUY_SOL: f64 = 1.0;

/// Display estimate of the Meteora base fee shown before prepare returns
/// the authoritative quote
pub const METEORA_BASE_FEE_ESTIMATE_SOL: f64 = 0.05;

/// Launch platform. A closed set: unknown platform strings are rejected
/// instead of falling through to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Meteora,
    Pumpfun,
    Raydium,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Meteora => "meteora",
            Platform::Pumpfun => "pumpfun",
            Platform::Raydium => "raydium",
        }
    }

    pub fn parse(s: &str) -> Option<Platform> {
        match s {
            "meteora" => Some(Platform::Meteora),
            "pumpfun" => Some(Platform::Pumpfun),
            "raydium" => Some(Platform::Raydium),
            _ => None,
        }
    }

    pub fn all() -> &'static [Platform] {
        &[Platform::Meteora, Platform::Pumpfun, Platform::Raydium]
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Token metadata entered in the launch form. The user amount (initial buy
/// or liquidity, depending on platform) travels separately.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TokenParams {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub telegram: Option<String>,
    #[serde(default)]
    pub developer_wallet: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    #[serde(default)]
    pub mode: i64,
    #[serde(default)]
    pub visible: i64,
    #[serde(default)]
    pub tax_tier: Option<f64>,
    #[serde(default)]
    pub pool_tax: Option<f64>,
    #[serde(default)]
    pub dev_fee_percentage: Option<f64>,
    #[serde(default)]
    pub bonding_curve_type: Option<i64>,
    #[serde(default)]
    pub reward_ca: Option<String>,
}

fn default_decimals() -> u8 {
    9
}

impl TokenParams {
    /// Pre-network validation: required fields present, nothing malformed.
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.name.trim().is_empty() {
            return Err(ChainError::InvalidAmount("Token name is required".to_string()));
        }
        if self.symbol.trim().is_empty() {
            return Err(ChainError::InvalidAmount("Token symbol is required".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(ChainError::InvalidAmount(
                "Token description is required".to_string(),
            ));
        }
        if self.image_url.trim().is_empty() {
            return Err(ChainError::InvalidAmount("Token image is required".to_string()));
        }
        for (label, link) in [
            ("website", &self.website),
            ("twitter", &self.twitter),
            ("telegram", &self.telegram),
        ] {
            if let Some(value) = link {
                if !value.is_empty() && url::Url::parse(value).is_err() {
                    return Err(ChainError::InvalidAmount(format!(
                        "Invalid {} URL: {}",
                        label, value
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Preparation result: everything needed to fund and later finalize.
pub struct Prepared {
    /// Opaque id tying prepare and finalize together
    pub request_id: String,
    /// Destination of the funding transfer
    pub funding_wallet: String,
    /// Authoritative base fee quoted by the service (or the fixed Raydium
    /// constant)
    pub base_fee: f64,
    /// Extra signer that must co-sign the funding transaction before the
    /// wallet does (PumpFun's mint keypair); None for other platforms
    pub auxiliary_signer: Option<Arc<Keypair>>,
}

/// Per-platform launch service client.
///
/// `prepare` must be called at most once per attempt; two calls are not
/// assumed to return the same request_id. `finalize` must only run after
/// the funding transfer reached finalized commitment.
#[async_trait]
pub trait LaunchAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    async fn prepare(
        &self,
        params: &TokenParams,
        user_amount: f64,
    ) -> Result<Prepared, ChainError>;

    async fn finalize(
        &self,
        request_id: &str,
        params: &TokenParams,
        user_amount: f64,
    ) -> Result<String, ChainError>;
}

/// Total SOL the funding transfer must carry
pub fn total_required(base_fee: f64, user_amount: f64) -> f64 {
    base_fee + user_amount
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse_is_closed() {
        assert_eq!(Platform::parse("meteora"), Some(Platform::Meteora));
        assert_eq!(Platform::parse("pumpfun"), Some(Platform::Pumpfun));
        assert_eq!(Platform::parse("raydium"), Some(Platform::Raydium));
        assert_eq!(Platform::parse("Meteora"), None);
        assert_eq!(Platform::parse("uniswap"), None);
        assert_eq!(Platform::parse(""), None);
    }

    #[test]
    fn test_total_required() {
        let total = total_required(METEORA_BASE_FEE_ESTIMATE_SOL, 0.1);
        assert!((total - 0.15).abs() < 1e-12);
        assert_eq!(crate::rpc::sol_to_lamports(total), 150_000_000);

        let raydium_total = total_required(RAYDIUM_BASE_FEE_SOL, 0.1);
        assert!((raydium_total - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_params_validation_requires_core_fields() {
        let mut params = TokenParams {
            name: "Agent Coin".to_string(),
            symbol: "AGNT".to_string(),
            description: "A token".to_string(),
            image_url: "https://cdn/img.png".to_string(),
            ..Default::default()
        };
        assert!(params.validate().is_ok());

        params.symbol = "  ".to_string();
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_params_validation_checks_social_urls() {
        let params = TokenParams {
            name: "Agent Coin".to_string(),
            symbol: "AGNT".to_string(),
            description: "A token".to_string(),
            image_url: "https://cdn/img.png".to_string(),
            website: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
