use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};
use solana_sdk::signature::Keypair;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Check if an arbitrary flag was passed on the command line
pub fn has_cli_flag(flag: &str) -> bool {
    if let Ok(args) = CMD_ARGS.lock() {
        args.iter().any(|a| a == flag)
    } else {
        false
    }
}

fn default_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_revshare_base_url() -> String {
    "https://revshare.dev".to_string()
}

fn default_revshare_token() -> String {
    "AifiNoHLBaqDdNQvaSYL8X6c2HqB5kZdZrMr3LxDSEsn".to_string()
}

fn default_pumpfun_ipfs_url() -> String {
    "https://pump.fun/api/ipfs".to_string()
}

fn default_pumpfun_api_url() -> String {
    "https://pumpportal.fun/api".to_string()
}

fn default_raydium_api_url() -> String {
    "https://launch.revshare.dev/api/raydium".to_string()
}

fn default_solscan_api_url() -> String {
    "https://api.solscan.io/v2".to_string()
}

fn default_explorer_base_url() -> String {
    "https://solscan.io".to_string()
}

/// Runtime configuration loaded from configs.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configs {
    pub main_wallet_private: String,
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default)]
    pub rpc_fallbacks: Vec<String>,

    #[serde(default = "default_host")]
    pub webserver_host: String,
    #[serde(default = "default_port")]
    pub webserver_port: u16,

    #[serde(default = "default_revshare_base_url")]
    pub revshare_base_url: String,
    #[serde(default = "default_revshare_token")]
    pub revshare_token_address: String,
    #[serde(default = "default_pumpfun_ipfs_url")]
    pub pumpfun_ipfs_url: String,
    #[serde(default = "default_pumpfun_api_url")]
    pub pumpfun_api_url: String,
    #[serde(default = "default_raydium_api_url")]
    pub raydium_api_url: String,
    #[serde(default = "default_solscan_api_url")]
    pub solscan_api_url: String,
    #[serde(default = "default_explorer_base_url")]
    pub explorer_base_url: String,

    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub anthropic_api_key: String,
    #[serde(default)]
    pub gemini_api_key: String,
}

impl Configs {
    /// A configuration with every optional field at its default.
    /// Used by tests; production loads configs.json instead.
    pub fn with_wallet(main_wallet_private: impl Into<String>) -> Self {
        Self {
            main_wallet_private: main_wallet_private.into(),
            rpc_url: default_rpc_url(),
            rpc_fallbacks: vec![],
            webserver_host: default_host(),
            webserver_port: default_port(),
            revshare_base_url: default_revshare_base_url(),
            revshare_token_address: default_revshare_token(),
            pumpfun_ipfs_url: default_pumpfun_ipfs_url(),
            pumpfun_api_url: default_pumpfun_api_url(),
            raydium_api_url: default_raydium_api_url(),
            solscan_api_url: default_solscan_api_url(),
            explorer_base_url: default_explorer_base_url(),
            openai_api_key: String::new(),
            anthropic_api_key: String::new(),
            gemini_api_key: String::new(),
        }
    }
}

static CONFIGS: OnceCell<Configs> = OnceCell::new();

/// Read a configs.json file and install it as the global configuration
pub fn init_configs<P: AsRef<Path>>(path: P) -> Result<(), String> {
    let data = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.as_ref().display(), e))?;
    let configs: Configs =
        serde_json::from_str(&data).map_err(|e| format!("Invalid configs.json: {}", e))?;
    CONFIGS
        .set(configs)
        .map_err(|_| "Configs already initialized".to_string())
}

/// Install an already-built configuration (used by tests)
pub fn set_configs(configs: Configs) -> Result<(), String> {
    CONFIGS
        .set(configs)
        .map_err(|_| "Configs already initialized".to_string())
}

/// Get the global configuration
pub fn read_configs() -> Result<Configs, String> {
    CONFIGS
        .get()
        .cloned()
        .ok_or_else(|| "Configs not initialized".to_string())
}

/// Load the main wallet keypair from the configs
///
/// Accepts either a base58-encoded secret key or a `[1,2,3,...]` byte array.
pub fn load_wallet_from_config(configs: &Configs) -> Result<Keypair, String> {
    let raw = configs.main_wallet_private.trim();

    let bytes: Vec<u8> = if raw.starts_with('[') && raw.ends_with(']') {
        raw.trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(|s| s.trim().parse::<u8>())
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|e| format!("Failed to parse private key array: {}", e))?
    } else {
        bs58::decode(raw)
            .into_vec()
            .map_err(|e| format!("Invalid base58 private key: {}", e))?
    };

    if bytes.len() != 64 {
        return Err(format!(
            "Invalid private key length: expected 64 bytes, got {}",
            bytes.len()
        ));
    }

    Keypair::try_from(&bytes[..]).map_err(|e| format!("Failed to create keypair: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signer::Signer;

    #[test]
    fn test_load_wallet_base58() {
        let keypair = Keypair::new();
        let encoded = bs58::encode(keypair.to_bytes()).into_string();
        let configs = Configs::with_wallet(encoded);

        let loaded = load_wallet_from_config(&configs).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_load_wallet_array_format() {
        let keypair = Keypair::new();
        let bytes = keypair.to_bytes();
        let array = format!(
            "[{}]",
            bytes
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(",")
        );
        let configs = Configs::with_wallet(array);

        let loaded = load_wallet_from_config(&configs).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_load_wallet_rejects_short_key() {
        let configs = Configs::with_wallet(bs58::encode([1u8; 32]).into_string());
        assert!(load_wallet_from_config(&configs).is_err());
    }
}
