/// Wallet session management
///
/// Abstracts over wallet providers behind one capability set:
/// connect, disconnect, balance, and transaction signing. Callers must
/// check which signing method a provider exposes and use whichever is
/// present; a provider with neither fails with a signing-support error.
use crate::errors::ChainError;
use crate::logger::{self, LogTag};
use crate::rpc;
use async_trait::async_trait;
use solana_sdk::{signature::Keypair, signer::Signer, transaction::Transaction};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// How long a balance query may take before being reported as failed
const BALANCE_TIMEOUT_SECS: u64 = 10;

/// A wallet backend. Capabilities are advertised so callers can pick the
/// signing path: sign-and-send preferred, sign-then-submit as fallback.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Provider display name, used for connect-by-name lookup
    fn name(&self) -> &'static str;

    /// Ask the provider to authorize the session; returns the public address
    async fn authorize(&self) -> Result<String, ChainError>;

    fn supports_sign_and_send(&self) -> bool {
        false
    }

    fn supports_sign(&self) -> bool {
        false
    }

    /// Sign and submit in one step, returning the signature
    async fn sign_and_send_transaction(&self, _tx: &mut Transaction) -> Result<String, ChainError> {
        Err(ChainError::SigningError(
            "Wallet does not support transaction signing".to_string(),
        ))
    }

    /// Add this wallet's signature to the transaction (the transaction may
    /// already carry partial signatures from other signers)
    async fn sign_transaction(&self, _tx: &mut Transaction) -> Result<(), ChainError> {
        Err(ChainError::SigningError(
            "Wallet does not support transaction signing".to_string(),
        ))
    }
}

/// Keypair-backed provider: full signing capability, key loaded from config
pub struct KeypairProvider {
    keypair: Arc<Keypair>,
}

impl KeypairProvider {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }
}

#[async_trait]
impl WalletProvider for KeypairProvider {
    fn name(&self) -> &'static str {
        "keypair"
    }

    async fn authorize(&self) -> Result<String, ChainError> {
        Ok(self.keypair.pubkey().to_string())
    }

    fn supports_sign_and_send(&self) -> bool {
        true
    }

    fn supports_sign(&self) -> bool {
        true
    }

    async fn sign_and_send_transaction(&self, tx: &mut Transaction) -> Result<String, ChainError> {
        self.sign_transaction(tx).await?;
        rpc::get_rpc_client().send_transaction(tx).await
    }

    async fn sign_transaction(&self, tx: &mut Transaction) -> Result<(), ChainError> {
        let blockhash = tx.message.recent_blockhash;
        tx.partial_sign(&[self.keypair.as_ref()], blockhash);
        Ok(())
    }
}

/// Watch-only provider: tracks an address, cannot sign anything
pub struct WatchOnlyProvider {
    address: String,
}

impl WatchOnlyProvider {
    pub fn new(address: String) -> Self {
        Self { address }
    }
}

#[async_trait]
impl WalletProvider for WatchOnlyProvider {
    fn name(&self) -> &'static str {
        "watch-only"
    }

    async fn authorize(&self) -> Result<String, ChainError> {
        Ok(self.address.clone())
    }
}

#[derive(Default)]
struct SessionState {
    provider: Option<Arc<dyn WalletProvider>>,
    address: Option<String>,
    balance: Option<f64>,
}

/// Tracks the connected provider, its address and the last known balance
pub struct WalletSession {
    providers: Vec<Arc<dyn WalletProvider>>,
    state: RwLock<SessionState>,
}

impl WalletSession {
    pub fn new(providers: Vec<Arc<dyn WalletProvider>>) -> Self {
        Self {
            providers,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Connect the named provider.
    ///
    /// Returns Ok(Some(address)) on success, Ok(None) when the user rejected
    /// the prompt (silent cancel: no error surfaced, no state mutated). Any
    /// other failure is surfaced and mutates nothing.
    pub async fn connect(&self, provider_name: &str) -> Result<Option<String>, ChainError> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.name() == provider_name)
            .cloned()
            .ok_or_else(|| {
                ChainError::ConfigError(format!("Unknown wallet provider '{}'", provider_name))
            })?;

        match provider.authorize().await {
            Ok(address) => {
                let mut state = self.state.write().await;
                state.provider = Some(provider);
                state.address = Some(address.clone());
                logger::info(
                    LogTag::Wallet,
                    &format!("Connected {} wallet: {}", provider_name, address),
                );
                Ok(Some(address))
            }
            Err(e) if e.is_user_rejection() => {
                logger::info(LogTag::Wallet, "User cancelled wallet connection");
                Ok(None)
            }
            Err(e) => {
                logger::error(
                    LogTag::Wallet,
                    &format!("Failed to connect {}: {}", provider_name, e),
                );
                Err(e)
            }
        }
    }

    /// Clear the connected provider, address and balance.
    ///
    /// Does not cancel an in-flight launch: a launch already holds the
    /// address as a value, not a live reference to this session.
    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        state.provider = None;
        state.address = None;
        state.balance = None;
        logger::info(LogTag::Wallet, "Wallet disconnected");
    }

    pub async fn address(&self) -> Option<String> {
        self.state.read().await.address.clone()
    }

    pub async fn active_provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.state.read().await.provider.clone()
    }

    /// Last balance successfully fetched, possibly stale
    pub async fn cached_balance(&self) -> Option<f64> {
        self.state.read().await.balance
    }

    /// Query the connected wallet's SOL balance.
    ///
    /// On failure the previous balance stays cached (stale-but-available)
    /// and the error is returned for display.
    pub async fn refresh_balance(&self) -> Result<f64, ChainError> {
        let address = self
            .address()
            .await
            .ok_or_else(|| ChainError::ConfigError("No wallet connected".to_string()))?;

        let fetch = rpc::get_rpc_client().get_sol_balance(&address);
        match tokio::time::timeout(Duration::from_secs(BALANCE_TIMEOUT_SECS), fetch).await {
            Ok(Ok(balance)) => {
                self.state.write().await.balance = Some(balance);
                Ok(balance)
            }
            Ok(Err(e)) => {
                logger::warning(LogTag::Wallet, &format!("Balance fetch failed: {}", e));
                Err(e)
            }
            Err(_) => {
                let e = ChainError::ApiError(format!(
                    "Balance query timed out after {}s",
                    BALANCE_TIMEOUT_SECS
                ));
                logger::warning(LogTag::Wallet, &format!("{}", e));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectingProvider;

    #[async_trait]
    impl WalletProvider for RejectingProvider {
        fn name(&self) -> &'static str {
            "rejecting"
        }

        async fn authorize(&self) -> Result<String, ChainError> {
            Err(ChainError::from_provider_error(Some(4001), "User rejected the request"))
        }
    }

    struct BrokenProvider;

    #[async_trait]
    impl WalletProvider for BrokenProvider {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn authorize(&self) -> Result<String, ChainError> {
            Err(ChainError::SigningError("extension unavailable".to_string()))
        }
    }

    fn session_with(providers: Vec<Arc<dyn WalletProvider>>) -> WalletSession {
        WalletSession::new(providers)
    }

    #[tokio::test]
    async fn test_connect_keypair_provider() {
        let keypair = Keypair::new();
        let expected = keypair.pubkey().to_string();
        let session = session_with(vec![Arc::new(KeypairProvider::new(keypair)) as Arc<dyn WalletProvider>]);

        let address = session.connect("keypair").await.unwrap();
        assert_eq!(address, Some(expected.clone()));
        assert_eq!(session.address().await, Some(expected));
    }

    #[tokio::test]
    async fn test_user_rejection_is_silent_cancel() {
        let session = session_with(vec![Arc::new(RejectingProvider) as Arc<dyn WalletProvider>]);

        let result = session.connect("rejecting").await.unwrap();
        assert_eq!(result, None);
        // No state mutated
        assert_eq!(session.address().await, None);
        assert!(session.active_provider().await.is_none());
    }

    #[tokio::test]
    async fn test_other_connect_errors_surface() {
        let session = session_with(vec![Arc::new(BrokenProvider) as Arc<dyn WalletProvider>]);

        let result = session.connect("broken").await;
        assert!(result.is_err());
        assert_eq!(session.address().await, None);
    }

    #[tokio::test]
    async fn test_unknown_provider_name() {
        let session = session_with(vec![]);
        assert!(session.connect("phantom-of-the-opera").await.is_err());
    }

    #[tokio::test]
    async fn test_disconnect_clears_state() {
        let keypair = Keypair::new();
        let session = session_with(vec![Arc::new(KeypairProvider::new(keypair)) as Arc<dyn WalletProvider>]);
        session.connect("keypair").await.unwrap();

        session.disconnect().await;
        assert_eq!(session.address().await, None);
        assert_eq!(session.cached_balance().await, None);
    }

    #[tokio::test]
    async fn test_watch_only_has_no_signing_capability() {
        let provider = WatchOnlyProvider::new("So11111111111111111111111111111111111111112".to_string());
        assert!(!provider.supports_sign_and_send());
        assert!(!provider.supports_sign());

        let mut tx = Transaction::default();
        let err = provider.sign_transaction(&mut tx).await.unwrap_err();
        assert!(err.to_string().contains("does not support transaction signing"));
    }
}
