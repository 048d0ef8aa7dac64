/// Launch orchestrator
///
/// Sequences one launch attempt through the fixed step order
/// prepare -> fund -> confirm -> finalize -> persist. Steps are strictly
/// ordered because each depends on the previous step's output. At most one
/// attempt runs at a time; concurrent submissions are rejected, not queued.
///
/// Every attempt is mirrored in the launch_attempts ledger, written before
/// any funds move, so a crash or abandoned page between funding and
/// finalization leaves a visible row instead of silent loss.
use super::funding::{self, ChainGateway};
use super::{LaunchAdapter, Platform, TokenParams, MIN_USER_AMOUNT_SOL};
use crate::db::{AttemptStatus, Database, NewToken};
use crate::errors::ChainError;
use crate::logger::{self, LogTag};
use crate::rpc::parse_pubkey;
use crate::wallet::WalletProvider;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Where an attempt currently stands. Failed carries the user-facing
/// message; the form inputs are never touched on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "detail", rename_all = "snake_case")]
pub enum LaunchPhase {
    Idle,
    Preparing,
    AwaitingSignature,
    Confirming,
    Finalizing,
    Persisting,
    Succeeded,
    Failed(String),
}

/// Result of a successful attempt
#[derive(Debug, Clone, Serialize)]
pub struct LaunchOutcome {
    pub attempt_id: String,
    pub platform: Platform,
    pub mint: String,
    pub signature: String,
    pub explorer_url: String,
    /// False when the token finalized on-chain but the database insert
    /// failed; the blockchain state is authoritative, so the launch still
    /// counts as succeeded.
    pub recorded: bool,
}

/// Releases the busy flag when an attempt ends, whatever the path out
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct LaunchOrchestrator {
    adapters: HashMap<Platform, Arc<dyn LaunchAdapter>>,
    gateway: Arc<dyn ChainGateway>,
    db: Database,
    explorer_base_url: String,
    busy: AtomicBool,
    phase: RwLock<LaunchPhase>,
}

impl LaunchOrchestrator {
    pub fn new(
        adapters: Vec<Arc<dyn LaunchAdapter>>,
        gateway: Arc<dyn ChainGateway>,
        db: Database,
        explorer_base_url: String,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|a| (a.platform(), a))
            .collect();
        Self {
            adapters,
            gateway,
            db,
            explorer_base_url,
            busy: AtomicBool::new(false),
            phase: RwLock::new(LaunchPhase::Idle),
        }
    }

    /// Current phase snapshot (for the status endpoint)
    pub fn phase(&self) -> LaunchPhase {
        self.phase
            .read()
            .map(|p| p.clone())
            .unwrap_or(LaunchPhase::Idle)
    }

    fn set_phase(&self, phase: LaunchPhase) {
        if let Ok(mut current) = self.phase.write() {
            logger::debug(
                LogTag::Launch,
                &format!("Phase transition: {:?} -> {:?}", *current, phase),
            );
            *current = phase;
        }
    }

    /// Run one launch attempt end to end.
    ///
    /// `wallet_address` is captured by value at the call site: a session
    /// disconnect mid-flight does not cancel the attempt.
    pub async fn launch(
        &self,
        wallet: Arc<dyn WalletProvider>,
        wallet_address: String,
        platform: Platform,
        params: TokenParams,
        user_amount: f64,
    ) -> Result<LaunchOutcome, ChainError> {
        // Entry guard: one attempt at a time, rejected not queued
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ChainError::ApiError(
                "A launch is already in progress".to_string(),
            ));
        }
        let _guard = BusyGuard(&self.busy);

        // Input validation happens before any network call or ledger write
        params.validate()?;
        if user_amount < MIN_USER_AMOUNT_SOL {
            return Err(ChainError::InvalidAmount(format!(
                "Amount must be at least {} SOL",
                MIN_USER_AMOUNT_SOL
            )));
        }
        parse_pubkey(&wallet_address)?;

        let attempt_id = Uuid::new_v4().to_string();
        self.db
            .create_attempt(&attempt_id, platform.as_str(), &wallet_address, user_amount)?;

        logger::info(
            LogTag::Launch,
            &format!(
                "Starting {} launch: attempt={} wallet={} amount={} SOL",
                platform, attempt_id, wallet_address, user_amount
            ),
        );

        match self
            .run_attempt(&attempt_id, wallet, &wallet_address, platform, &params, user_amount)
            .await
        {
            Ok(outcome) => {
                self.set_phase(LaunchPhase::Succeeded);
                logger::info(
                    LogTag::Launch,
                    &format!(
                        "Launch succeeded: mint={} signature={} explorer={}",
                        outcome.mint, outcome.signature, outcome.explorer_url
                    ),
                );
                Ok(outcome)
            }
            Err(e) => {
                let message = e.to_string();
                if let Err(db_err) = self.db.fail_attempt(&attempt_id, &message) {
                    logger::error(
                        LogTag::Launch,
                        &format!("Failed to record attempt failure: {}", db_err),
                    );
                }
                if e.is_user_rejection() {
                    // Silent cancel: back to idle, no error banner
                    self.set_phase(LaunchPhase::Idle);
                    logger::info(LogTag::Launch, "Launch cancelled by user");
                } else {
                    self.set_phase(LaunchPhase::Failed(message.clone()));
                    logger::error(LogTag::Launch, &format!("Launch failed: {}", message));
                }
                Err(e)
            }
        }
    }

    async fn run_attempt(
        &self,
        attempt_id: &str,
        wallet: Arc<dyn WalletProvider>,
        wallet_address: &str,
        platform: Platform,
        params: &TokenParams,
        user_amount: f64,
    ) -> Result<LaunchOutcome, ChainError> {
        let adapter = self
            .adapters
            .get(&platform)
            .cloned()
            .ok_or_else(|| {
                ChainError::ConfigError(format!("No launch adapter for {}", platform))
            })?;

        // Step 1: preparation. Called exactly once per attempt.
        self.set_phase(LaunchPhase::Preparing);
        let prepared = adapter.prepare(params, user_amount).await?;
        self.db.mark_attempt_prepared(
            attempt_id,
            &prepared.request_id,
            &prepared.funding_wallet,
            prepared.base_fee,
        )?;

        let total = super::total_required(prepared.base_fee, user_amount);
        logger::info(
            LogTag::Launch,
            &format!(
                "Funding required: {} SOL ({} base fee + {} user amount) -> {}",
                total, prepared.base_fee, user_amount, prepared.funding_wallet
            ),
        );

        // Step 2: build and sign the funding transfer
        self.set_phase(LaunchPhase::AwaitingSignature);
        let payer = parse_pubkey(wallet_address)?;
        let destination = parse_pubkey(&prepared.funding_wallet)?;
        let (blockhash, _last_valid_block_height) = self.gateway.latest_blockhash().await?;

        let aux_pubkey = prepared
            .auxiliary_signer
            .as_ref()
            .map(|kp| solana_sdk::signer::Signer::pubkey(kp.as_ref()));
        let tx = funding::build_funding_transaction(
            &payer,
            &destination,
            total,
            aux_pubkey.as_ref(),
            blockhash,
        );

        let signature = funding::sign_and_submit(
            &wallet,
            &self.gateway,
            tx,
            prepared.auxiliary_signer.as_ref(),
        )
        .await?;
        self.db
            .advance_attempt(attempt_id, AttemptStatus::Funded, Some(&signature), None)?;
        logger::info(
            LogTag::Launch,
            &format!("Funding transaction submitted: {}", signature),
        );

        // Step 3: wait for finalized commitment. Inclusion with an on-chain
        // error surfaces as a failure from the gateway.
        self.set_phase(LaunchPhase::Confirming);
        self.gateway.confirm_finalized(&signature).await?;
        self.db
            .advance_attempt(attempt_id, AttemptStatus::Confirmed, None, None)?;
        logger::info(LogTag::Launch, &format!("Funding confirmed: {}", signature));

        // Step 4: finalization, only ever reached with confirmed funding
        self.set_phase(LaunchPhase::Finalizing);
        let mint = adapter
            .finalize(&prepared.request_id, params, user_amount)
            .await?;
        self.db
            .advance_attempt(attempt_id, AttemptStatus::Finalized, None, Some(&mint))?;

        // Step 5: persist before handing out the explorer link, so a user
        // navigating away right after success cannot lose the record
        self.set_phase(LaunchPhase::Persisting);
        let token = NewToken {
            mint_address: mint.clone(),
            name: params.name.clone(),
            symbol: params.symbol.clone(),
            description: Some(params.description.clone()),
            image_url: Some(params.image_url.clone()),
            creator_wallet: wallet_address.to_string(),
            developer_wallet: Some(wallet_address.to_string()),
            initial_buy_amount: Some(user_amount),
            website: params.website.clone(),
            twitter: params.twitter.clone(),
            telegram: params.telegram.clone(),
            dev_fee_percentage: params.dev_fee_percentage,
            bonding_curve_type: params.bonding_curve_type,
            tax_tier: params.tax_tier,
            pool_tax: params.pool_tax,
            mode: Some(params.mode),
            reward_ca: params.reward_ca.clone(),
            request_id: Some(prepared.request_id.clone()),
            visible: Some(params.visible),
            decimals: Some(params.decimals as i64),
            ..Default::default()
        };

        // A persistence failure does not undo the on-chain token: the
        // launch still reports success and the ledger row stays at
        // finalized for later backfill.
        let recorded = match self.db.insert_token(&token, platform.as_str()) {
            Ok(_) => {
                self.db
                    .advance_attempt(attempt_id, AttemptStatus::Recorded, None, None)?;
                true
            }
            Err(e) => {
                logger::error(
                    LogTag::Launch,
                    &format!(
                        "Token {} finalized on-chain but failed to persist: {}",
                        mint, e
                    ),
                );
                false
            }
        };

        Ok(LaunchOutcome {
            attempt_id: attempt_id.to_string(),
            platform,
            explorer_url: format!("{}/token/{}", self.explorer_base_url, mint),
            mint,
            signature,
            recorded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::Prepared;
    use async_trait::async_trait;
    use solana_sdk::hash::Hash;
    use solana_sdk::signature::Keypair;
    use solana_sdk::signer::Signer;
    use solana_sdk::transaction::Transaction;
    use std::sync::atomic::AtomicUsize;

    // ---------------------------------------------------------------------
    // Test doubles
    // ---------------------------------------------------------------------

    #[derive(Default)]
    struct CallCounts {
        prepare: AtomicUsize,
        finalize: AtomicUsize,
    }

    struct MockAdapter {
        platform: Platform,
        counts: Arc<CallCounts>,
        fail_prepare: bool,
        fail_finalize: bool,
        with_aux_signer: bool,
    }

    impl MockAdapter {
        fn meteora(counts: Arc<CallCounts>) -> Self {
            Self {
                platform: Platform::Meteora,
                counts,
                fail_prepare: false,
                fail_finalize: false,
                with_aux_signer: false,
            }
        }
    }

    #[async_trait]
    impl LaunchAdapter for MockAdapter {
        fn platform(&self) -> Platform {
            self.platform
        }

        async fn prepare(
            &self,
            _params: &TokenParams,
            _user_amount: f64,
        ) -> Result<Prepared, ChainError> {
            self.counts.prepare.fetch_add(1, Ordering::SeqCst);
            if self.fail_prepare {
                return Err(ChainError::ApiError("prepare exploded".to_string()));
            }
            Ok(Prepared {
                request_id: "req-1".to_string(),
                funding_wallet: unique_pubkey_string(),
                base_fee: 0.05,
                auxiliary_signer: if self.with_aux_signer {
                    Some(Arc::new(Keypair::new()))
                } else {
                    None
                },
            })
        }

        async fn finalize(
            &self,
            request_id: &str,
            _params: &TokenParams,
            _user_amount: f64,
        ) -> Result<String, ChainError> {
            self.counts.finalize.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request_id, "req-1");
            if self.fail_finalize {
                return Err(ChainError::ApiError("finalize exploded".to_string()));
            }
            Ok(unique_pubkey_string())
        }
    }

    fn unique_pubkey_string() -> String {
        solana_sdk::pubkey::Pubkey::new_unique().to_string()
    }

    struct MockGateway {
        submits: AtomicUsize,
        confirms: AtomicUsize,
        confirm_error: Option<String>,
    }

    impl MockGateway {
        fn ok() -> Self {
            Self {
                submits: AtomicUsize::new(0),
                confirms: AtomicUsize::new(0),
                confirm_error: None,
            }
        }

        fn failing_confirmation(error: &str) -> Self {
            Self {
                confirm_error: Some(error.to_string()),
                ..Self::ok()
            }
        }
    }

    #[async_trait]
    impl ChainGateway for MockGateway {
        async fn latest_blockhash(&self) -> Result<(Hash, u64), ChainError> {
            Ok((Hash::new_unique(), 1000))
        }

        async fn submit(&self, tx: &Transaction) -> Result<String, ChainError> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            Ok(tx.signatures[0].to_string())
        }

        async fn confirm_finalized(&self, _signature: &str) -> Result<(), ChainError> {
            self.confirms.fetch_add(1, Ordering::SeqCst);
            if let Some(error) = &self.confirm_error {
                return Err(ChainError::TransactionError(error.clone()));
            }
            Ok(())
        }
    }

    struct SigningWallet {
        keypair: Keypair,
    }

    impl SigningWallet {
        fn new() -> Self {
            Self {
                keypair: Keypair::new(),
            }
        }

        fn address(&self) -> String {
            self.keypair.pubkey().to_string()
        }
    }

    #[async_trait]
    impl crate::wallet::WalletProvider for SigningWallet {
        fn name(&self) -> &'static str {
            "test-signer"
        }

        async fn authorize(&self) -> Result<String, ChainError> {
            Ok(self.address())
        }

        fn supports_sign(&self) -> bool {
            true
        }

        async fn sign_transaction(&self, tx: &mut Transaction) -> Result<(), ChainError> {
            let blockhash = tx.message.recent_blockhash;
            tx.partial_sign(&[&self.keypair], blockhash);
            Ok(())
        }
    }

    struct RejectingWallet;

    #[async_trait]
    impl crate::wallet::WalletProvider for RejectingWallet {
        fn name(&self) -> &'static str {
            "rejecting"
        }

        async fn authorize(&self) -> Result<String, ChainError> {
            Ok("unused".to_string())
        }

        fn supports_sign(&self) -> bool {
            true
        }

        async fn sign_transaction(&self, _tx: &mut Transaction) -> Result<(), ChainError> {
            Err(ChainError::from_provider_error(Some(4001), "User rejected the request"))
        }
    }

    fn valid_params() -> TokenParams {
        TokenParams {
            name: "Agent Coin".to_string(),
            symbol: "AGNT".to_string(),
            description: "A coin for an agent".to_string(),
            image_url: "https://cdn.example/agent.png".to_string(),
            ..Default::default()
        }
    }

    fn orchestrator_with(
        adapter: MockAdapter,
        gateway: MockGateway,
        db: Database,
    ) -> LaunchOrchestrator {
        LaunchOrchestrator::new(
            vec![Arc::new(adapter) as Arc<dyn LaunchAdapter>],
            Arc::new(gateway),
            db,
            "https://solscan.io".to_string(),
        )
    }

    // ---------------------------------------------------------------------
    // Tests
    // ---------------------------------------------------------------------

    #[tokio::test]
    async fn test_happy_path_persists_and_returns_explorer_url() {
        let counts = Arc::new(CallCounts::default());
        let db = Database::open_in_memory().unwrap();
        let orchestrator = orchestrator_with(
            MockAdapter::meteora(counts.clone()),
            MockGateway::ok(),
            db.clone(),
        );

        let wallet = SigningWallet::new();
        let address = wallet.address();
        let outcome = orchestrator
            .launch(Arc::new(wallet), address.clone(), Platform::Meteora, valid_params(), 0.1)
            .await
            .unwrap();

        assert!(outcome.recorded);
        assert!(outcome.explorer_url.contains(&outcome.mint));
        assert_eq!(counts.prepare.load(Ordering::SeqCst), 1);
        assert_eq!(counts.finalize.load(Ordering::SeqCst), 1);
        assert_eq!(orchestrator.phase(), LaunchPhase::Succeeded);

        // Token row exists and attempt reached terminal state
        let token = db.token_by_mint(&outcome.mint).unwrap().unwrap();
        assert_eq!(token.creator_wallet, address);
        assert_eq!(db.list_attempts(10).unwrap()[0].status, "recorded");
    }

    #[tokio::test]
    async fn test_preparation_failure_writes_no_token_row() {
        let counts = Arc::new(CallCounts::default());
        let db = Database::open_in_memory().unwrap();
        let adapter = MockAdapter {
            fail_prepare: true,
            ..MockAdapter::meteora(counts.clone())
        };
        let orchestrator = orchestrator_with(adapter, MockGateway::ok(), db.clone());

        let wallet = SigningWallet::new();
        let address = wallet.address();
        let result = orchestrator
            .launch(Arc::new(wallet), address, Platform::Meteora, valid_params(), 0.1)
            .await;

        assert!(result.is_err());
        assert_eq!(counts.finalize.load(Ordering::SeqCst), 0);
        assert!(db.recent_tokens(10).unwrap().is_empty());
        assert!(matches!(orchestrator.phase(), LaunchPhase::Failed(_)));
        assert_eq!(db.list_attempts(10).unwrap()[0].status, "failed");
    }

    #[tokio::test]
    async fn test_confirmation_error_blocks_finalize() {
        let counts = Arc::new(CallCounts::default());
        let db = Database::open_in_memory().unwrap();
        let orchestrator = orchestrator_with(
            MockAdapter::meteora(counts.clone()),
            MockGateway::failing_confirmation("Transaction failed on-chain: InstructionError"),
            db.clone(),
        );

        let wallet = SigningWallet::new();
        let address = wallet.address();
        let result = orchestrator
            .launch(Arc::new(wallet), address, Platform::Meteora, valid_params(), 0.1)
            .await;

        assert!(result.is_err());
        // Finalize never ran without an error-free confirmation
        assert_eq!(counts.finalize.load(Ordering::SeqCst), 0);
        assert!(db.recent_tokens(10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_finalize_failure_leaves_stuck_attempt() {
        let counts = Arc::new(CallCounts::default());
        let db = Database::open_in_memory().unwrap();
        let adapter = MockAdapter {
            fail_finalize: true,
            ..MockAdapter::meteora(counts.clone())
        };
        let orchestrator = orchestrator_with(adapter, MockGateway::ok(), db.clone());

        let wallet = SigningWallet::new();
        let address = wallet.address();
        let result = orchestrator
            .launch(Arc::new(wallet), address, Platform::Meteora, valid_params(), 0.1)
            .await;

        assert!(result.is_err());
        assert!(db.recent_tokens(10).unwrap().is_empty());
        // The ledger kept the funded/confirmed trail before the failure
        let attempt = &db.list_attempts(10).unwrap()[0];
        assert_eq!(attempt.status, "failed");
        assert!(attempt.signature.is_some());
    }

    #[tokio::test]
    async fn test_busy_guard_rejects_concurrent_attempt() {
        let counts = Arc::new(CallCounts::default());
        let db = Database::open_in_memory().unwrap();
        let orchestrator = Arc::new(orchestrator_with(
            MockAdapter::meteora(counts.clone()),
            MockGateway::ok(),
            db,
        ));

        // Simulate an in-flight attempt holding the flag
        orchestrator.busy.store(true, Ordering::SeqCst);

        let wallet = SigningWallet::new();
        let address = wallet.address();
        let result = orchestrator
            .launch(Arc::new(wallet), address, Platform::Meteora, valid_params(), 0.1)
            .await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("already in progress"));
        assert_eq!(counts.prepare.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_busy_flag_released_after_failure() {
        let counts = Arc::new(CallCounts::default());
        let db = Database::open_in_memory().unwrap();
        let adapter = MockAdapter {
            fail_prepare: true,
            ..MockAdapter::meteora(counts.clone())
        };
        let orchestrator = orchestrator_with(adapter, MockGateway::ok(), db);

        let wallet = SigningWallet::new();
        let address = wallet.address();
        let _ = orchestrator
            .launch(Arc::new(wallet), address, Platform::Meteora, valid_params(), 0.1)
            .await;

        assert!(!orchestrator.busy.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_user_rejection_is_silent_and_idle() {
        let counts = Arc::new(CallCounts::default());
        let db = Database::open_in_memory().unwrap();
        let orchestrator = orchestrator_with(
            MockAdapter::meteora(counts.clone()),
            MockGateway::ok(),
            db.clone(),
        );

        let address = unique_pubkey_string();
        let result = orchestrator
            .launch(Arc::new(RejectingWallet), address, Platform::Meteora, valid_params(), 0.1)
            .await;

        assert!(result.unwrap_err().is_user_rejection());
        assert_eq!(orchestrator.phase(), LaunchPhase::Idle);
        assert!(db.recent_tokens(10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sub_minimum_amount_rejected_before_any_call() {
        let counts = Arc::new(CallCounts::default());
        let db = Database::open_in_memory().unwrap();
        let orchestrator = orchestrator_with(
            MockAdapter::meteora(counts.clone()),
            MockGateway::ok(),
            db.clone(),
        );

        let wallet = SigningWallet::new();
        let address = wallet.address();
        let result = orchestrator
            .launch(Arc::new(wallet), address, Platform::Meteora, valid_params(), 0.05)
            .await;

        assert!(result.is_err());
        assert_eq!(counts.prepare.load(Ordering::SeqCst), 0);
        // Nothing hit the ledger either: rejected before the attempt opened
        assert!(db.list_attempts(10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_platform_adapter_fails_cleanly() {
        let counts = Arc::new(CallCounts::default());
        let db = Database::open_in_memory().unwrap();
        // Only a meteora adapter registered
        let orchestrator = orchestrator_with(
            MockAdapter::meteora(counts.clone()),
            MockGateway::ok(),
            db,
        );

        let wallet = SigningWallet::new();
        let address = wallet.address();
        let result = orchestrator
            .launch(Arc::new(wallet), address, Platform::Raydium, valid_params(), 0.5)
            .await;

        assert!(result.unwrap_err().to_string().contains("No launch adapter"));
    }

    #[tokio::test]
    async fn test_aux_signer_flow_reaches_success() {
        let counts = Arc::new(CallCounts::default());
        let db = Database::open_in_memory().unwrap();
        let adapter = MockAdapter {
            platform: Platform::Pumpfun,
            with_aux_signer: true,
            ..MockAdapter::meteora(counts.clone())
        };
        let orchestrator = orchestrator_with(adapter, MockGateway::ok(), db.clone());

        let wallet = SigningWallet::new();
        let address = wallet.address();
        let outcome = orchestrator
            .launch(Arc::new(wallet), address, Platform::Pumpfun, valid_params(), 1.0)
            .await
            .unwrap();

        assert!(outcome.recorded);
        let token = db.token_by_mint(&outcome.mint).unwrap().unwrap();
        assert_eq!(token.platform, "pumpfun");
    }
}
