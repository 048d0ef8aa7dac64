/// Funding transaction: build, sign, submit, confirm
///
/// One native transfer from the user's wallet to the funding wallet the
/// launch service allocated, for base fee + user amount.
use crate::errors::ChainError;
use crate::logger::{self, LogTag};
use crate::rpc::{self, sol_to_lamports};
use crate::wallet::WalletProvider;
use async_trait::async_trait;
use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Keypair, signer::Signer, system_instruction,
    transaction::Transaction,
};
use std::sync::Arc;

/// Chain operations the launch flow needs. The production implementation
/// delegates to the global RPC client; tests substitute their own.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    async fn latest_blockhash(&self) -> Result<(Hash, u64), ChainError>;
    async fn submit(&self, tx: &Transaction) -> Result<String, ChainError>;
    async fn confirm_finalized(&self, signature: &str) -> Result<(), ChainError>;
}

/// Gateway backed by the global RPC client
pub struct RpcGateway;

#[async_trait]
impl ChainGateway for RpcGateway {
    async fn latest_blockhash(&self) -> Result<(Hash, u64), ChainError> {
        rpc::get_rpc_client().get_latest_blockhash().await
    }

    async fn submit(&self, tx: &Transaction) -> Result<String, ChainError> {
        rpc::get_rpc_client().send_transaction(tx).await
    }

    async fn confirm_finalized(&self, signature: &str) -> Result<(), ChainError> {
        rpc::get_rpc_client()
            .confirm_transaction_finalized(signature)
            .await
            .map(|_| ())
    }
}

/// Build the funding transfer.
///
/// When an auxiliary signer is present (PumpFun's mint keypair) a
/// zero-lamport self-transfer from the mint is appended: it makes the mint
/// a required co-signer, proving the client holds the mint key the service
/// will mint under.
pub fn build_funding_transaction(
    payer: &Pubkey,
    destination: &Pubkey,
    total_sol: f64,
    auxiliary_signer: Option<&Pubkey>,
    blockhash: Hash,
) -> Transaction {
    let lamports = sol_to_lamports(total_sol);

    let mut instructions = vec![system_instruction::transfer(payer, destination, lamports)];
    if let Some(aux) = auxiliary_signer {
        instructions.push(system_instruction::transfer(aux, aux, 0));
    }

    let mut tx = Transaction::new_with_payer(&instructions, Some(payer));
    tx.message.recent_blockhash = blockhash;
    tx
}

/// Sign and submit the funding transaction.
///
/// Signing order matters: the auxiliary keypair partial-signs first, the
/// wallet signs second so the wallet signature is the final, completing
/// signature over a transaction that already carries the mint's partial
/// signature.
///
/// Capability-tested: sign-and-send is preferred; sign-then-submit is the
/// fallback; a wallet with neither fails rather than silently no-op-ing.
pub async fn sign_and_submit(
    wallet: &Arc<dyn WalletProvider>,
    gateway: &Arc<dyn ChainGateway>,
    mut tx: Transaction,
    auxiliary_signer: Option<&Arc<Keypair>>,
) -> Result<String, ChainError> {
    if let Some(aux) = auxiliary_signer {
        let blockhash = tx.message.recent_blockhash;
        tx.partial_sign(&[aux.as_ref()], blockhash);
        logger::debug(
            LogTag::Launch,
            &format!("Auxiliary signer {} added", aux.pubkey()),
        );
    }

    if wallet.supports_sign_and_send() {
        return wallet.sign_and_send_transaction(&mut tx).await;
    }

    if wallet.supports_sign() {
        wallet.sign_transaction(&mut tx).await?;
        return gateway.submit(&tx).await;
    }

    Err(ChainError::SigningError(
        "Wallet does not support transaction signing".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::KeypairProvider;

    struct NoopGateway;

    #[async_trait]
    impl ChainGateway for NoopGateway {
        async fn latest_blockhash(&self) -> Result<(Hash, u64), ChainError> {
            Ok((Hash::new_unique(), 0))
        }

        async fn submit(&self, tx: &Transaction) -> Result<String, ChainError> {
            Ok(tx
                .signatures
                .first()
                .map(|s| s.to_string())
                .unwrap_or_default())
        }

        async fn confirm_finalized(&self, _signature: &str) -> Result<(), ChainError> {
            Ok(())
        }
    }

    struct SignOnlyWallet {
        keypair: Keypair,
    }

    #[async_trait]
    impl WalletProvider for SignOnlyWallet {
        fn name(&self) -> &'static str {
            "sign-only"
        }

        async fn authorize(&self) -> Result<String, ChainError> {
            Ok(self.keypair.pubkey().to_string())
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

    struct NoCapabilityWallet;

    #[async_trait]
    impl WalletProvider for NoCapabilityWallet {
        fn name(&self) -> &'static str {
            "none"
        }

        async fn authorize(&self) -> Result<String, ChainError> {
            Ok("unused".to_string())
        }
    }

    #[test]
    fn test_transfer_amount_is_rounded_lamports() {
        let payer = Keypair::new();
        let destination = Pubkey::new_unique();
        let tx = build_funding_transaction(
            &payer.pubkey(),
            &destination,
            0.15,
            None,
            Hash::new_unique(),
        );

        assert_eq!(tx.message.instructions.len(), 1);
        // System transfer data: 4-byte discriminator then u64 lamports
        let data = &tx.message.instructions[0].data;
        let lamports = u64::from_le_bytes(data[4..12].try_into().unwrap());
        assert_eq!(lamports, 150_000_000);
    }

    #[test]
    fn test_auxiliary_signer_becomes_required_signer() {
        let payer = Keypair::new();
        let mint = Keypair::new();
        let tx = build_funding_transaction(
            &payer.pubkey(),
            &Pubkey::new_unique(),
            1.0,
            Some(&mint.pubkey()),
            Hash::new_unique(),
        );

        assert_eq!(tx.message.header.num_required_signatures, 2);
        assert_eq!(tx.message.account_keys[0], payer.pubkey());
        assert_eq!(tx.message.account_keys[1], mint.pubkey());
    }

    #[tokio::test]
    async fn test_mint_signs_before_wallet() {
        let payer = Keypair::new();
        let mint = Arc::new(Keypair::new());
        let blockhash = Hash::new_unique();

        let mut tx = build_funding_transaction(
            &payer.pubkey(),
            &Pubkey::new_unique(),
            1.0,
            Some(&mint.pubkey()),
            blockhash,
        );

        // Mint partial-signs first: its slot fills, the wallet slot stays empty
        tx.partial_sign(&[mint.as_ref()], blockhash);
        let default_sig = solana_sdk::signature::Signature::default();
        assert_eq!(tx.signatures[0], default_sig);
        assert_ne!(tx.signatures[1], default_sig);

        // Wallet signature completes the transaction
        tx.partial_sign(&[&payer], blockhash);
        assert_ne!(tx.signatures[0], default_sig);
        assert!(tx.is_signed());
        assert!(tx.verify().is_ok());
    }

    #[tokio::test]
    async fn test_sign_then_submit_fallback() {
        let keypair = Keypair::new();
        let payer_pubkey = keypair.pubkey();
        let wallet: Arc<dyn WalletProvider> = Arc::new(SignOnlyWallet { keypair });
        let gateway: Arc<dyn ChainGateway> = Arc::new(NoopGateway);

        let tx = build_funding_transaction(
            &payer_pubkey,
            &Pubkey::new_unique(),
            0.2,
            None,
            Hash::new_unique(),
        );

        let signature = sign_and_submit(&wallet, &gateway, tx, None).await.unwrap();
        assert!(!signature.is_empty());
    }

    #[tokio::test]
    async fn test_no_signing_capability_fails() {
        let wallet: Arc<dyn WalletProvider> = Arc::new(NoCapabilityWallet);
        let gateway: Arc<dyn ChainGateway> = Arc::new(NoopGateway);

        let tx = build_funding_transaction(
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            0.2,
            None,
            Hash::new_unique(),
        );

        let err = sign_and_submit(&wallet, &gateway, tx, None).await.unwrap_err();
        assert!(err.to_string().contains("does not support transaction signing"));
    }

    #[tokio::test]
    async fn test_full_pumpfun_signing_via_provider() {
        let wallet_keypair = Keypair::new();
        let payer_pubkey = wallet_keypair.pubkey();
        let mint = Arc::new(Keypair::new());

        struct LocalSigner(Keypair);

        #[async_trait]
        impl WalletProvider for LocalSigner {
            fn name(&self) -> &'static str {
                "local"
            }

            async fn authorize(&self) -> Result<String, ChainError> {
                Ok(self.0.pubkey().to_string())
            }

            fn supports_sign(&self) -> bool {
                true
            }

            async fn sign_transaction(&self, tx: &mut Transaction) -> Result<(), ChainError> {
                let blockhash = tx.message.recent_blockhash;
                tx.partial_sign(&[&self.0], blockhash);
                Ok(())
            }
        }

        let wallet: Arc<dyn WalletProvider> = Arc::new(LocalSigner(wallet_keypair));
        let gateway: Arc<dyn ChainGateway> = Arc::new(NoopGateway);

        let tx = build_funding_transaction(
            &payer_pubkey,
            &Pubkey::new_unique(),
            1.05,
            Some(&mint.pubkey()),
            Hash::new_unique(),
        );

        let signature = sign_and_submit(&wallet, &gateway, tx, Some(&mint))
            .await
            .unwrap();
        assert!(!signature.is_empty());
    }

    // KeypairProvider's sign path shares partial_sign; sanity-check it signs
    // in place without touching the network.
    #[tokio::test]
    async fn test_keypair_provider_sign_only_path() {
        let keypair = Keypair::new();
        let pubkey = keypair.pubkey();
        let provider = KeypairProvider::new(keypair);

        let mut tx = build_funding_transaction(
            &pubkey,
            &Pubkey::new_unique(),
            0.3,
            None,
            Hash::new_unique(),
        );
        provider.sign_transaction(&mut tx).await.unwrap();
        assert!(tx.is_signed());
    }
}
