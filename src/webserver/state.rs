/// Shared application state for the webserver
///
/// Holds the handles route handlers need: the database, the wallet
/// session, the launch orchestrator and the external API clients.
use crate::apis::revshare::RevShareClient;
use crate::apis::solscan::SolscanClient;
use crate::db::Database;
use crate::launch::LaunchOrchestrator;
use crate::wallet::WalletSession;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub wallet: Arc<WalletSession>,
    pub orchestrator: Arc<LaunchOrchestrator>,
    pub revshare: Arc<RevShareClient>,
    pub solscan: Arc<SolscanClient>,
    /// Plain client for passthrough uploads
    pub http: reqwest::Client,
    pub pumpfun_ipfs_url: String,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(
        db: Database,
        wallet: Arc<WalletSession>,
        orchestrator: Arc<LaunchOrchestrator>,
        revshare: RevShareClient,
        solscan: SolscanClient,
        pumpfun_ipfs_url: String,
    ) -> Self {
        Self {
            db,
            wallet,
            orchestrator,
            revshare: Arc::new(revshare),
            solscan: Arc::new(solscan),
            http: reqwest::Client::new(),
            pumpfun_ipfs_url,
            startup_time: chrono::Utc::now(),
        }
    }

    /// Server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (chrono::Utc::now() - self.startup_time).num_seconds().max(0) as u64
    }
}
