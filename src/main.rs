use std::sync::Arc;

use aifi::{
    apis::{llm, revshare::RevShareClient, solscan::SolscanClient},
    db,
    global::{self, has_cli_flag},
    launch::{
        funding::RpcGateway, meteora::MeteoraAdapter, pumpfun::PumpFunAdapter,
        raydium::RaydiumAdapter, LaunchAdapter, LaunchOrchestrator,
    },
    logger::{self, LogTag},
    paths, rpc,
    wallet::{KeypairProvider, WalletProvider, WalletSession},
    webserver::{self, AppState},
};

const DEFAULT_CONFIG_PATH: &str = "configs.json";

fn print_help() {
    println!("aifi - token launch and agent platform backend");
    println!();
    println!("USAGE: aifi [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  --config <path>     Config file (default: configs.json)");
    println!("  --debug-<module>    Enable debug logs for a module");
    println!("                      (system, rpc, wallet, launch, database, webserver, api, llm)");
    println!("  --debug-all         Enable debug logs everywhere");
    println!("  --verbose           Enable verbose logs");
    println!("  --quiet             Suppress info and warning logs");
    println!("  --help              Show this help");
}

fn config_path() -> String {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .cloned()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

#[tokio::main]
async fn main() {
    // Directories must exist before the logger opens its file
    if let Err(e) = paths::ensure_all_directories() {
        eprintln!("❌ Failed to create required directories: {}", e);
        std::process::exit(1);
    }

    logger::init();

    if has_cli_flag("--help") || has_cli_flag("-h") {
        print_help();
        std::process::exit(0);
    }

    logger::info(LogTag::System, "🚀 AiFi backend starting up...");

    if let Err(e) = global::init_configs(config_path()) {
        logger::error(LogTag::Config, &format!("❌ {}", e));
        std::process::exit(1);
    }
    let configs = match global::read_configs() {
        Ok(configs) => configs,
        Err(e) => {
            logger::error(LogTag::Config, &format!("❌ {}", e));
            std::process::exit(1);
        }
    };

    if let Err(e) = db::init_database() {
        logger::error(LogTag::Database, &format!("❌ Database init failed: {}", e));
        std::process::exit(1);
    }

    if let Err(e) = rpc::init_rpc_client() {
        logger::error(LogTag::Rpc, &format!("❌ RPC init failed: {}", e));
        std::process::exit(1);
    }
    logger::info(
        LogTag::Rpc,
        &format!("RPC endpoint: {}", rpc::get_rpc_client().url()),
    );

    llm::init_llm_registry(&configs);

    // Wallet session: the configured keypair is the signing provider
    let keypair = match global::load_wallet_from_config(&configs) {
        Ok(keypair) => keypair,
        Err(e) => {
            logger::error(LogTag::Wallet, &format!("❌ Wallet load failed: {}", e));
            std::process::exit(1);
        }
    };
    let providers: Vec<Arc<dyn WalletProvider>> = vec![Arc::new(KeypairProvider::new(keypair))];
    let wallet = Arc::new(WalletSession::new(providers));

    match wallet.connect("keypair").await {
        Ok(Some(address)) => {
            logger::info(LogTag::Wallet, &format!("Session wallet: {}", address));
        }
        Ok(None) => {}
        Err(e) => {
            logger::error(LogTag::Wallet, &format!("❌ Wallet connect failed: {}", e));
            std::process::exit(1);
        }
    }

    // Launch stack: one adapter per platform over the shared RPC gateway
    let adapters: Vec<Arc<dyn LaunchAdapter>> = vec![
        Arc::new(MeteoraAdapter::new(configs.revshare_base_url.clone())),
        Arc::new(PumpFunAdapter::new(
            configs.pumpfun_api_url.clone(),
            configs.pumpfun_ipfs_url.clone(),
        )),
        Arc::new(RaydiumAdapter::new(configs.raydium_api_url.clone())),
    ];
    let orchestrator = Arc::new(LaunchOrchestrator::new(
        adapters,
        Arc::new(RpcGateway),
        db::get_database().clone(),
        configs.explorer_base_url.clone(),
    ));

    let state = Arc::new(AppState::new(
        db::get_database().clone(),
        wallet,
        orchestrator,
        RevShareClient::new(
            configs.revshare_base_url.clone(),
            configs.revshare_token_address.clone(),
        ),
        SolscanClient::new(configs.solscan_api_url.clone()),
        configs.pumpfun_ipfs_url.clone(),
    ));

    // Ctrl-C triggers graceful shutdown
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            logger::info(LogTag::System, "Shutdown requested");
            webserver::shutdown();
        }
    });

    match webserver::start_server(state).await {
        Ok(()) => {
            logger::info(LogTag::System, "✅ AiFi stopped cleanly");
        }
        Err(e) => {
            logger::error(LogTag::System, &format!("❌ AiFi failed: {}", e));
            logger::flush();
            std::process::exit(1);
        }
    }

    logger::flush();
}
