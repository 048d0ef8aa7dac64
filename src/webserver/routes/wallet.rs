/// Wallet session routes
///
/// Connect/disconnect the session wallet and query its balance. Balance
/// failures fall back to the last known value (stale-but-available).
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    logger::{self, LogTag},
    webserver::{routes::users::generate_random_username, state::AppState, utils::error_response},
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/wallet/balance", get(wallet_balance))
        .route("/wallet/connect", post(wallet_connect))
        .route("/wallet/disconnect", post(wallet_disconnect))
}

async fn wallet_balance(State(state): State<Arc<AppState>>) -> Response {
    let address = match state.wallet.address().await {
        Some(address) => address,
        None => return error_response(StatusCode::BAD_REQUEST, "No wallet connected"),
    };

    match state.wallet.refresh_balance().await {
        Ok(balance) => Json(serde_json::json!({
            "address": address,
            "sol_balance": balance,
            "stale": false,
        }))
        .into_response(),
        Err(e) => {
            // Keep showing the previous balance; the caller sees the error
            // alongside it
            let cached = state.wallet.cached_balance().await;
            Json(serde_json::json!({
                "address": address,
                "sol_balance": cached,
                "stale": true,
                "error": e.to_string(),
            }))
            .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConnectBody {
    provider: Option<String>,
}

/// Connect a provider by name. First-time wallets get a user row with a
/// generated username.
async fn wallet_connect(State(state): State<Arc<AppState>>, Json(body): Json<ConnectBody>) -> Response {
    let provider = match body.provider.as_deref() {
        Some(provider) if !provider.is_empty() => provider,
        _ => return error_response(StatusCode::BAD_REQUEST, "Provider name is required"),
    };

    match state.wallet.connect(provider).await {
        Ok(Some(address)) => {
            // Auto-provision a profile on first connection
            match state.db.user_by_wallet(&address) {
                Ok(None) => {
                    let username = generate_random_username();
                    if let Err(e) = state.db.create_user(&address, &username) {
                        logger::warning(
                            LogTag::Api,
                            &format!("Could not auto-create user for {}: {}", address, e),
                        );
                    }
                }
                Ok(Some(_)) => {}
                Err(e) => {
                    logger::warning(LogTag::Api, &format!("User lookup failed: {}", e));
                }
            }
            Json(serde_json::json!({ "connected": true, "address": address })).into_response()
        }
        // User rejection: silent cancel, no error surfaced
        Ok(None) => Json(serde_json::json!({ "connected": false, "cancelled": true })).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

async fn wallet_disconnect(State(state): State<Arc<AppState>>) -> Response {
    state.wallet.disconnect().await;
    Json(serde_json::json!({ "connected": false })).into_response()
}
