/// Launch API routes
///
/// POST /api/launch drives the orchestrator end to end with the session
/// wallet; the status and attempts endpoints expose the state machine and
/// the reconciliation ledger.
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
    launch::{Platform, TokenParams},
    logger::{self, LogTag},
    webserver::{state::AppState, utils::failure_response},
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/launch", post(launch_token))
        .route("/launch/status", get(launch_status))
        .route("/launch/attempts", get(launch_attempts))
}

#[derive(Debug, Deserialize)]
struct LaunchBody {
    platform: Option<String>,
    #[serde(flatten)]
    params: TokenParams,
    /// Initial buy for meteora/pumpfun, liquidity amount for raydium
    amount: Option<f64>,
}

async fn launch_token(State(state): State<Arc<AppState>>, Json(body): Json<LaunchBody>) -> Response {
    let platform = match body.platform.as_deref().and_then(Platform::parse) {
        Some(platform) => platform,
        None => {
            return failure_response(
                StatusCode::BAD_REQUEST,
                "platform must be one of meteora, pumpfun, raydium",
            )
        }
    };

    let (provider, address) = match (
        state.wallet.active_provider().await,
        state.wallet.address().await,
    ) {
        (Some(provider), Some(address)) => (provider, address),
        _ => {
            return failure_response(StatusCode::BAD_REQUEST, "Please connect your wallet first")
        }
    };

    let mut params = body.params;
    if params.developer_wallet.is_empty() {
        params.developer_wallet = address.clone();
    }

    let user_amount = body.amount.unwrap_or(crate::launch::MIN_USER_AMOUNT_SOL);

    match state
        .orchestrator
        .launch(provider, address, platform, params, user_amount)
        .await
    {
        Ok(outcome) => Json(serde_json::json!({
            "success": true,
            "mint": outcome.mint,
            "signature": outcome.signature,
            "explorerUrl": outcome.explorer_url,
            "attemptId": outcome.attempt_id,
            "recorded": outcome.recorded,
        }))
        .into_response(),
        Err(e) if e.is_user_rejection() => {
            // Cancellation, not failure: no error message for the UI
            Json(serde_json::json!({ "success": false, "cancelled": true })).into_response()
        }
        Err(e) => {
            logger::error(LogTag::Launch, &format!("Launch request failed: {}", e));
            failure_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn launch_status(State(state): State<Arc<AppState>>) -> Response {
    Json(serde_json::json!({ "status": state.orchestrator.phase() })).into_response()
}

async fn launch_attempts(State(state): State<Arc<AppState>>) -> Response {
    let attempts = match state.db.list_attempts(100) {
        Ok(attempts) => attempts,
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error listing attempts: {}", e));
            return failure_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };
    let stuck = match state.db.stuck_attempts() {
        Ok(stuck) => stuck,
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error listing stuck attempts: {}", e));
            return failure_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    Json(serde_json::json!({
        "success": true,
        "attempts": attempts,
        "stuck": stuck,
    }))
    .into_response()
}
