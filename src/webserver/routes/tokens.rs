/// Token API routes
///
/// POST /api/tokens persists a launched token; GET lists by wallet or the
/// most recent 100 overall.
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    db::NewToken,
    launch::Platform,
    logger::{self, LogTag},
    webserver::{state::AppState, utils::failure_response},
};

const MAX_LISTED_TOKENS: usize = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tokens", post(create_token))
        .route("/tokens", get(list_tokens))
}

/// Persist a launched (or externally created) token
async fn create_token(
    State(state): State<Arc<AppState>>,
    Json(token): Json<NewToken>,
) -> Response {
    // Platform strings come from the wire here; unknown values collapse to
    // meteora rather than creating rows with arbitrary platform labels.
    let platform = token
        .platform
        .as_deref()
        .and_then(Platform::parse)
        .unwrap_or(Platform::Meteora);

    match state.db.insert_token(&token, platform.as_str()) {
        Ok(record) => {
            logger::info(
                LogTag::Api,
                &format!("Token saved: {} ({})", record.mint_address, record.platform),
            );
            Json(serde_json::json!({ "success": true, "token": record })).into_response()
        }
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error saving token: {}", e));
            failure_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    wallet: Option<String>,
}

/// List tokens by owner wallet, or the newest tokens overall
async fn list_tokens(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Response {
    let result = match query.wallet.as_deref() {
        Some(wallet) => state.db.tokens_by_wallet(wallet),
        None => state.db.recent_tokens(MAX_LISTED_TOKENS),
    };

    match result {
        Ok(tokens) => {
            Json(serde_json::json!({ "success": true, "tokens": tokens })).into_response()
        }
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error fetching tokens: {}", e));
            failure_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
