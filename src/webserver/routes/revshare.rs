/// RevShare statistics routes: overview, rewards and distributions.
///
/// All responses carry no-store headers; the upstream data changes with
/// every distribution event and must never be cached.
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::{
    logger::{self, LogTag},
    rpc,
    webserver::{state::AppState, utils::no_store_headers},
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/overview", get(overview))
        .route("/rewards", get(rewards))
        .route("/distributions", get(distributions))
}

async fn overview(State(state): State<Arc<AppState>>) -> Response {
    let data = state.revshare.overview(rpc::get_rpc_client()).await;
    (
        no_store_headers(),
        Json(serde_json::json!({ "success": true, "data": data })),
    )
        .into_response()
}

async fn rewards(State(state): State<Arc<AppState>>) -> Response {
    match state.revshare.rewards().await {
        Ok(data) => (
            no_store_headers(),
            Json(serde_json::json!({ "success": true, "data": data })),
        )
            .into_response(),
        Err(e) => {
            logger::warning(LogTag::Api, &format!("Rewards fetch failed: {}", e));
            (
                no_store_headers(),
                Json(serde_json::json!({
                    "success": false,
                    "error": "No distribution data available yet",
                })),
            )
                .into_response()
        }
    }
}

async fn distributions(State(state): State<Arc<AppState>>) -> Response {
    match state.revshare.distributions().await {
        Ok(data) => (
            no_store_headers(),
            Json(serde_json::json!({ "success": true, "data": data })),
        )
            .into_response(),
        Err(e) => {
            logger::warning(LogTag::Api, &format!("Distributions fetch failed: {}", e));
            (
                StatusCode::NOT_FOUND,
                no_store_headers(),
                Json(serde_json::json!({
                    "success": false,
                    "error": "No distributions data available",
                    "message": "Awaiting first distribution event",
                })),
            )
                .into_response()
        }
    }
}
