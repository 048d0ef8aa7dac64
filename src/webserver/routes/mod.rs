use crate::webserver::state::AppState;
use axum::response::Json;
use axum::{routing::get, Router};
use std::sync::Arc;

pub mod agents;
pub mod chat;
pub mod launch;
pub mod proxy;
pub mod revshare;
pub mod tokens;
pub mod users;
pub mod wallet;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/api", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(tokens::routes())
        .merge(users::routes())
        .merge(agents::routes())
        .merge(chat::routes())
        .merge(launch::routes())
        .merge(revshare::routes())
        .merge(proxy::routes())
        .merge(wallet::routes())
}

/// Service banner with uptime, useful as a liveness probe
async fn root(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "aifi",
        "uptime_seconds": state.uptime_seconds(),
    }))
}
