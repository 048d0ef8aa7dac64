/// AI agent configuration routes
///
/// Creation is multipart (the studio form uploads knowledge-base files
/// alongside the fields); files land under data/uploads and are served
/// back from /uploads.
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    db::{CreateAgentOutcome, KnowledgeFile, NewAgent},
    logger::{self, LogTag},
    webserver::{state::AppState, utils::error_response},
};

const PUBLIC_LIST_LIMIT: usize = 50;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ai-configurations", post(create_agent))
        .route("/ai-configurations", get(agents_by_wallet_query))
        .route("/ai-configurations/latest", get(latest_agent))
        .route("/ai-configurations/list", get(list_public_agents))
        .route("/ai-configurations/by-name/:slug", get(agent_by_name))
        .route("/ai-configurations/user/:wallet", get(agents_by_wallet_path))
        .route("/ai-configurations/:id", get(agent_by_id))
}

/// Store an uploaded knowledge-base file and return its descriptor
async fn store_knowledge_file(
    wallet: &str,
    file_name: &str,
    bytes: &[u8],
) -> Result<KnowledgeFile, String> {
    let dir = format!("data/uploads/{}", wallet);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| format!("Failed to create upload dir: {}", e))?;

    let stored_name = format!("{}-{}", chrono::Utc::now().timestamp_millis(), file_name);
    let path = format!("{}/{}", dir, stored_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| format!("Failed to write upload: {}", e))?;

    Ok(KnowledgeFile {
        name: file_name.to_string(),
        url: format!("/uploads/{}/{}", wallet, stored_name),
        size: bytes.len() as u64,
    })
}

async fn create_agent(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut agent = NewAgent::default();
    let mut uploads: Vec<(String, Vec<u8>)> = vec![];

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();

        if name == "knowledgeBase" {
            let file_name = field.file_name().unwrap_or("file").to_string();
            if let Ok(bytes) = field.bytes().await {
                if !bytes.is_empty() {
                    uploads.push((file_name, bytes.to_vec()));
                }
            }
            continue;
        }

        let value = match field.text().await {
            Ok(value) => value,
            Err(_) => continue,
        };
        match name.as_str() {
            "walletAddress" => agent.wallet_address = value,
            "name" => agent.name = value,
            "description" => agent.description = value,
            "prompt" => agent.prompt = value,
            "model" => agent.model = value,
            "toolsWebSearch" => agent.tools_web_search = value == "true",
            "toolsCodeExecution" => agent.tools_code_execution = value == "true",
            "toolsImageGeneration" => agent.tools_image_generation = value == "true",
            "toolsDataAnalysis" => agent.tools_data_analysis = value == "true",
            "isPublic" => agent.is_public = value == "true",
            _ => {}
        }
    }

    if agent.wallet_address.is_empty()
        || agent.name.is_empty()
        || agent.prompt.is_empty()
        || agent.model.is_empty()
    {
        return error_response(StatusCode::BAD_REQUEST, "Missing required fields");
    }

    // One failed upload does not abort the rest
    for (file_name, bytes) in &uploads {
        match store_knowledge_file(&agent.wallet_address, file_name, bytes).await {
            Ok(descriptor) => agent.knowledge_base_files.push(descriptor),
            Err(e) => logger::error(LogTag::Api, &format!("Error uploading file: {}", e)),
        }
    }

    match state.db.create_agent(&agent) {
        Ok(CreateAgentOutcome::Created(record)) => {
            logger::info(LogTag::Api, &format!("Agent created: {}", record.name));
            let files_uploaded = record
                .knowledge_base_files
                .as_array()
                .map(|a| a.len())
                .unwrap_or(0);
            Json(serde_json::json!({
                "success": true,
                "configuration": record,
                "filesUploaded": files_uploaded,
            }))
            .into_response()
        }
        Ok(CreateAgentOutcome::NameTaken) => error_response(
            StatusCode::CONFLICT,
            "An AI agent with this name already exists. Please choose a different name.",
        ),
        Ok(CreateAgentOutcome::UserNotFound) => {
            error_response(StatusCode::NOT_FOUND, "User not found")
        }
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error saving AI configuration: {}", e));
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save AI configuration",
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct WalletQuery {
    #[serde(rename = "walletAddress")]
    wallet_address: Option<String>,
}

async fn agents_by_wallet_query(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WalletQuery>,
) -> Response {
    let wallet = match query.wallet_address.as_deref() {
        Some(wallet) if !wallet.is_empty() => wallet,
        _ => return error_response(StatusCode::BAD_REQUEST, "Wallet address is required"),
    };
    agents_by_wallet(&state, wallet)
}

async fn agents_by_wallet_path(
    State(state): State<Arc<AppState>>,
    Path(wallet): Path<String>,
) -> Response {
    agents_by_wallet(&state, &wallet)
}

fn agents_by_wallet(state: &AppState, wallet: &str) -> Response {
    match state.db.agents_by_wallet(wallet) {
        Ok(configurations) => {
            Json(serde_json::json!({ "configurations": configurations })).into_response()
        }
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error fetching AI configurations: {}", e));
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch AI configurations",
            )
        }
    }
}

async fn agent_by_id(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    match state.db.agent_by_id(id) {
        Ok(Some(configuration)) => {
            Json(serde_json::json!({ "configuration": configuration })).into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "AI configuration not found"),
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error fetching AI configuration: {}", e));
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch AI configuration",
            )
        }
    }
}

async fn agent_by_name(State(state): State<Arc<AppState>>, Path(slug): Path<String>) -> Response {
    match state.db.agent_by_name(&slug) {
        Ok(Some(configuration)) => {
            Json(serde_json::json!({ "configuration": configuration })).into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "AI configuration not found"),
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error fetching AI configuration: {}", e));
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch AI configuration",
            )
        }
    }
}

async fn latest_agent(State(state): State<Arc<AppState>>) -> Response {
    match state.db.latest_public_agent() {
        Ok(Some(configuration)) => {
            Json(serde_json::json!({ "configuration": configuration })).into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "No public AI configurations yet"),
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error fetching latest agent: {}", e));
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch AI configuration",
            )
        }
    }
}

async fn list_public_agents(State(state): State<Arc<AppState>>) -> Response {
    match state.db.public_agents(PUBLIC_LIST_LIMIT) {
        Ok(configurations) => {
            Json(serde_json::json!({ "configurations": configurations })).into_response()
        }
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error listing public agents: {}", e));
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch AI configurations",
            )
        }
    }
}
