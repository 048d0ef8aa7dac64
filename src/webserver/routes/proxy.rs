/// Passthrough proxies: solscan token metadata (CORS) and the PumpFun
/// IPFS upload endpoint.
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    logger::{self, LogTag},
    webserver::{state::AppState, utils::error_response},
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/proxy/solscan", get(solscan_proxy))
        .route("/pumpfun-ipfs", post(pumpfun_ipfs))
}

#[derive(Debug, Deserialize)]
struct SolscanQuery {
    address: Option<String>,
}

async fn solscan_proxy(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SolscanQuery>,
) -> Response {
    let address = match query.address.as_deref() {
        Some(address) if !address.is_empty() => address,
        _ => return error_response(StatusCode::BAD_REQUEST, "Address parameter is required"),
    };

    match state.solscan.token_meta(address).await {
        Ok((status, body)) if (200..300).contains(&status) => Json(body).into_response(),
        Ok((status, _)) => {
            logger::warning(LogTag::Api, &format!("Solscan proxy error: {}", status));
            error_response(
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                "Failed to fetch from Solscan",
            )
        }
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error in Solscan proxy: {}", e));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// Forward a multipart upload to the PumpFun IPFS endpoint unchanged
async fn pumpfun_ipfs(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut form = reqwest::multipart::Form::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(|s| s.to_string());

        match field.bytes().await {
            Ok(bytes) => {
                let mut part = reqwest::multipart::Part::bytes(bytes.to_vec());
                if let Some(file_name) = file_name {
                    part = part.file_name(file_name);
                }
                form = form.part(name, part);
            }
            Err(e) => {
                logger::warning(LogTag::Api, &format!("Skipping unreadable field: {}", e));
            }
        }
    }

    let response = match state
        .http
        .post(&state.pumpfun_ipfs_url)
        .multipart(form)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error in pumpfun-ipfs route: {}", e));
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        logger::error(LogTag::Api, &format!("PumpFun IPFS upload failed: {}", text));
        return error_response(
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
            "Failed to upload to IPFS",
        );
    }

    match response.json::<serde_json::Value>().await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            logger::error(LogTag::Api, &format!("Invalid IPFS response: {}", e));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
