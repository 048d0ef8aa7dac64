/// User profile API routes
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use rand::Rng;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    db::{is_valid_username, CreateUserOutcome},
    logger::{self, LogTag},
    webserver::{state::AppState, utils::error_response},
};

const USERNAME_ADJECTIVES: &[&str] = &[
    "Cool", "Smart", "Fast", "Bright", "Swift", "Bold", "Sharp", "Quick", "Wise", "Strong",
];
const USERNAME_NOUNS: &[&str] = &[
    "Trader", "Builder", "Creator", "Genius", "Master", "Expert", "Pro", "Wizard", "Hero", "Legend",
];

/// Username assigned to wallets that connect without an existing profile
pub fn generate_random_username() -> String {
    let mut rng = rand::thread_rng();
    let adjective = USERNAME_ADJECTIVES[rng.gen_range(0..USERNAME_ADJECTIVES.len())];
    let noun = USERNAME_NOUNS[rng.gen_range(0..USERNAME_NOUNS.len())];
    let number: u32 = rng.gen_range(0..1000);
    format!("{}{}{}", adjective, noun, number)
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(get_user))
        .route("/users", post(create_user))
        .route("/users/update", put(update_user))
        .route("/users/check-username", get(check_username))
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    wallet: Option<String>,
}

async fn get_user(State(state): State<Arc<AppState>>, Query(query): Query<UserQuery>) -> Response {
    let wallet = match query.wallet.as_deref() {
        Some(wallet) if !wallet.is_empty() => wallet,
        _ => return error_response(StatusCode::BAD_REQUEST, "Wallet address is required"),
    };

    match state.db.user_by_wallet(wallet) {
        Ok(Some(user)) => Json(serde_json::json!({ "user": user })).into_response(),
        Ok(None) => Json(serde_json::json!({ "user": null })).into_response(),
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error fetching user: {}", e));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch user")
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateUserBody {
    wallet_address: Option<String>,
    username: Option<String>,
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserBody>,
) -> Response {
    let (wallet, username) = match (body.wallet_address.as_deref(), body.username.as_deref()) {
        (Some(wallet), Some(username)) if !wallet.is_empty() && !username.is_empty() => {
            (wallet, username)
        }
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Wallet address and username are required",
            )
        }
    };

    if !is_valid_username(username) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Username can only contain letters, numbers, and underscores",
        );
    }

    match state.db.create_user(wallet, username) {
        Ok(CreateUserOutcome::Created(user)) => {
            logger::info(LogTag::Api, &format!("User created: {}", user.username));
            (StatusCode::CREATED, Json(serde_json::json!({ "user": user }))).into_response()
        }
        Ok(CreateUserOutcome::AlreadyExists(user)) => {
            Json(serde_json::json!({ "user": user })).into_response()
        }
        Ok(CreateUserOutcome::UsernameTaken) => {
            error_response(StatusCode::CONFLICT, "Username already taken")
        }
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error creating user: {}", e));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user")
        }
    }
}

/// Multipart update: username and optional profile picture URL
async fn update_user(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut wallet_address = None;
    let mut username = None;
    let mut profile_picture_url = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        let value = match field.text().await {
            Ok(value) => value,
            Err(_) => continue,
        };
        match name.as_str() {
            "wallet_address" => wallet_address = Some(value),
            "username" => username = Some(value),
            "profile_picture_url" => profile_picture_url = Some(value),
            _ => {}
        }
    }

    let (wallet, username) = match (wallet_address.as_deref(), username.as_deref()) {
        (Some(wallet), Some(username)) if !wallet.is_empty() && !username.is_empty() => {
            (wallet, username)
        }
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Wallet address and username are required",
            )
        }
    };

    if !is_valid_username(username) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Username can only contain letters, numbers, and underscores",
        );
    }

    match state.db.is_username_available(username, Some(wallet)) {
        Ok(false) => return error_response(StatusCode::CONFLICT, "Username already taken"),
        Ok(true) => {}
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error updating user: {}", e));
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update user");
        }
    }

    match state
        .db
        .update_user(wallet, username, profile_picture_url.as_deref())
    {
        Ok(Some(user)) => Json(serde_json::json!({ "user": user })).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error updating user: {}", e));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update user")
        }
    }
}

#[derive(Debug, Deserialize)]
struct CheckUsernameQuery {
    username: Option<String>,
    wallet: Option<String>,
}

async fn check_username(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CheckUsernameQuery>,
) -> Response {
    let username = match query.username.as_deref() {
        Some(username) if !username.is_empty() => username,
        _ => return error_response(StatusCode::BAD_REQUEST, "Username is required"),
    };

    // Malformed names are reported as unavailable, not as request errors
    if !is_valid_username(username) {
        return Json(serde_json::json!({
            "available": false,
            "error": "Invalid username format",
        }))
        .into_response();
    }

    match state
        .db
        .is_username_available(username, query.wallet.as_deref())
    {
        Ok(available) => Json(serde_json::json!({ "available": available })).into_response(),
        Err(e) => {
            logger::error(LogTag::Api, &format!("Error checking username: {}", e));
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to check username")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_usernames_pass_validation() {
        for _ in 0..50 {
            let username = generate_random_username();
            assert!(is_valid_username(&username), "bad username: {}", username);
        }
    }
}
