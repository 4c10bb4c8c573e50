use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::{TokenGenerator, hash_password, verify_password};
use crate::server::AppState;
use crate::server::dto::{AuthResponse, LoginRequest, RegisterRequest, UserSummary};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};
use crate::server::validation::validate_registration;
use crate::types::{ApiToken, User};

fn issue_token(state: &AppState, user: &User) -> Result<String, ApiError> {
    let generator = TokenGenerator::new();
    let issued = generator
        .generate()
        .map_err(|_| ApiError::internal("Failed to issue token"))?;

    let token = ApiToken {
        id: Uuid::new_v4().to_string(),
        token_hash: issued.hash,
        token_lookup: issued.lookup,
        user_id: user.id.clone(),
        created_at: Utc::now(),
        expires_at: None,
        last_used_at: None,
    };
    state
        .store
        .create_token(&token)
        .api_err("Failed to issue token")?;

    Ok(issued.raw)
}

fn auth_response(token: String, user: &User) -> AuthResponse {
    AuthResponse {
        token,
        user: UserSummary {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        },
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    validate_registration(&req.name, &req.email, &req.password)?;

    if store
        .get_user_by_email(&req.email)
        .api_err("Failed to check email")?
        .is_some()
    {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let password_hash =
        hash_password(&req.password).map_err(|_| ApiError::internal("Failed to hash password"))?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        email: req.email,
        password_hash,
        created_at: now,
        updated_at: now,
    };

    store.create_user(&user).api_err("Failed to create user")?;

    let raw_token = issue_token(&state, &user)?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(auth_response(raw_token, &user))),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let user = store
        .get_user_by_email(&req.email)
        .api_err("Failed to look up user")?
        .ok_or_else(|| ApiError::bad_request("User not found"))?;

    let matches = verify_password(&req.password, &user.password_hash)
        .map_err(|_| ApiError::internal("Failed to verify password"))?;
    if !matches {
        return Err(ApiError::bad_request("Invalid password"));
    }

    let raw_token = issue_token(&state, &user)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(auth_response(raw_token, &user))))
}
