use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use user_store::validation::{normalize_email, validate_user};
use user_store::{FieldMap, HashStore, User};

use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

// ── API types ───────────────────────────────────────────────────────

/// `{"message": ...}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Every stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<FieldMap>,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn index() -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome to the Redis API"))
}

pub async fn health<S: HashStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResult<HealthResponse> {
    state.users.ping()?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
    }))
}

pub async fn create_user<S: HashStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<User>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(user) = payload?;
    let user = validate_user(&user)?;
    state.users.create_user(&user)?;
    Ok(Json(MessageResponse::new("User created successfully")))
}

pub async fn get_user<S: HashStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(email): Path<String>,
) -> ApiResult<FieldMap> {
    let record = state.users.read(&normalize_email(&email))?;
    Ok(Json(record))
}

pub async fn update_user<S: HashStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(email): Path<String>,
    payload: Result<Json<User>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(user) = payload?;
    let user = validate_user(&user)?;
    let email = normalize_email(&email);
    if user.email != email {
        return Err(ApiError::EmailMismatch {
            path: email,
            body: user.email,
        });
    }
    state.users.update_user(&user)?;
    Ok(Json(MessageResponse::new("User updated successfully")))
}

pub async fn delete_user<S: HashStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(email): Path<String>,
) -> ApiResult<MessageResponse> {
    state.users.delete(&normalize_email(&email))?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

pub async fn list_users<S: HashStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResult<UsersResponse> {
    let users = state.users.list_all()?;
    Ok(Json(UsersResponse { users }))
}
