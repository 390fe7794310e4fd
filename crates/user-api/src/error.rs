//! Error type and HTTP error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;
use user_store::{UserStoreError, ValidationError};

use crate::api::ErrorBody;

/// Everything a handler can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A payload field broke a validation rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The body could not be decoded as a user payload.
    #[error("{0}")]
    Payload(#[from] JsonRejection),
    /// The email in a PUT body differs from the one in the path.
    #[error("email: body email {body:?} does not match path email {path:?}")]
    EmailMismatch {
        /// Email taken from the URL.
        path: String,
        /// Email taken from the body.
        body: String,
    },
    /// The record adapter failed.
    #[error(transparent)]
    Store(#[from] UserStoreError),
}

impl ApiError {
    /// Status code this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::EmailMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Payload(rejection) => rejection.status(),
            Self::Store(e) => match e {
                UserStoreError::AlreadyExists { .. } => StatusCode::BAD_REQUEST,
                UserStoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                UserStoreError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                UserStoreError::CorruptRecord { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::Validation(_) | Self::EmailMismatch { .. } => self.to_string(),
            Self::Payload(rejection) => rejection.body_text(),
            Self::Store(e) => match e {
                UserStoreError::AlreadyExists { .. } => "User already exists".to_string(),
                UserStoreError::NotFound { .. } => "User not found".to_string(),
                UserStoreError::StoreUnavailable(_) => "Store unavailable".to_string(),
                UserStoreError::CorruptRecord { .. } => "Stored record is corrupt".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            detail: self.detail(),
        };
        (status, Json(body)).into_response()
    }
}
