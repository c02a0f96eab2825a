use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use reminders_db::StoreError;

/// Handler error: a status code plus the message sent back as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            StoreError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Reminder not found"),
            StoreError::AlreadyExists(_) => Self::new(StatusCode::CONFLICT, "Already exists"),
            StoreError::Storage(ref inner) => {
                error!("Storage error: {:?}", inner);
                Self::internal()
            }
            StoreError::Corrupt { id, ref reason } => {
                error!("Corrupt row {}: {}", id, reason);
                Self::internal()
            }
            StoreError::LockPoisoned => {
                error!("DB lock poisoned");
                Self::internal()
            }
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        error!("spawn_blocking join error: {}", e);
        Self::internal()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Runs a blocking store call off the async runtime.
pub async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}
