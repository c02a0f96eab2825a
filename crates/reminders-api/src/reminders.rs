use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use reminders_types::api::{Claims, ReminderForm};

use crate::auth::AppState;
use crate::error::{ApiError, blocking};

/// GET /reminders: the caller's reminders, earliest due first.
pub async fn list_reminders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let owner = claims.identity().to_string();
    let reminders = blocking(move || store.list_by_owner(&owner)).await?;
    Ok(Json(reminders))
}

/// POST /reminders: create a Pending reminder owned by the caller.
pub async fn create_reminder(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(form): Json<ReminderForm>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let owner = claims.identity().to_string();
    let reminder = blocking(move || store.create(&owner, &form)).await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

/// GET /reminders/{id}: 404 unless the caller created it.
pub async fn get_reminder(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let owner = claims.identity().to_string();
    let reminder = blocking(move || store.get(&owner, id))
        .await?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Reminder not found"))?;
    Ok(Json(reminder))
}

/// DELETE /reminders/{id}: always 204; unknown or foreign ids are left alone.
pub async fn delete_reminder(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.store.clone();
    let owner = claims.identity().to_string();
    blocking(move || store.delete(&owner, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
