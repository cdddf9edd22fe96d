use crate::dtos::CreationsResponse;
use crate::middleware::UserId;
use crate::services::ledger::PUBLISHED_FEED_LIMIT;
use crate::startup::AppState;
use axum::{extract::State, Json};
use service_core::error::AppError;

/// The caller's own creations, newest first.
pub async fn list_user_creations(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<CreationsResponse>, AppError> {
    let creations = state.ledger.list_by_user(&user_id).await?;
    Ok(Json(creations.into()))
}

/// Community feed of published creations.
pub async fn list_published_creations(
    State(state): State<AppState>,
    _user_id: UserId,
) -> Result<Json<CreationsResponse>, AppError> {
    let creations = state.ledger.list_published(PUBLISHED_FEED_LIMIT).await?;
    Ok(Json(creations.into()))
}
