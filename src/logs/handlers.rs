use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

use super::dto::{CreateLogEntryRequest, StreakQuery, StreakResponse};
use super::repo::LogEntry;
use super::service;

#[instrument(skip(state, body))]
pub async fn create_log_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateLogEntryRequest>,
) -> Result<(StatusCode, Json<LogEntry>), AppError> {
    let entry = service::create_entry(
        state.foods.as_ref(),
        state.catalog.as_ref(),
        state.logs.as_ref(),
        user_id,
        body,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn delete_log_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let removed = state.logs.soft_delete(user_id, id).await?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("no log entry {id}")))
    }
}

#[instrument(skip(state))]
pub async fn get_streak(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<StreakQuery>,
) -> Result<Json<StreakResponse>, AppError> {
    let result = service::streak_for_user(
        state.logs.as_ref(),
        user_id,
        params.tz_offset_minutes,
        OffsetDateTime::now_utc(),
    )
    .await?;
    Ok(Json(StreakResponse {
        streak: result.streak,
        most_recent_date: result.most_recent_date,
    }))
}
