use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{SessionState, UserId, UserTasteVectorRecord},
    routes::AppState,
    services::match_report::TasteMatchOutcome,
};

/// Handler for a user's (cached) taste vector
pub async fn taste_vector(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<UserTasteVectorRecord>> {
    if user_id <= 0 {
        return Err(AppError::InvalidInput(format!("invalid user id {}", user_id)));
    }

    let record = state.taste.get_or_build(user_id).await?;
    Ok(Json(record))
}

/// Handler for voting session progress, seen from `user_id`
pub async fn session_state(
    State(state): State<Arc<AppState>>,
    Path((user_id, friend_id)): Path<(UserId, UserId)>,
) -> AppResult<Json<SessionState>> {
    let session = state.sessions.get_session_state(user_id, friend_id).await?;
    Ok(Json(session))
}

/// Handler for the standalone taste match
pub async fn taste_match(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path((user_id, friend_id)): Path<(UserId, UserId)>,
) -> AppResult<Json<TasteMatchOutcome>> {
    tracing::info!(
        request_id = %request_id,
        user_id,
        friend_id,
        "Calculating taste match"
    );

    let outcome = state.reports.calculate_taste_match(user_id, friend_id).await?;
    Ok(Json(outcome))
}
