use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{MovieId, UserId},
    routes::AppState,
    services::voting_session::{RatingInput, RecordRatingResponse},
};

/// Handler for a single swipe, optionally counted towards a friend's session
pub async fn record_rating(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(input): Json<RatingInput>,
) -> AppResult<Json<RecordRatingResponse>> {
    tracing::info!(
        request_id = %request_id,
        user_id = input.user_id,
        movie_id = input.movie_id,
        friend_id = ?input.friend_id,
        "Recording rating"
    );

    let response = state.sessions.record_rating(input).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct WatchedRequest {
    pub movie_id: MovieId,
}

#[derive(Debug, Serialize)]
pub struct WatchedResponse {
    /// False when the movie was already in the history
    pub added: bool,
}

/// Handler for adding a movie to the watched history
pub async fn add_watched(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
    Json(request): Json<WatchedRequest>,
) -> AppResult<Json<WatchedResponse>> {
    if user_id <= 0 || request.movie_id <= 0 {
        return Err(AppError::InvalidInput(format!(
            "invalid user {} or movie {}",
            user_id, request.movie_id
        )));
    }

    let added = state.store.add_watched(user_id, request.movie_id).await?;
    if added {
        state.taste.invalidate(user_id).await?;
    }

    Ok(Json(WatchedResponse { added }))
}
