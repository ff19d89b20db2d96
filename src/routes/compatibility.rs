use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{normalize_languages, CuratedMovie, CuratedMovieList, UserId, UserPair},
    routes::AppState,
    services::compatibility::CompatibilityOutcome,
};

#[derive(Debug, Deserialize)]
pub struct CuratedListRequest {
    pub movies: Vec<CuratedMovie>,
    #[serde(default)]
    pub preferred_languages: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CuratedListResponse {
    pub user_id: UserId,
    pub movies: Vec<CuratedMovie>,
    pub preferred_languages: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl CuratedListResponse {
    fn new(list: CuratedMovieList, preferred_languages: Vec<String>) -> Self {
        Self {
            user_id: list.user_id,
            movies: list.movies,
            preferred_languages,
            updated_at: list.updated_at,
        }
    }
}

/// Handler replacing a user's curated list and declared languages
pub async fn save_curated_list(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<UserId>,
    Json(request): Json<CuratedListRequest>,
) -> AppResult<Json<CuratedListResponse>> {
    if user_id <= 0 {
        return Err(AppError::InvalidInput(format!("invalid user id {}", user_id)));
    }

    let list = CuratedMovieList::new(user_id, request.movies)?;
    let languages = normalize_languages(request.preferred_languages);

    state.store.save_curated_list(&list).await?;
    state
        .store
        .save_preferred_languages(user_id, &languages)
        .await?;

    tracing::info!(
        request_id = %request_id,
        user_id,
        movies = list.movies.len(),
        languages = languages.len(),
        "Curated list saved"
    );

    Ok(Json(CuratedListResponse::new(list, languages)))
}

/// Handler returning a user's curated list
pub async fn get_curated_list(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<CuratedListResponse>> {
    let list = state
        .store
        .curated_list(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no curated list for user {}", user_id)))?;
    let languages = state.store.preferred_languages(user_id).await?;

    Ok(Json(CuratedListResponse::new(list, languages)))
}

/// Handler for curated-list compatibility between two users
pub async fn compatibility(
    State(state): State<Arc<AppState>>,
    Path((user_id, friend_id)): Path<(UserId, UserId)>,
) -> AppResult<Json<CompatibilityOutcome>> {
    UserPair::new(user_id, friend_id)?;

    let outcome = state
        .compatibility
        .calculate_compatibility(user_id, friend_id)
        .await?;
    Ok(Json(outcome))
}
