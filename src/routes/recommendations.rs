use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{MovieRecord, UserId},
    routes::AppState,
    services::{
        recommendations::{find_similar, CandidateRanking},
        scoring::ScoredMovie,
    },
};

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub candidates: Vec<MovieRecord>,
}

/// Handler ranking candidates by fit to the user's liked movies
pub async fn score_candidates(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<UserId>,
    Json(request): Json<ScoreRequest>,
) -> AppResult<Json<CandidateRanking>> {
    if user_id <= 0 {
        return Err(AppError::InvalidInput(format!("invalid user id {}", user_id)));
    }

    tracing::info!(
        request_id = %request_id,
        user_id,
        candidates = request.candidates.len(),
        "Scoring candidates"
    );

    let ranking = state
        .recommendations
        .score_candidates(user_id, request.candidates)
        .await?;
    Ok(Json(ranking))
}

#[derive(Debug, Deserialize)]
pub struct SimilarRequest {
    pub target: MovieRecord,
    pub candidates: Vec<MovieRecord>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Handler ranking candidates by likeness to one target movie
pub async fn similar_movies(Json(request): Json<SimilarRequest>) -> AppResult<Json<Vec<ScoredMovie>>> {
    if request.limit == Some(0) {
        return Err(AppError::InvalidInput("limit must be positive".to_string()));
    }

    let ranked = find_similar(&request.target, &request.candidates, request.limit);
    Ok(Json(ranked))
}
