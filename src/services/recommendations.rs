use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    db::Store,
    error::AppResult,
    models::{MovieId, MovieRecord, RatingValue, UserId},
    services::{
        catalog::{lookup_movies, MovieCatalog},
        features::{FeatureSpace, MovieFeatureVector},
        scoring::{ScoredMovie, ScoringStrategy, UserTasteProfile},
    },
};

/// Results returned by the similar-movies search when no limit is given
pub const DEFAULT_SIMILAR_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct CandidateRanking {
    pub profile: UserTasteProfile,
    pub results: Vec<ScoredMovie>,
}

/// Ranks candidate movies for a user, or against one target movie
#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<dyn Store>,
    catalog: Arc<dyn MovieCatalog>,
    space: Arc<FeatureSpace>,
    lookup_timeout: Duration,
}

impl RecommendationService {
    pub fn new(
        store: Arc<dyn Store>,
        catalog: Arc<dyn MovieCatalog>,
        space: FeatureSpace,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            store,
            catalog,
            space: Arc::new(space),
            lookup_timeout,
        }
    }

    /// User-fit ranking. Movies the user already rated are dropped; the profile
    /// comes from the movies they liked.
    pub async fn score_candidates(
        &self,
        user_id: UserId,
        candidates: Vec<MovieRecord>,
    ) -> AppResult<CandidateRanking> {
        let ratings = self.store.ratings_for_user(user_id).await?;
        let rated: HashSet<MovieId> = ratings.iter().map(|r| r.tmdb_movie_id).collect();
        let liked: Vec<MovieId> = ratings
            .iter()
            .filter(|r| r.rating == RatingValue::Like)
            .map(|r| r.tmdb_movie_id)
            .collect();

        let history = self.liked_features(&liked).await;
        let profile = UserTasteProfile::from_history(&self.space, &history);

        let unrated: Vec<MovieRecord> = candidates
            .into_iter()
            .filter(|movie| !rated.contains(&movie.id))
            .collect();

        let results = ScoringStrategy::UserFit {
            space: self.space.as_ref(),
            profile: &profile,
        }
        .rank(&unrated);

        tracing::info!(
            user_id,
            liked = liked.len(),
            resolved = history.len(),
            candidates = results.len(),
            "Candidates scored"
        );

        Ok(CandidateRanking { profile, results })
    }

    /// Feature vectors of the liked movies the catalog could resolve
    async fn liked_features(&self, movie_ids: &[MovieId]) -> Vec<MovieFeatureVector> {
        lookup_movies(Arc::clone(&self.catalog), movie_ids, self.lookup_timeout)
            .await
            .iter()
            .map(|movie| self.space.vectorize(movie))
            .collect()
    }
}

/// Item-similarity ranking against `target`, excluding the target itself
pub fn find_similar(
    target: &MovieRecord,
    candidates: &[MovieRecord],
    limit: Option<usize>,
) -> Vec<ScoredMovie> {
    let others: Vec<MovieRecord> = candidates
        .iter()
        .filter(|movie| movie.id != target.id)
        .cloned()
        .collect();

    let mut ranked = ScoringStrategy::ItemSimilarity { target }.rank(&others);
    ranked.truncate(limit.unwrap_or(DEFAULT_SIMILAR_LIMIT));
    ranked
}
