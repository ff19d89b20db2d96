//! Taste match between two users' rating histories.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    db::Store,
    error::AppResult,
    models::{MatchReport, PairSide, UserId, UserPair, UserTasteVectorRecord},
    services::{
        similarity::{cosine_similarity, genre_compatibility, summary, to_percentage},
        taste_vector::TasteVectorService,
    },
};

/// Ratings each user needs before a standalone taste match is computed
pub const MIN_RATED_MOVIES: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TasteComparison {
    pub match_percentage: u32,
    pub similarity_score: f64,
    pub genre_compatibility: BTreeMap<String, u32>,
    pub summary: String,
}

/// Compares two taste vectors
pub fn compare(a: &UserTasteVectorRecord, b: &UserTasteVectorRecord) -> TasteComparison {
    let similarity_score = cosine_similarity(&a.vector, &b.vector);
    let match_percentage = to_percentage(similarity_score);

    TasteComparison {
        match_percentage,
        similarity_score,
        genre_compatibility: genre_compatibility(&a.vector, &b.vector),
        summary: summary(match_percentage).to_string(),
    }
}

/// Standalone taste match result, from the caller's perspective
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TasteMatchOutcome {
    InsufficientData {
        required: u32,
        your_ratings: u32,
        friend_ratings: u32,
    },
    Success {
        #[serde(flatten)]
        comparison: TasteComparison,
        your_ratings: u32,
        friend_ratings: u32,
    },
}

#[derive(Clone)]
pub struct MatchReportService {
    store: Arc<dyn Store>,
    taste: TasteVectorService,
}

impl MatchReportService {
    pub fn new(store: Arc<dyn Store>, taste: TasteVectorService) -> Self {
        Self { store, taste }
    }

    /// Builds fresh vectors for both users and writes the pair's report.
    /// Safe to repeat: the single report row is overwritten with current scores.
    pub async fn generate(&self, pair: UserPair) -> AppResult<MatchReport> {
        let (low, high) = tokio::try_join!(
            self.taste.get_or_build(pair.user(PairSide::Low)),
            self.taste.get_or_build(pair.user(PairSide::High))
        )?;
        let comparison = compare(&low, &high);

        let report = MatchReport {
            pair,
            match_percentage: comparison.match_percentage,
            similarity_score: comparison.similarity_score,
            genre_compatibility: comparison.genre_compatibility,
            summary: comparison.summary,
            low_total_ratings: low.total_rated_movies,
            high_total_ratings: high.total_rated_movies,
            generated_at: Utc::now(),
        };

        let saved = self.store.upsert_report(&report).await?;

        tracing::info!(
            pair = %pair,
            match_percentage = saved.match_percentage,
            "Match report generated"
        );

        Ok(saved)
    }

    pub async fn report(&self, pair: UserPair) -> AppResult<Option<MatchReport>> {
        self.store.report(pair).await
    }

    /// Taste match without any session involvement. Too few ratings on either
    /// side is reported as `InsufficientData`, not as an error.
    pub async fn calculate_taste_match(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> AppResult<TasteMatchOutcome> {
        UserPair::new(user_id, friend_id)?;

        let (your_ratings, friend_ratings) = tokio::try_join!(
            self.store.count_ratings(user_id),
            self.store.count_ratings(friend_id)
        )?;

        if your_ratings < MIN_RATED_MOVIES || friend_ratings < MIN_RATED_MOVIES {
            tracing::debug!(
                user_id,
                friend_id,
                your_ratings,
                friend_ratings,
                "Not enough ratings for a taste match"
            );
            return Ok(TasteMatchOutcome::InsufficientData {
                required: MIN_RATED_MOVIES,
                your_ratings,
                friend_ratings,
            });
        }

        let (yours, theirs) = tokio::try_join!(
            self.taste.get_or_build(user_id),
            self.taste.get_or_build(friend_id)
        )?;

        Ok(TasteMatchOutcome::Success {
            comparison: compare(&yours, &theirs),
            your_ratings,
            friend_ratings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::error::AppError;
    use crate::models::{RatingEvent, RatingValue};
    use crate::services::catalog::{MockMovieCatalog, MovieCatalog};
    use std::time::Duration;

    fn service(store: Arc<MemoryStore>) -> MatchReportService {
        let catalog: Arc<dyn MovieCatalog> = Arc::new(MockMovieCatalog::new());
        let taste = TasteVectorService::new(store.clone(), catalog, Duration::from_millis(50));
        MatchReportService::new(store, taste)
    }

    async fn rate_many(store: &MemoryStore, user_id: UserId, count: i64, genre: &str, value: RatingValue) {
        for movie_id in 1..=count {
            store
                .upsert_rating(RatingEvent::new(
                    user_id,
                    movie_id,
                    value,
                    vec![genre.to_string()],
                    Some(25.0),
                ))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_insufficient_data_is_not_an_error() {
        let store = Arc::new(MemoryStore::new());
        rate_many(&store, 1, 20, "Action", RatingValue::Like).await;
        rate_many(&store, 2, 19, "Action", RatingValue::Like).await;

        let outcome = service(store).calculate_taste_match(1, 2).await.unwrap();

        assert_eq!(
            outcome,
            TasteMatchOutcome::InsufficientData {
                required: 20,
                your_ratings: 20,
                friend_ratings: 19,
            }
        );
    }

    #[tokio::test]
    async fn test_identical_tastes_match_fully() {
        let store = Arc::new(MemoryStore::new());
        rate_many(&store, 1, 20, "Action", RatingValue::Like).await;
        rate_many(&store, 2, 20, "Action", RatingValue::Like).await;

        let outcome = service(store).calculate_taste_match(2, 1).await.unwrap();

        let TasteMatchOutcome::Success { comparison, .. } = outcome else {
            panic!("expected a match");
        };
        assert_eq!(comparison.match_percentage, 100);
        assert_eq!(comparison.genre_compatibility["Action"], 100);
        assert_eq!(comparison.summary, crate::services::similarity::SUMMARY_EXCELLENT);
    }

    #[tokio::test]
    async fn test_same_user_rejected() {
        let store = Arc::new(MemoryStore::new());
        let result = service(store).calculate_taste_match(3, 3).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_generate_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        rate_many(&store, 1, 20, "Action", RatingValue::Like).await;
        rate_many(&store, 2, 20, "Action", RatingValue::Dislike).await;
        let service = service(store.clone());
        let pair = UserPair::new(2, 1).unwrap();

        let first = service.generate(pair).await.unwrap();
        let second = service.generate(pair).await.unwrap();

        assert!(first.same_scores(&second));
        assert_eq!(first.match_percentage, 0);
        assert_eq!(first.low_total_ratings, 20);
        assert_eq!(store.report_count().await, 1);
    }

    #[tokio::test]
    async fn test_generate_reflects_latest_ratings() {
        let store = Arc::new(MemoryStore::new());
        rate_many(&store, 1, 20, "Action", RatingValue::Like).await;
        rate_many(&store, 2, 20, "Action", RatingValue::Dislike).await;
        let service = service(store.clone());
        let pair = UserPair::new(1, 2).unwrap();
        service.generate(pair).await.unwrap();

        rate_many(&store, 2, 20, "Action", RatingValue::Like).await;
        service.taste.invalidate(2).await.unwrap();
        let refreshed = service.generate(pair).await.unwrap();

        assert_eq!(refreshed.match_percentage, 100);
        assert_eq!(store.report(pair).await.unwrap(), Some(refreshed));
    }
}
