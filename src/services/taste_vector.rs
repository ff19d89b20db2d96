//! Builds a user's genre taste vector from watched history and swipes.
//!
//! Watched movies add a flat 0.5 per genre. Each rating adds
//! `rating × (1 + 1/popularity)` per cached genre, so a swipe on an obscure
//! film counts for more than one on a blockbuster. The summed vector is then
//! max-normalised into [-1, 1].

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    db::Store,
    error::AppResult,
    models::{RatingEvent, RatingValue, TasteVector, UserId, UserTasteVectorRecord},
    services::catalog::{lookup_genres_for_movies, MovieCatalog},
};

/// Contribution of one watched movie to each of its genres
pub const WATCHED_WEIGHT: f64 = 0.5;

/// Popularity below this is treated as this when weighting a rating
pub const MIN_POPULARITY: f64 = 1.0;

/// Weight of one rating on each of its genres
pub fn rating_weight(rating: RatingValue, popularity: Option<f64>) -> f64 {
    match popularity.filter(|p| p.is_finite() && *p > 0.0) {
        Some(popularity) => rating.as_f64() * (1.0 + 1.0 / popularity.max(MIN_POPULARITY)),
        None => rating.as_f64(),
    }
}

/// Flat per-genre signal from watched movies (one genre list per movie)
pub fn watched_vector<'a>(genres_per_movie: impl IntoIterator<Item = &'a [String]>) -> TasteVector {
    let mut vector = TasteVector::new();
    for genres in genres_per_movie {
        for genre in genres {
            *vector.entry(genre.clone()).or_insert(0.0) += WATCHED_WEIGHT;
        }
    }
    vector
}

/// Popularity-weighted per-genre signal from explicit ratings
pub fn ratings_vector(ratings: &[RatingEvent]) -> TasteVector {
    let mut vector = TasteVector::new();
    for rating in ratings {
        let weight = rating_weight(rating.rating, rating.popularity);
        for genre in &rating.genres {
            *vector.entry(genre.clone()).or_insert(0.0) += weight;
        }
    }
    vector
}

/// Element-wise sum over the union of keys
pub fn combine(vectors: impl IntoIterator<Item = TasteVector>) -> TasteVector {
    let mut combined = TasteVector::new();
    for vector in vectors {
        for (genre, weight) in vector {
            *combined.entry(genre).or_insert(0.0) += weight;
        }
    }
    combined
}

/// Divides by the largest magnitude. No signal at all yields an empty vector.
pub fn normalize(vector: TasteVector) -> TasteVector {
    let max = vector.values().fold(0.0_f64, |max, v| max.max(v.abs()));
    if max == 0.0 || !max.is_finite() {
        return TasteVector::new();
    }

    vector
        .into_iter()
        .map(|(genre, weight)| (genre, weight / max))
        .collect()
}

/// Loads, builds and caches taste vectors
#[derive(Clone)]
pub struct TasteVectorService {
    store: Arc<dyn Store>,
    catalog: Arc<dyn MovieCatalog>,
    lookup_timeout: Duration,
}

impl TasteVectorService {
    pub fn new(
        store: Arc<dyn Store>,
        catalog: Arc<dyn MovieCatalog>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            store,
            catalog,
            lookup_timeout,
        }
    }

    /// Cached vector if present, otherwise a freshly built one. The new vector
    /// is cached only if no invalidation happened while it was being built.
    pub async fn get_or_build(&self, user_id: UserId) -> AppResult<UserTasteVectorRecord> {
        if let Some(record) = self.store.taste_vector(user_id).await? {
            tracing::debug!(user_id, "Taste vector cache hit");
            return Ok(record);
        }

        // Read before the build so a rating landing mid-build bumps it
        let generation = self.store.taste_vector_generation(user_id).await?;
        let record = self.build(user_id).await?;
        if !self.store.save_taste_vector(&record, generation).await? {
            tracing::debug!(user_id, "Taste vector invalidated during build, not cached");
        }
        Ok(record)
    }

    /// Drops the cached vector so the next read recomputes it
    pub async fn invalidate(&self, user_id: UserId) -> AppResult<()> {
        self.store.delete_taste_vector(user_id).await
    }

    /// Computes the vector from the store and catalog without touching the cache
    pub async fn build(&self, user_id: UserId) -> AppResult<UserTasteVectorRecord> {
        let ratings = self.store.ratings_for_user(user_id).await?;
        let watched = self.store.watched_movies(user_id).await?;

        let watched_genres = self.watched_genres(&watched).await;
        let vector = normalize(combine([
            watched_vector(watched_genres.iter().map(Vec::as_slice)),
            ratings_vector(&ratings),
        ]));

        tracing::info!(
            user_id,
            ratings = ratings.len(),
            watched = watched.len(),
            genres = vector.len(),
            "Taste vector built"
        );

        Ok(UserTasteVectorRecord {
            user_id,
            genres_count: vector.len() as u32,
            vector,
            total_rated_movies: ratings.len() as u32,
            last_updated: Utc::now(),
        })
    }

    /// Genre names for each watched movie. Movies the catalog cannot resolve
    /// in time contribute nothing.
    async fn watched_genres(&self, movie_ids: &[i64]) -> Vec<Vec<String>> {
        lookup_genres_for_movies(Arc::clone(&self.catalog), movie_ids, self.lookup_timeout).await
    }
}
