//! Movie catalog abstraction
//!
//! The scoring code only ever needs movie metadata and genre names. Lookups
//! made while scoring go through [`lookup_movie`] / [`lookup_movie_genres`],
//! which bound each call with a timeout and turn any failure into "no signal
//! for this movie" instead of failing the whole computation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
    error::AppResult,
    models::{MovieId, MovieRecord},
};

pub mod genre_cache;
pub mod tmdb;

pub use genre_cache::GenreCache;
pub use tmdb::TmdbCatalog;

/// Catalog calls allowed in flight for one batch of lookups
pub const MAX_CONCURRENT_LOOKUPS: usize = 8;

/// Source of movie metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Full record for one movie, including credits and keywords
    async fn fetch_movie(&self, movie_id: MovieId) -> AppResult<MovieRecord>;

    /// Resolves genre ids to display names, skipping unknown ids
    async fn genre_names(&self, genre_ids: &[u32]) -> AppResult<Vec<String>>;

    /// Catalog name for logging
    fn name(&self) -> &'static str;
}

/// Fetches a movie with a time bound. Failures are logged and yield `None`.
pub async fn lookup_movie(
    catalog: &dyn MovieCatalog,
    movie_id: MovieId,
    timeout: Duration,
) -> Option<MovieRecord> {
    match tokio::time::timeout(timeout, catalog.fetch_movie(movie_id)).await {
        Ok(Ok(movie)) => Some(movie),
        Ok(Err(e)) => {
            tracing::warn!(
                movie_id,
                catalog = catalog.name(),
                error = %e,
                "Movie lookup failed, skipping"
            );
            None
        }
        Err(_) => {
            tracing::warn!(
                movie_id,
                catalog = catalog.name(),
                timeout_ms = timeout.as_millis() as u64,
                "Movie lookup timed out, skipping"
            );
            None
        }
    }
}

/// Genre names for one movie. An unreachable catalog yields an empty list.
pub async fn lookup_movie_genres(
    catalog: &dyn MovieCatalog,
    movie_id: MovieId,
    timeout: Duration,
) -> Vec<String> {
    let Some(movie) = lookup_movie(catalog, movie_id, timeout).await else {
        return Vec::new();
    };

    match tokio::time::timeout(timeout, catalog.genre_names(&movie.genre_ids)).await {
        Ok(Ok(names)) => names,
        Ok(Err(e)) => {
            tracing::warn!(movie_id, error = %e, "Genre name lookup failed");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(movie_id, "Genre name lookup timed out");
            Vec::new()
        }
    }
}

/// Full records for `movie_ids`, fetched in parallel with at most
/// [`MAX_CONCURRENT_LOOKUPS`] calls in flight. Unresolved movies are left out.
pub async fn lookup_movies(
    catalog: Arc<dyn MovieCatalog>,
    movie_ids: &[MovieId],
    timeout: Duration,
) -> Vec<MovieRecord> {
    bounded_lookups(movie_ids, move |movie_id| {
        let catalog = Arc::clone(&catalog);
        async move { lookup_movie(catalog.as_ref(), movie_id, timeout).await }
    })
    .await
    .into_iter()
    .flatten()
    .collect()
}

/// Genre names for each of `movie_ids`, with the same bound as [`lookup_movies`]
pub async fn lookup_genres_for_movies(
    catalog: Arc<dyn MovieCatalog>,
    movie_ids: &[MovieId],
    timeout: Duration,
) -> Vec<Vec<String>> {
    bounded_lookups(movie_ids, move |movie_id| {
        let catalog = Arc::clone(&catalog);
        async move { lookup_movie_genres(catalog.as_ref(), movie_id, timeout).await }
    })
    .await
}

async fn bounded_lookups<T, F, Fut>(movie_ids: &[MovieId], lookup: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(MovieId) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
{
    let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_LOOKUPS));
    let mut tasks = JoinSet::new();

    for &movie_id in movie_ids {
        let permits = Arc::clone(&permits);
        let task = lookup(movie_id);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok()?;
            Some(task.await)
        });
    }

    let mut results = Vec::with_capacity(movie_ids.len());
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Some(value)) => results.push(value),
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "Catalog lookup task failed"),
        }
    }
    results
}
