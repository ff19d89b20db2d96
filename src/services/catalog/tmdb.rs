/// TMDB catalog client
///
/// API Flow:
/// 1. Movie: /movie/{id}?append_to_response=credits,keywords → details, cast/crew, keywords
/// 2. Genres: /genre/movie/list → id/name pairs, held in the injected [`GenreCache`]
///
/// Movie records and the raw genre list are also cached in Redis.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{MovieId, MovieRecord, TmdbGenre, TmdbGenreList, TmdbMovieDetails},
    services::catalog::{GenreCache, MovieCatalog},
};
use reqwest::{Client as HttpClient, StatusCode};
use std::sync::Arc;

const GENRE_LIST_CACHE_TTL: u64 = 86_400; // 1 day

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
    genres: Arc<GenreCache>,
    movie_cache_ttl: u64,
}

impl TmdbCatalog {
    pub fn new(
        cache: Cache,
        genres: Arc<GenreCache>,
        api_key: String,
        api_url: String,
        movie_cache_ttl: u64,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
            genres,
            movie_cache_ttl,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("TMDB resource {}", path)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(path = %path, status = %status, body = %body, "TMDB request failed");
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {}: {}",
                status, body
            )));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(path = %path, error = %e, "Failed to parse TMDB response");
            AppError::ExternalApi(format!("Failed to parse TMDB response: {}", e))
        })
    }

    async fn fetch_genre_list(&self) -> AppResult<Vec<TmdbGenre>> {
        let list: TmdbGenreList = cached!(
            self.cache,
            CacheKey::GenreList,
            GENRE_LIST_CACHE_TTL,
            self.get_json::<TmdbGenreList>("/genre/movie/list", &[])
        )?;

        Ok(list.genres)
    }
}

#[async_trait::async_trait]
impl MovieCatalog for TmdbCatalog {
    async fn fetch_movie(&self, movie_id: MovieId) -> AppResult<MovieRecord> {
        if movie_id <= 0 {
            return Err(AppError::InvalidInput(format!(
                "invalid movie id {}",
                movie_id
            )));
        }

        cached!(
            self.cache,
            CacheKey::Movie(movie_id),
            self.movie_cache_ttl,
            async move {
                let details: TmdbMovieDetails = self
                    .get_json(
                        &format!("/movie/{}", movie_id),
                        &[("append_to_response", "credits,keywords")],
                    )
                    .await?;

                let movie = MovieRecord::from(details);

                tracing::info!(
                    movie_id,
                    genres = movie.genre_ids.len(),
                    provider = "tmdb",
                    "Movie fetched"
                );

                Ok::<_, AppError>(movie)
            }
        )
    }

    async fn genre_names(&self, genre_ids: &[u32]) -> AppResult<Vec<String>> {
        if genre_ids.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(names) = self.genres.lookup(genre_ids).await {
            return Ok(names);
        }

        let genres = self.fetch_genre_list().await?;
        self.genres.replace(genres).await;

        Ok(self.genres.lookup(genre_ids).await.unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
