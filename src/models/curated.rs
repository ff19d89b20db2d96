use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{MovieId, UserId};
use crate::error::{AppError, AppResult};

/// Minimum number of picks a curated list must contain
pub const MIN_CURATED_MOVIES: usize = 5;

/// One hand-picked movie in a user's curated list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CuratedMovie {
    pub tmdb_id: MovieId,
    pub title: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// A user's curated picks. Saving replaces the whole list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CuratedMovieList {
    pub user_id: UserId,
    pub movies: Vec<CuratedMovie>,
    pub updated_at: DateTime<Utc>,
}

impl CuratedMovieList {
    pub fn new(user_id: UserId, movies: Vec<CuratedMovie>) -> AppResult<Self> {
        if movies.len() < MIN_CURATED_MOVIES {
            return Err(AppError::InvalidInput(format!(
                "a curated list needs at least {} movies, got {}",
                MIN_CURATED_MOVIES,
                movies.len()
            )));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = movies.iter().find(|movie| !seen.insert(movie.tmdb_id)) {
            return Err(AppError::InvalidInput(format!(
                "movie {} appears more than once",
                duplicate.tmdb_id
            )));
        }

        let movies = movies
            .into_iter()
            .map(|mut movie| {
                movie.language = movie.language.and_then(normalize_language);
                movie
            })
            .collect();

        Ok(Self {
            user_id,
            movies,
            updated_at: Utc::now(),
        })
    }
}

/// Trimmed, lowercased language code. Blank codes are dropped.
fn normalize_language(language: String) -> Option<String> {
    let language = language.trim().to_lowercase();
    (!language.is_empty()).then_some(language)
}

/// Lowercases, trims and deduplicates declared languages, keeping first-seen order
pub fn normalize_languages(languages: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    languages
        .into_iter()
        .filter_map(normalize_language)
        .filter(|language| seen.insert(language.clone()))
        .collect()
}
