//! Fixed-length numeric features for a single movie.
//!
//! Layout: one one-hot slot per genre in the [`FeatureSpace`], followed by
//! rating, popularity, release year and blockbuster score, each in [0, 1].

use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::{MovieId, MovieRecord};

/// TMDB's movie genre ids
pub const TMDB_MOVIE_GENRES: [u32; 19] = [
    28,    // Action
    12,    // Adventure
    16,    // Animation
    35,    // Comedy
    80,    // Crime
    99,    // Documentary
    18,    // Drama
    10751, // Family
    14,    // Fantasy
    36,    // History
    27,    // Horror
    10402, // Music
    9648,  // Mystery
    10749, // Romance
    878,   // Science Fiction
    10770, // TV Movie
    53,    // Thriller
    10752, // War
    37,    // Western
];

pub const YEAR_WINDOW_START: i32 = 1900;
pub const YEAR_WINDOW_END: i32 = 2030;

/// Number of non-genre slots at the end of every vector
pub const SCALAR_FEATURES: usize = 4;

const BLOCKBUSTER_POPULARITY_WEIGHT: f64 = 0.6;
const BLOCKBUSTER_RATING_WEIGHT: f64 = 0.4;

/// The genres that get a slot, in slot order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSpace {
    genre_ids: Vec<u32>,
}

impl Default for FeatureSpace {
    fn default() -> Self {
        Self::new(TMDB_MOVIE_GENRES.to_vec())
    }
}

/// Feature vector of one movie plus the raw values the scorers still need
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieFeatureVector {
    pub movie_id: MovieId,
    pub genre_ids: BTreeSet<u32>,
    /// vote_average / 10
    pub rating: f64,
    /// popularity / 100, clamped to [0, 1]
    pub popularity: f64,
    /// Position of the release year in [1900, 2030]
    pub year: f64,
    pub release_year: Option<i32>,
    pub blockbuster: f64,
    pub values: Vec<f64>,
}

impl FeatureSpace {
    pub fn new(genre_ids: Vec<u32>) -> Self {
        Self { genre_ids }
    }

    pub fn genre_ids(&self) -> &[u32] {
        &self.genre_ids
    }

    pub fn dimensions(&self) -> usize {
        self.genre_ids.len() + SCALAR_FEATURES
    }

    /// Pure transform; missing fields produce zeros in their slots
    pub fn vectorize(&self, movie: &MovieRecord) -> MovieFeatureVector {
        let genre_ids: BTreeSet<u32> = movie.genre_ids.iter().copied().collect();

        let rating = normalize_rating(movie.vote_average);
        let popularity = normalize_popularity(movie.popularity);
        let release_year = movie.release_year();
        let year = normalize_year(release_year);
        let blockbuster =
            BLOCKBUSTER_POPULARITY_WEIGHT * popularity + BLOCKBUSTER_RATING_WEIGHT * rating;

        let mut values: Vec<f64> = self
            .genre_ids
            .iter()
            .map(|id| if genre_ids.contains(id) { 1.0 } else { 0.0 })
            .collect();
        values.extend([rating, popularity, year, blockbuster]);

        MovieFeatureVector {
            movie_id: movie.id,
            genre_ids,
            rating,
            popularity,
            year,
            release_year,
            blockbuster,
            values,
        }
    }
}

fn finite(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

pub fn normalize_rating(vote_average: Option<f64>) -> f64 {
    (finite(vote_average) / 10.0).clamp(0.0, 1.0)
}

pub fn normalize_popularity(popularity: Option<f64>) -> f64 {
    (finite(popularity) / 100.0).clamp(0.0, 1.0)
}

pub fn normalize_year(year: Option<i32>) -> f64 {
    match year {
        Some(year) => {
            let span = f64::from(YEAR_WINDOW_END - YEAR_WINDOW_START);
            (f64::from(year - YEAR_WINDOW_START) / span).clamp(0.0, 1.0)
        }
        None => 0.0,
    }
}
