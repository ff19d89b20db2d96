use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MovieId, UserId};

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("rating must be 1 (my type) or -1 (not my type), got {0}")]
pub struct InvalidRating(pub i64);

/// A swipe on a movie: +1 "my type", -1 "not my type"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum RatingValue {
    Like,
    Dislike,
}

impl RatingValue {
    pub fn as_f64(self) -> f64 {
        match self {
            RatingValue::Like => 1.0,
            RatingValue::Dislike => -1.0,
        }
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = InvalidRating;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RatingValue::Like),
            -1 => Ok(RatingValue::Dislike),
            other => Err(InvalidRating(other)),
        }
    }
}

impl From<RatingValue> for i64 {
    fn from(value: RatingValue) -> Self {
        match value {
            RatingValue::Like => 1,
            RatingValue::Dislike => -1,
        }
    }
}

/// One stored rating per (user, movie). Re-rating updates the row in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingEvent {
    pub user_id: UserId,
    pub tmdb_movie_id: MovieId,
    pub rating: RatingValue,
    /// Genre names cached when the rating was written
    pub genres: Vec<String>,
    /// Popularity cached when the rating was written
    pub popularity: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RatingEvent {
    pub fn new(
        user_id: UserId,
        tmdb_movie_id: MovieId,
        rating: RatingValue,
        genres: Vec<String>,
        popularity: Option<f64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            tmdb_movie_id,
            rating,
            genres,
            popularity,
            created_at: now,
            updated_at: now,
        }
    }
}
