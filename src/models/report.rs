use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::UserPair;

/// Stored taste comparison for a friendship pair. One row per pair, refreshed in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchReport {
    #[serde(flatten)]
    pub pair: UserPair,
    /// 0..=100
    pub match_percentage: u32,
    /// Raw cosine similarity in [-1, 1]
    pub similarity_score: f64,
    /// Genre → 0..=100 agreement on that genre alone
    pub genre_compatibility: BTreeMap<String, u32>,
    pub summary: String,
    pub low_total_ratings: u32,
    pub high_total_ratings: u32,
    pub generated_at: DateTime<Utc>,
}

impl MatchReport {
    /// True when every computed field matches, ignoring the generation timestamp
    pub fn same_scores(&self, other: &MatchReport) -> bool {
        self.pair == other.pair
            && self.match_percentage == other.match_percentage
            && self.similarity_score == other.similarity_score
            && self.genre_compatibility == other.genre_compatibility
            && self.summary == other.summary
            && self.low_total_ratings == other.low_total_ratings
            && self.high_total_ratings == other.high_total_ratings
    }
}
