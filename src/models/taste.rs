use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::UserId;

/// Genre name → weight in [-1, 1]. Absent genres count as 0.
pub type TasteVector = BTreeMap<String, f64>;

/// Cached taste vector for one user, dropped whenever that user's signal changes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserTasteVectorRecord {
    pub user_id: UserId,
    pub vector: TasteVector,
    pub total_rated_movies: u32,
    pub genres_count: u32,
    pub last_updated: DateTime<Utc>,
}
