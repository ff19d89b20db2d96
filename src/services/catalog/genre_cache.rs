use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::models::TmdbGenre;

struct GenreSnapshot {
    names: HashMap<u32, String>,
    loaded_at: Instant,
}

/// TMDB genre id → name map with a time-to-live
///
/// Owned by whoever builds the catalog client (and shared through an `Arc`),
/// so tests get a fresh, empty cache per instance.
pub struct GenreCache {
    ttl: Duration,
    snapshot: RwLock<Option<GenreSnapshot>>,
}

impl GenreCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            snapshot: RwLock::new(None),
        }
    }

    /// Names for `ids`, or `None` when the map is empty or expired.
    /// Ids TMDB does not know are skipped.
    pub async fn lookup(&self, ids: &[u32]) -> Option<Vec<String>> {
        let snapshot = self.snapshot.read().await;
        let snapshot = snapshot
            .as_ref()
            .filter(|snapshot| snapshot.loaded_at.elapsed() < self.ttl)?;

        Some(
            ids.iter()
                .filter_map(|id| snapshot.names.get(id).cloned())
                .collect(),
        )
    }

    pub async fn replace(&self, genres: Vec<TmdbGenre>) {
        let names = genres
            .into_iter()
            .map(|genre| (genre.id, genre.name))
            .collect::<HashMap<_, _>>();

        tracing::debug!(genres = names.len(), "Genre map refreshed");

        *self.snapshot.write().await = Some(GenreSnapshot {
            names,
            loaded_at: Instant::now(),
        });
    }

    pub async fn invalidate(&self) {
        *self.snapshot.write().await = None;
    }
}
