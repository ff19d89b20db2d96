use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{
    db::Store,
    error::AppResult,
    models::{
        CuratedMovieList, MatchReport, MovieId, PairSide, RatingEvent, SessionStatus, UserId,
        UserPair, UserTasteVectorRecord, VotingSession,
    },
};

/// In-process store used by tests and database-less runs
///
/// Every method takes the write (or read) lock once, which gives the same
/// per-session atomicity the Postgres store gets from row locks.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    ratings: HashMap<(UserId, MovieId), RatingEvent>,
    watched: HashMap<UserId, Vec<MovieId>>,
    taste_vectors: HashMap<UserId, UserTasteVectorRecord>,
    taste_generations: HashMap<UserId, u64>,
    sessions: HashMap<UserPair, VotingSession>,
    reports: HashMap<UserPair, MatchReport>,
    curated_lists: HashMap<UserId, CuratedMovieList>,
    languages: HashMap<UserId, Vec<String>>,
}

impl MemoryStoreInner {
    fn count_ratings(&self, user_id: UserId) -> u32 {
        self.ratings.keys().filter(|(user, _)| *user == user_id).count() as u32
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored reports, for assertions on report uniqueness
    pub async fn report_count(&self) -> usize {
        self.inner.read().await.reports.len()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn upsert_rating(&self, rating: RatingEvent) -> AppResult<RatingEvent> {
        let mut inner = self.inner.write().await;
        let key = (rating.user_id, rating.tmdb_movie_id);

        let stored = match inner.ratings.get_mut(&key) {
            Some(existing) => {
                existing.rating = rating.rating;
                existing.genres = rating.genres;
                existing.popularity = rating.popularity;
                existing.updated_at = rating.updated_at;
                existing.clone()
            }
            None => {
                inner.ratings.insert(key, rating.clone());
                rating
            }
        };

        Ok(stored)
    }

    async fn ratings_for_user(&self, user_id: UserId) -> AppResult<Vec<RatingEvent>> {
        let inner = self.inner.read().await;
        let mut ratings: Vec<RatingEvent> = inner
            .ratings
            .values()
            .filter(|rating| rating.user_id == user_id)
            .cloned()
            .collect();
        ratings.sort_by_key(|rating| (rating.created_at, rating.tmdb_movie_id));
        Ok(ratings)
    }

    async fn count_ratings(&self, user_id: UserId) -> AppResult<u32> {
        Ok(self.inner.read().await.count_ratings(user_id))
    }

    async fn add_watched(&self, user_id: UserId, movie_id: MovieId) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let watched = inner.watched.entry(user_id).or_default();
        if watched.contains(&movie_id) {
            return Ok(false);
        }
        watched.push(movie_id);
        Ok(true)
    }

    async fn watched_movies(&self, user_id: UserId) -> AppResult<Vec<MovieId>> {
        let inner = self.inner.read().await;
        Ok(inner.watched.get(&user_id).cloned().unwrap_or_default())
    }

    async fn taste_vector(&self, user_id: UserId) -> AppResult<Option<UserTasteVectorRecord>> {
        Ok(self.inner.read().await.taste_vectors.get(&user_id).cloned())
    }

    async fn taste_vector_generation(&self, user_id: UserId) -> AppResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.taste_generations.get(&user_id).copied().unwrap_or(0))
    }

    async fn save_taste_vector(
        &self,
        record: &UserTasteVectorRecord,
        generation: u64,
    ) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let current = inner.taste_generations.get(&record.user_id).copied().unwrap_or(0);
        if current != generation {
            return Ok(false);
        }

        inner.taste_vectors.insert(record.user_id, record.clone());
        Ok(true)
    }

    async fn delete_taste_vector(&self, user_id: UserId) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.taste_vectors.remove(&user_id);
        *inner.taste_generations.entry(user_id).or_insert(0) += 1;
        Ok(())
    }

    async fn session(&self, pair: UserPair) -> AppResult<Option<VotingSession>> {
        Ok(self.inner.read().await.sessions.get(&pair).cloned())
    }

    async fn record_vote(
        &self,
        pair: UserPair,
        side: PairSide,
        quota: u32,
    ) -> AppResult<VotingSession> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let count = inner.count_ratings(pair.user(side));

        let session = inner
            .sessions
            .entry(pair)
            .or_insert_with(|| VotingSession::new(pair, now));
        session.apply_vote_count(side, count, quota, now);

        Ok(session.clone())
    }

    async fn advance_status(&self, pair: UserPair, status: SessionStatus) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.sessions.get_mut(&pair) {
            Some(session)
                if session.status != SessionStatus::ReportGenerated && session.status != status =>
            {
                session.status = status;
                session.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn report(&self, pair: UserPair) -> AppResult<Option<MatchReport>> {
        Ok(self.inner.read().await.reports.get(&pair).cloned())
    }

    async fn upsert_report(&self, report: &MatchReport) -> AppResult<MatchReport> {
        let mut inner = self.inner.write().await;
        inner.reports.insert(report.pair, report.clone());
        Ok(report.clone())
    }

    async fn curated_list(&self, user_id: UserId) -> AppResult<Option<CuratedMovieList>> {
        Ok(self.inner.read().await.curated_lists.get(&user_id).cloned())
    }

    async fn save_curated_list(&self, list: &CuratedMovieList) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.curated_lists.insert(list.user_id, list.clone());
        Ok(())
    }

    async fn preferred_languages(&self, user_id: UserId) -> AppResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner.languages.get(&user_id).cloned().unwrap_or_default())
    }

    async fn save_preferred_languages(
        &self,
        user_id: UserId,
        languages: &[String],
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.languages.insert(user_id, languages.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RatingValue;

    fn rating(user_id: UserId, movie_id: MovieId, value: RatingValue) -> RatingEvent {
        RatingEvent::new(user_id, movie_id, value, vec!["Action".to_string()], Some(40.0))
    }

    #[tokio::test]
    async fn test_upsert_rating_updates_in_place() {
        let store = MemoryStore::new();
        store.upsert_rating(rating(1, 10, RatingValue::Like)).await.unwrap();
        store.upsert_rating(rating(1, 10, RatingValue::Dislike)).await.unwrap();

        let ratings = store.ratings_for_user(1).await.unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].rating, RatingValue::Dislike);
        assert_eq!(store.count_ratings(1).await.unwrap(), 1);
        assert_eq!(store.count_ratings(2).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_watched_is_idempotent() {
        let store = MemoryStore::new();
        assert!(store.add_watched(1, 550).await.unwrap());
        assert!(!store.add_watched(1, 550).await.unwrap());
        assert_eq!(store.watched_movies(1).await.unwrap(), vec![550]);
    }

    #[tokio::test]
    async fn test_taste_vector_save_skipped_after_invalidation() {
        let store = MemoryStore::new();
        let record = UserTasteVectorRecord {
            user_id: 1,
            vector: Default::default(),
            total_rated_movies: 0,
            genres_count: 0,
            last_updated: Utc::now(),
        };

        let generation = store.taste_vector_generation(1).await.unwrap();
        assert_eq!(generation, 0);
        store.delete_taste_vector(1).await.unwrap();

        assert!(!store.save_taste_vector(&record, generation).await.unwrap());
        assert!(store.taste_vector(1).await.unwrap().is_none());

        let generation = store.taste_vector_generation(1).await.unwrap();
        assert_eq!(generation, 1);
        assert!(store.save_taste_vector(&record, generation).await.unwrap());
        assert!(store.taste_vector(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_record_vote_creates_session_lazily() {
        let store = MemoryStore::new();
        let pair = UserPair::new(4, 2).unwrap();
        assert!(store.session(pair).await.unwrap().is_none());

        store.upsert_rating(rating(4, 1, RatingValue::Like)).await.unwrap();
        let session = store.record_vote(pair, PairSide::High, 20).await.unwrap();

        assert_eq!(session.high_votes, 1);
        assert_eq!(session.low_votes, 0);
        assert_eq!(session.status, SessionStatus::VotingInProgress);
        assert!(store.session(pair).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_advance_status_never_leaves_terminal_state() {
        let store = MemoryStore::new();
        let pair = UserPair::new(1, 2).unwrap();
        store.record_vote(pair, PairSide::Low, 20).await.unwrap();

        assert!(store
            .advance_status(pair, SessionStatus::ReportGenerated)
            .await
            .unwrap());
        assert!(!store
            .advance_status(pair, SessionStatus::ReportGenerated)
            .await
            .unwrap());
        assert!(!store
            .advance_status(pair, SessionStatus::OneSideComplete)
            .await
            .unwrap());

        let session = store.session(pair).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::ReportGenerated);
    }
}
