use crate::{
    error::AppResult,
    models::{
        CuratedMovieList, MatchReport, MovieId, PairSide, RatingEvent, SessionStatus, UserId,
        UserPair, UserTasteVectorRecord, VotingSession,
    },
};

/// Persistence seam for the taste-matching services
///
/// Implementations must make [`Store::record_vote`] and [`Store::advance_status`]
/// atomic per session: two concurrent votes for the same pair may not both
/// observe a stale count, and the terminal `report_generated` status is never
/// overwritten.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Inserts the rating or updates the existing (user, movie) row in place
    async fn upsert_rating(&self, rating: RatingEvent) -> AppResult<RatingEvent>;

    async fn ratings_for_user(&self, user_id: UserId) -> AppResult<Vec<RatingEvent>>;

    async fn count_ratings(&self, user_id: UserId) -> AppResult<u32>;

    /// Returns false if the movie was already in the watched list
    async fn add_watched(&self, user_id: UserId, movie_id: MovieId) -> AppResult<bool>;

    async fn watched_movies(&self, user_id: UserId) -> AppResult<Vec<MovieId>>;

    async fn taste_vector(&self, user_id: UserId) -> AppResult<Option<UserTasteVectorRecord>>;

    /// Counter bumped by every [`Store::delete_taste_vector`]. Zero for a user
    /// whose vector was never invalidated.
    async fn taste_vector_generation(&self, user_id: UserId) -> AppResult<u64>;

    /// Caches the vector only while the user's generation still equals
    /// `generation`. Returns false (and writes nothing) once an invalidation
    /// has happened since the build started.
    async fn save_taste_vector(
        &self,
        record: &UserTasteVectorRecord,
        generation: u64,
    ) -> AppResult<bool>;

    /// Drops the cached vector and bumps the user's generation
    async fn delete_taste_vector(&self, user_id: UserId) -> AppResult<()>;

    async fn session(&self, pair: UserPair) -> AppResult<Option<VotingSession>>;

    /// Creates the session if needed, recounts `side`'s ratings and stamps its
    /// completion when the count reaches `quota`, all as one atomic step
    async fn record_vote(
        &self,
        pair: UserPair,
        side: PairSide,
        quota: u32,
    ) -> AppResult<VotingSession>;

    /// Moves the session to `status` unless it is already `report_generated`.
    /// Returns whether a write happened.
    async fn advance_status(&self, pair: UserPair, status: SessionStatus) -> AppResult<bool>;

    async fn report(&self, pair: UserPair) -> AppResult<Option<MatchReport>>;

    /// Creates the pair's report or overwrites every score field of the existing one
    async fn upsert_report(&self, report: &MatchReport) -> AppResult<MatchReport>;

    async fn curated_list(&self, user_id: UserId) -> AppResult<Option<CuratedMovieList>>;

    /// Replaces the user's whole list
    async fn save_curated_list(&self, list: &CuratedMovieList) -> AppResult<()>;

    async fn preferred_languages(&self, user_id: UserId) -> AppResult<Vec<String>>;

    async fn save_preferred_languages(
        &self,
        user_id: UserId,
        languages: &[String],
    ) -> AppResult<()>;
}
