//! Rating intake and the per-pair voting session.
//!
//! A session moves `voting_in_progress` → `one_side_complete` → `report_generated`.
//! Each vote recounts the voter's ratings and stamps their side once it reaches
//! [`VOTE_QUOTA`]; when both sides are stamped the report is generated.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        MovieId, RatingEvent, RatingValue, SessionState, SessionStatus, UserId,
        UserPair, VotingSession,
    },
    services::{match_report::MatchReportService, taste_vector::TasteVectorService},
};

/// Ratings each side must reach before the report is generated
pub const VOTE_QUOTA: u32 = 20;

/// A swipe as submitted by a client
#[derive(Debug, Clone, Deserialize)]
pub struct RatingInput {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: i64,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
    /// Friend whose taste-match session this vote counts towards
    #[serde(default)]
    pub friend_id: Option<UserId>,
}

impl RatingInput {
    fn validate(self) -> AppResult<(RatingEvent, Option<UserPair>)> {
        if self.user_id <= 0 {
            return Err(AppError::InvalidInput(format!(
                "invalid user id {}",
                self.user_id
            )));
        }
        if self.movie_id <= 0 {
            return Err(AppError::InvalidInput(format!(
                "invalid movie id {}",
                self.movie_id
            )));
        }
        let rating = RatingValue::try_from(self.rating)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        let pair = self
            .friend_id
            .map(|friend_id| UserPair::new(self.user_id, friend_id))
            .transpose()?;

        let popularity = self.popularity.filter(|p| p.is_finite());
        Ok((
            RatingEvent::new(self.user_id, self.movie_id, rating, self.genres, popularity),
            pair,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRatingResponse {
    pub saved: bool,
    /// Present when the rating was submitted towards a friend's session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_status: Option<SessionStatus>,
}

#[derive(Clone)]
pub struct VotingSessionCoordinator {
    store: Arc<dyn Store>,
    taste: TasteVectorService,
    reports: MatchReportService,
}

impl VotingSessionCoordinator {
    pub fn new(store: Arc<dyn Store>, taste: TasteVectorService, reports: MatchReportService) -> Self {
        Self {
            store,
            taste,
            reports,
        }
    }

    pub async fn record_rating(&self, input: RatingInput) -> AppResult<RecordRatingResponse> {
        let (event, pair) = input.validate()?;
        let user_id = event.user_id;
        let movie_id = event.tmdb_movie_id;

        self.store.upsert_rating(event).await?;
        self.taste.invalidate(user_id).await?;

        tracing::debug!(user_id, movie_id, "Rating saved");

        let session_status = match pair {
            Some(pair) => Some(self.record_vote(pair, user_id).await?),
            None => None,
        };

        Ok(RecordRatingResponse {
            saved: true,
            session_status,
        })
    }

    async fn record_vote(&self, pair: UserPair, user_id: UserId) -> AppResult<SessionStatus> {
        let side = pair
            .side_of(user_id)
            .ok_or_else(|| AppError::Internal(format!("user {} is not in pair {}", user_id, pair)))?;

        let session = self.store.record_vote(pair, side, VOTE_QUOTA).await?;
        self.settle(session).await
    }

    /// Advances the session to whatever its completion stamps imply, generating
    /// the report when both sides are done
    async fn settle(&self, session: VotingSession) -> AppResult<SessionStatus> {
        let pair = session.pair;
        if session.status == SessionStatus::ReportGenerated {
            return Ok(SessionStatus::ReportGenerated);
        }

        match session.pending_status() {
            SessionStatus::ReportGenerated => {
                // a concurrent duplicate only rewrites the same report row
                self.reports.generate(pair).await?;
                if self
                    .store
                    .advance_status(pair, SessionStatus::ReportGenerated)
                    .await?
                {
                    tracing::info!(pair = %pair, "Voting session complete");
                }
                Ok(SessionStatus::ReportGenerated)
            }
            SessionStatus::OneSideComplete => {
                if self
                    .store
                    .advance_status(pair, SessionStatus::OneSideComplete)
                    .await?
                {
                    tracing::info!(pair = %pair, "First side reached quota");
                }
                Ok(SessionStatus::OneSideComplete)
            }
            SessionStatus::VotingInProgress => Ok(SessionStatus::VotingInProgress),
        }
    }

    /// Session progress from `user_id`'s point of view; argument order does not matter
    /// for which session is read
    pub async fn get_session_state(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> AppResult<SessionState> {
        let pair = UserPair::new(user_id, friend_id)?;
        let Some(session) = self.store.session(pair).await? else {
            return Ok(SessionState::NotStarted);
        };

        let you = pair
            .side_of(user_id)
            .ok_or_else(|| AppError::Internal(format!("user {} is not in pair {}", user_id, pair)))?;
        let friend = you.opposite();

        if session.status == SessionStatus::ReportGenerated || session.both_complete() {
            let report = match self.reports.report(pair).await? {
                Some(report) => report,
                None => {
                    let report = self.reports.generate(pair).await?;
                    self.store
                        .advance_status(pair, SessionStatus::ReportGenerated)
                        .await?;
                    report
                }
            };
            return Ok(SessionState::ReportReady { report });
        }

        if session.completed_at(you).is_some() {
            return Ok(SessionState::WaitingForFriend {
                your_votes: session.votes(you),
                friend_votes: session.votes(friend),
            });
        }

        Ok(SessionState::VotingInProgress {
            votes_you: session.votes(you),
            votes_friend: session.votes(friend),
            votes_required: VOTE_QUOTA,
        })
    }
}
