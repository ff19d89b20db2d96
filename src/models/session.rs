use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::{MatchReport, UserId};
use crate::error::{AppError, AppResult};

/// Canonical key for a friendship pair: the smaller id is always `low`.
///
/// Sessions and reports are stored once per pair regardless of which friend
/// asks, so every lookup goes through this type instead of ordering ids inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserPair {
    #[serde(rename = "user_low_id")]
    low: UserId,
    #[serde(rename = "user_high_id")]
    high: UserId,
}

/// Which member of a [`UserPair`] a user is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSide {
    Low,
    High,
}

impl PairSide {
    pub fn opposite(self) -> Self {
        match self {
            PairSide::Low => PairSide::High,
            PairSide::High => PairSide::Low,
        }
    }
}

impl UserPair {
    pub fn new(a: UserId, b: UserId) -> AppResult<Self> {
        if a <= 0 || b <= 0 {
            return Err(AppError::InvalidInput(format!(
                "user ids must be positive, got {} and {}",
                a, b
            )));
        }
        if a == b {
            return Err(AppError::InvalidInput(
                "cannot compare a user with themselves".to_string(),
            ));
        }

        Ok(Self {
            low: a.min(b),
            high: a.max(b),
        })
    }

    pub fn low(&self) -> UserId {
        self.low
    }

    pub fn high(&self) -> UserId {
        self.high
    }

    pub fn user(&self, side: PairSide) -> UserId {
        match side {
            PairSide::Low => self.low,
            PairSide::High => self.high,
        }
    }

    pub fn side_of(&self, user_id: UserId) -> Option<PairSide> {
        if user_id == self.low {
            Some(PairSide::Low)
        } else if user_id == self.high {
            Some(PairSide::High)
        } else {
            None
        }
    }
}

impl Display for UserPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.low, self.high)
    }
}

/// Progress of a "rate 20 movies, then compare" session.
///
/// `OneSideComplete` was stored as `both_voted` by earlier versions even though
/// it is set as soon as either friend reaches the quota; the old string is
/// still accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    VotingInProgress,
    #[serde(alias = "both_voted")]
    OneSideComplete,
    ReportGenerated,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::VotingInProgress => "voting_in_progress",
            SessionStatus::OneSideComplete => "one_side_complete",
            SessionStatus::ReportGenerated => "report_generated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "voting_in_progress" => Some(SessionStatus::VotingInProgress),
            "one_side_complete" | "both_voted" => Some(SessionStatus::OneSideComplete),
            "report_generated" => Some(SessionStatus::ReportGenerated),
            _ => None,
        }
    }
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row per [`UserPair`], created lazily on the first vote from either side
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VotingSession {
    pub pair: UserPair,
    pub low_votes: u32,
    pub high_votes: u32,
    pub low_completed_at: Option<DateTime<Utc>>,
    pub high_completed_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VotingSession {
    pub fn new(pair: UserPair, now: DateTime<Utc>) -> Self {
        Self {
            pair,
            low_votes: 0,
            high_votes: 0,
            low_completed_at: None,
            high_completed_at: None,
            status: SessionStatus::VotingInProgress,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn votes(&self, side: PairSide) -> u32 {
        match side {
            PairSide::Low => self.low_votes,
            PairSide::High => self.high_votes,
        }
    }

    pub fn completed_at(&self, side: PairSide) -> Option<DateTime<Utc>> {
        match side {
            PairSide::Low => self.low_completed_at,
            PairSide::High => self.high_completed_at,
        }
    }

    pub fn both_complete(&self) -> bool {
        self.low_completed_at.is_some() && self.high_completed_at.is_some()
    }

    /// Records a fresh vote count for one side and stamps its completion the
    /// first time the count reaches `quota`. Returns true if this call stamped it.
    ///
    /// Callers must hold whatever lock or row lock guards this session so the
    /// count and the stamp are written together.
    pub fn apply_vote_count(
        &mut self,
        side: PairSide,
        count: u32,
        quota: u32,
        now: DateTime<Utc>,
    ) -> bool {
        let (votes, completed_at) = match side {
            PairSide::Low => (&mut self.low_votes, &mut self.low_completed_at),
            PairSide::High => (&mut self.high_votes, &mut self.high_completed_at),
        };

        *votes = count;
        self.updated_at = now;

        if count >= quota && completed_at.is_none() {
            *completed_at = Some(now);
            true
        } else {
            false
        }
    }

    /// Status implied by the completion stamps, ignoring the terminal state
    pub fn pending_status(&self) -> SessionStatus {
        if self.both_complete() {
            SessionStatus::ReportGenerated
        } else if self.low_completed_at.is_some() || self.high_completed_at.is_some() {
            SessionStatus::OneSideComplete
        } else {
            SessionStatus::VotingInProgress
        }
    }
}

/// Session progress as seen by one of the two friends
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    VotingInProgress {
        votes_you: u32,
        votes_friend: u32,
        votes_required: u32,
    },
    WaitingForFriend {
        your_votes: u32,
        friend_votes: u32,
    },
    ReportReady {
        report: MatchReport,
    },
}
