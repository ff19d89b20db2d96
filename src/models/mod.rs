pub mod curated;
pub mod movie;
pub mod rating;
pub mod report;
pub mod session;
pub mod taste;

pub use curated::{normalize_languages, CuratedMovie, CuratedMovieList, MIN_CURATED_MOVIES};
pub use movie::{MovieId, MovieRecord, TmdbGenre, TmdbGenreList, TmdbMovieDetails};
pub use rating::{RatingEvent, RatingValue};
pub use report::MatchReport;
pub use session::{PairSide, SessionState, SessionStatus, UserPair, VotingSession};
pub use taste::{TasteVector, UserTasteVectorRecord};

/// Application user identifier
pub type UserId = i64;
