pub mod catalog;
pub mod compatibility;
pub mod features;
pub mod match_report;
pub mod recommendations;
pub mod scoring;
pub mod similarity;
pub mod taste_vector;
pub mod voting_session;

pub use compatibility::CompatibilityService;
pub use match_report::MatchReportService;
pub use recommendations::RecommendationService;
pub use taste_vector::TasteVectorService;
pub use voting_session::VotingSessionCoordinator;
