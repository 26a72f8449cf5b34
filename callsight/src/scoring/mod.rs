mod api;
mod provider;

pub use api::ScoringApiClient;
pub use provider::{ScoringBackend, ScoringProvider, SegmentScore, SentimentOracle};
