mod alerts;
mod extractor;
mod orchestrator;
mod scorer;
mod trend;

pub use alerts::AlertGenerator;
pub use extractor::ExtractionEngine;
pub use orchestrator::{AnalysisEngine, AnalysisResult};
pub use scorer::{AggregateScores, ScoredSegment, SentimentScorer};
pub use trend::TrendComparator;

/// Case-insensitive check for any forward-looking cue phrase.
pub(crate) fn contains_cue_phrase(text: &str, cue_phrases: &[String]) -> bool {
    let lower = text.to_lowercase();
    cue_phrases.iter().any(|cue| lower.contains(cue.as_str()))
}
