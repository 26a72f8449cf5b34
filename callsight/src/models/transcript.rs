use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One earnings call for one fiscal period. Immutable input to the engine;
/// storage and identity assignment belong to the ingestion collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub company_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    pub fiscal_year: i32,
    pub fiscal_quarter: u8,
    pub call_date: DateTime<Utc>,
    pub raw_text: String,
    /// Names and titles of management speakers on the call, used to label
    /// segment speaker roles. Unresolvable speakers stay `Unknown`.
    #[serde(default)]
    pub management_roster: Vec<String>,
}

/// Who is speaking in a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerRole {
    Management,
    Analyst,
    Unknown,
}

/// Coarse topic area a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionTag {
    Financial,
    Product,
    Regulatory,
    General,
}

/// A normalized unit of transcript text (a speaker turn or a sentence).
/// Derived transiently from the raw text; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Position in the normalized sequence, used for deterministic tie-breaks.
    pub index: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    pub role: SpeakerRole,
    pub section: SectionTag,
    pub token_count: usize,
}

/// Output of the text normalizer. The full transcript is always re-derivable
/// from `Transcript::raw_text`, so nothing here needs to be cached.
#[derive(Debug, Clone)]
pub struct NormalizedTranscript {
    pub cleaned_text: String,
    pub word_count: usize,
    pub segments: Vec<Segment>,
}

impl NormalizedTranscript {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
