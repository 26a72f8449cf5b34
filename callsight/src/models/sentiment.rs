use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::transcript::{SectionTag, SpeakerRole};

/// Label derived from the overall score, neutral inside (-0.1, 0.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn from_score(score: f32) -> Self {
        if score > 0.1 {
            Self::Positive
        } else if score < -0.1 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

/// Segment counts bucketed by polarity (positive > 0.1, negative < -0.1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolarityCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl PolarityCounts {
    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }
}

/// Counts of management-language confidence markers found in the transcript.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceMarkers {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

/// A quotable management statement. Always a sub-object of exactly one
/// `SentimentResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub speaker_role: SpeakerRole,
    pub section: SectionTag,
    pub sentiment_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

/// Closed set of metrics guidance statements are mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceMetric {
    Revenue,
    Earnings,
    Enrollment,
    RegulatoryMilestone,
    Other,
}

impl std::fmt::Display for GuidanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Revenue => "revenue",
            Self::Earnings => "earnings",
            Self::Enrollment => "enrollment",
            Self::RegulatoryMilestone => "regulatory_milestone",
            Self::Other => "other",
        };
        write!(f, "{name}")
    }
}

impl FromStr for GuidanceMetric {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "revenue" => Ok(Self::Revenue),
            "earnings" => Ok(Self::Earnings),
            "enrollment" => Ok(Self::Enrollment),
            "regulatory_milestone" | "milestone" => Ok(Self::RegulatoryMilestone),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown guidance metric: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceConfidence {
    Low,
    Medium,
    High,
}

/// One forward-looking guidance statement parsed from a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidanceItem {
    pub metric: GuidanceMetric,
    /// Verbatim value text; units vary ("$150 million", "15%", "on track").
    pub value: String,
    /// Fiscal-period label or free text, "unspecified" when no pattern matched.
    pub timeframe: String,
    pub confidence: GuidanceConfidence,
    /// Parsed numeric value when `value` is a money/percent/number literal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_value: Option<f64>,
    /// Populated only when the same metric had numeric guidance in the
    /// immediately preceding period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_from_previous: Option<String>,
}

/// The composed per-transcript analysis record. Created once per transcript;
/// re-analysis creates a new result rather than editing in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentResult {
    pub company_id: String,
    pub fiscal_year: i32,
    pub fiscal_quarter: u8,
    /// Length-weighted mean of management-segment polarity, in [-1, 1].
    pub overall_sentiment: f32,
    pub sentiment_label: SentimentLabel,
    /// Length-weighted, marker-signed oracle confidence, in [-1, 1].
    pub management_confidence: f32,
    /// Mean polarity of forward-looking financial/product segments.
    pub guidance_sentiment: f32,
    /// Number of management-role segments that were scored.
    pub scored_segments: usize,
    pub polarity_counts: PolarityCounts,
    pub confidence_markers: ConfidenceMarkers,
    pub key_quotes: Vec<Quote>,
    pub extracted_guidance: Vec<GuidanceItem>,
    pub key_topics: BTreeSet<String>,
    pub word_count: usize,
}

impl SentimentResult {
    /// Whether the scores are usable for trend math. History entries that
    /// fail this check make the whole comparison unsafe.
    pub fn is_well_formed(&self) -> bool {
        let in_unit_range = |value: f32| value.is_finite() && (-1.0..=1.0).contains(&value);

        in_unit_range(self.overall_sentiment)
            && in_unit_range(self.management_confidence)
            && self.guidance_sentiment.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_label_bands() {
        assert_eq!(SentimentLabel::from_score(0.45), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_score(0.1), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.05), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_score(-0.3), SentimentLabel::Negative);
    }

    #[test]
    fn guidance_metric_parses_known_names() {
        assert_eq!(
            "revenue".parse::<GuidanceMetric>(),
            Ok(GuidanceMetric::Revenue)
        );
        assert_eq!(
            "milestone".parse::<GuidanceMetric>(),
            Ok(GuidanceMetric::RegulatoryMilestone)
        );
        assert!("ebitda_margin".parse::<GuidanceMetric>().is_err());
    }

    #[test]
    fn guidance_item_round_trips_without_optional_fields() {
        let item = GuidanceItem {
            metric: GuidanceMetric::Enrollment,
            value: "on track".to_string(),
            timeframe: "unspecified".to_string(),
            confidence: GuidanceConfidence::Low,
            numeric_value: None,
            change_from_previous: None,
        };

        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("change_from_previous"));
        let back: GuidanceItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn well_formed_rejects_nan_and_out_of_range() {
        let mut result = SentimentResult {
            company_id: "acme".to_string(),
            fiscal_year: 2025,
            fiscal_quarter: 2,
            overall_sentiment: 0.2,
            sentiment_label: SentimentLabel::Positive,
            management_confidence: 0.1,
            guidance_sentiment: 0.0,
            scored_segments: 4,
            polarity_counts: PolarityCounts::default(),
            confidence_markers: ConfidenceMarkers::default(),
            key_quotes: Vec::new(),
            extracted_guidance: Vec::new(),
            key_topics: BTreeSet::new(),
            word_count: 100,
        };
        assert!(result.is_well_formed());

        result.overall_sentiment = f32::NAN;
        assert!(!result.is_well_formed());

        result.overall_sentiment = 1.7;
        assert!(!result.is_well_formed());
    }
}
