use std::cmp::Ordering;
use std::collections::BTreeSet;

use regex::Regex;

use crate::analysis::contains_cue_phrase;
use crate::analysis::scorer::ScoredSegment;
use crate::config::ExtractionConfig;
use crate::error::Result;
use crate::models::{
    GuidanceConfidence, GuidanceItem, GuidanceMetric, Quote, SentimentResult, SpeakerRole,
};

/// Keyword fragments mapped to topic tags. Fragments are matched by
/// substring so "competit" covers competitor/competitive/competition.
const TOPIC_KEYWORDS: &[(&str, &str)] = &[
    ("revenue", "financial_performance"),
    ("earnings", "financial_performance"),
    ("margin", "financial_performance"),
    ("cash", "financial_performance"),
    ("expenses", "financial_performance"),
    ("trial", "clinical_trials"),
    ("phase", "clinical_trials"),
    ("enrollment", "clinical_trials"),
    ("study", "clinical_trials"),
    ("fda", "regulatory"),
    ("approval", "regulatory"),
    ("regulatory", "regulatory"),
    ("submission", "regulatory"),
    ("competit", "competitive_landscape"),
    ("market share", "competitive_landscape"),
    ("partner", "partnerships"),
    ("collaborat", "partnerships"),
    ("alliance", "partnerships"),
];

const MAX_GUIDANCE_ITEMS: usize = 10;

/// Identifies key quotes and guidance statements in scored segments using
/// the configured cue-phrase and metric-keyword tables.
pub struct ExtractionEngine {
    config: ExtractionConfig,
    timeframe_patterns: Vec<Regex>,
    value_pattern: Regex,
}

impl ExtractionEngine {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let timeframe_patterns = [
            r"(?i)\bQ[1-4]\s*(?:of\s*)?(?:20\d{2}|'\d{2})",
            r"(?i)\b(?:first|second|third|fourth)\s+quarter(?:\s+of\s+20\d{2})?",
            r"(?i)\b(?:fiscal|full)[-\s]year\s*20\d{2}",
            r"(?i)\bFY\s*'?\d{2,4}\b",
            r"(?i)\bQ[1-4]\b",
            r"(?i)\b(?:next|this|the coming)\s+(?:year|quarter)\b",
            r"(?i)\b(?:january|february|march|april|may|june|july|august|september|october|november|december)\s+20\d{2}\b",
            r"(?i)\b(?:by\s+)?(?:the\s+)?end\s+of\s+20\d{2}\b",
            r"\b20\d{2}\b",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern))
        .collect::<std::result::Result<Vec<_>, _>>()?;

        let value_pattern = Regex::new(
            r"(?i)\$\s?\d[\d,]*(?:\.\d+)?\s*(?:million|billion|thousand)?|\d+(?:\.\d+)?\s*%|\b\d[\d,]*(?:\.\d+)?\s+(?:million|billion|patients|subjects)\b",
        )?;

        Ok(Self {
            config: config.clone(),
            timeframe_patterns,
            value_pattern,
        })
    }

    /// Select quotable management statements, ranked by |sentiment| with
    /// ties broken by segment order, truncated to the configured maximum.
    pub fn extract_quotes(&self, scored: &[ScoredSegment]) -> Vec<Quote> {
        let mut quotes: Vec<Quote> = scored
            .iter()
            .filter(|s| {
                s.segment.role == SpeakerRole::Management
                    && s.segment.token_count >= self.config.min_quote_tokens
                    && (s.score.polarity.abs() >= self.config.notable_threshold
                        || contains_cue_phrase(&s.segment.text, &self.config.cue_phrases))
            })
            .map(|s| Quote {
                text: s.segment.text.clone(),
                speaker_role: s.segment.role,
                section: s.segment.section,
                sentiment_score: s.score.polarity,
                topic: self.first_topic(&s.segment.text),
            })
            .collect();

        // Stable sort: equal magnitudes keep original segment order.
        quotes.sort_by(|a, b| {
            b.sentiment_score
                .abs()
                .partial_cmp(&a.sentiment_score.abs())
                .unwrap_or(Ordering::Equal)
        });
        quotes.truncate(self.config.max_quotes);
        quotes
    }

    /// Parse guidance statements: segments carrying both a forward-looking
    /// cue and a recognized metric keyword.
    pub fn extract_guidance(
        &self,
        scored: &[ScoredSegment],
        previous: Option<&SentimentResult>,
    ) -> Vec<GuidanceItem> {
        let mut items = Vec::new();

        for s in scored {
            if !contains_cue_phrase(&s.segment.text, &self.config.cue_phrases) {
                continue;
            }
            let Some(metric) = self.first_metric(&s.segment.text) else {
                continue;
            };

            let value = self
                .value_pattern
                .find(&s.segment.text)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_else(|| "qualitative".to_string());
            let numeric_value = parse_numeric(&value);
            let timeframe = self.first_timeframe(&s.segment.text);

            let confidence = match (numeric_value.is_some(), timeframe != "unspecified") {
                (true, true) => GuidanceConfidence::High,
                (false, false) => GuidanceConfidence::Low,
                _ => GuidanceConfidence::Medium,
            };

            let change_from_previous = previous.and_then(|prior| {
                describe_change(metric, numeric_value, &value, prior)
            });

            items.push(GuidanceItem {
                metric,
                value,
                timeframe,
                confidence,
                numeric_value,
                change_from_previous,
            });

            if items.len() == MAX_GUIDANCE_ITEMS {
                break;
            }
        }

        items
    }

    /// Topic tags present anywhere in the normalized segments.
    pub fn extract_topics(&self, scored: &[ScoredSegment]) -> BTreeSet<String> {
        let mut topics = BTreeSet::new();
        for s in scored {
            let lower = s.segment.text.to_lowercase();
            for (keyword, topic) in TOPIC_KEYWORDS {
                if lower.contains(keyword) {
                    topics.insert(topic.to_string());
                }
            }
        }
        topics
    }

    fn first_topic(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        TOPIC_KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, topic)| topic.to_string())
    }

    fn first_metric(&self, text: &str) -> Option<GuidanceMetric> {
        let lower = text.to_lowercase();
        self.config
            .metric_keywords
            .iter()
            .find(|(keyword, _)| lower.contains(keyword.as_str()))
            .map(|(_, metric)| *metric)
    }

    fn first_timeframe(&self, text: &str) -> String {
        self.timeframe_patterns
            .iter()
            .find_map(|pattern| pattern.find(text))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "unspecified".to_string())
    }
}

/// Compare against the immediately preceding period's guidance for the same
/// metric. Non-numeric values on either side are left uncompared.
fn describe_change(
    metric: GuidanceMetric,
    current_numeric: Option<f64>,
    current_value: &str,
    prior: &SentimentResult,
) -> Option<String> {
    let prior_item = prior
        .extracted_guidance
        .iter()
        .find(|item| item.metric == metric)?;

    let current = current_numeric?;
    let prior_numeric = prior_item.numeric_value?;

    if prior_numeric == 0.0 {
        return Some(format!("from {} to {}", prior_item.value, current_value));
    }

    let pct = (current - prior_numeric) / prior_numeric.abs() * 100.0;
    Some(format!(
        "from {} to {} ({pct:+.1}%)",
        prior_item.value, current_value
    ))
}

/// Parse a value literal into a number: handles $ and comma grouping,
/// million/billion/thousand magnitudes, and percents.
pub(crate) fn parse_numeric(value: &str) -> Option<f64> {
    let lower = value.to_lowercase();
    let digits: String = lower
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let base: f64 = digits.parse().ok()?;

    let multiplier = if lower.contains("billion") {
        1e9
    } else if lower.contains("million") {
        1e6
    } else if lower.contains("thousand") {
        1e3
    } else {
        1.0
    };

    Some(base * multiplier)
}
