use std::env;

use serde::Deserialize;

use crate::models::GuidanceMetric;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_list(var: &str, defaults: &[&str]) -> Vec<String> {
    match env::var(var) {
        Ok(val) if !val.trim().is_empty() => val
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => defaults.iter().map(|s| s.to_string()).collect(),
    }
}

/// Parse `CALLSIGHT_METRIC_KEYWORDS`.
/// Format: comma-separated `keyword:metric` pairs, e.g.
/// `revenue:revenue,sales:revenue,enrollment:enrollment`
fn parse_metric_keywords() -> Vec<(String, GuidanceMetric)> {
    let parsed: Vec<(String, GuidanceMetric)> = match env::var("CALLSIGHT_METRIC_KEYWORDS") {
        Ok(val) if !val.trim().is_empty() => val
            .split(',')
            .filter_map(|pair| {
                let mut parts = pair.splitn(2, ':');
                let keyword = parts.next()?.trim().to_lowercase();
                let metric = parts.next()?.trim();
                match metric.parse::<GuidanceMetric>() {
                    Ok(metric) if !keyword.is_empty() => Some((keyword, metric)),
                    _ => {
                        tracing::warn!(
                            "Invalid metric keyword pair '{}' in CALLSIGHT_METRIC_KEYWORDS, skipping",
                            pair
                        );
                        None
                    }
                }
            })
            .collect(),
        _ => Vec::new(),
    };

    if parsed.is_empty() {
        default_metric_keywords()
    } else {
        parsed
    }
}

fn default_metric_keywords() -> Vec<(String, GuidanceMetric)> {
    [
        ("revenue", GuidanceMetric::Revenue),
        ("sales", GuidanceMetric::Revenue),
        ("top line", GuidanceMetric::Revenue),
        ("earnings", GuidanceMetric::Earnings),
        ("eps", GuidanceMetric::Earnings),
        ("net income", GuidanceMetric::Earnings),
        ("enrollment", GuidanceMetric::Enrollment),
        ("enroll", GuidanceMetric::Enrollment),
        ("milestone", GuidanceMetric::RegulatoryMilestone),
        ("approval", GuidanceMetric::RegulatoryMilestone),
        ("submission", GuidanceMetric::RegulatoryMilestone),
        ("clearance", GuidanceMetric::RegulatoryMilestone),
    ]
    .into_iter()
    .map(|(k, m)| (k.to_string(), m))
    .collect()
}

/// Forward-looking cue phrases, matched case-insensitively against segment
/// text. The first seven come from the engine contract; the rest are common
/// phrasings observed in real calls.
const DEFAULT_CUE_PHRASES: &[&str] = &[
    "expect",
    "anticipate",
    "guidance",
    "target",
    "outlook",
    "will be",
    "plan to",
    "project",
    "forecast",
    "on track to",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scoring: Option<ScoringConfig>,
    pub extraction: ExtractionConfig,
    pub trend: TrendPolicy,
    pub alerts: AlertPolicy,
    pub lexicon: LexiconConfig,
}

/// Connection settings for the external sentiment-scoring service.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Segments per scoring request. Batching is an optimization only; the
    /// response must preserve per-segment attribution.
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    pub cue_phrases: Vec<String>,
    pub metric_keywords: Vec<(String, GuidanceMetric)>,
    /// Minimum token count for a segment to be quotable.
    pub min_quote_tokens: usize,
    /// |sentiment| above which a segment is quotable on score alone.
    pub notable_threshold: f32,
    pub max_quotes: usize,
}

/// Numeric policy for trend classification. The defaults here are pinned by
/// the test suite; tune via env rather than editing call sites.
#[derive(Debug, Clone, Deserialize)]
pub struct TrendPolicy {
    pub comparison_window: usize,
    /// Sentiment delta beyond which a move counts as improving/declining.
    pub sentiment_delta: f32,
    pub notable_quote_threshold: f32,
    pub max_notable_quotes: usize,
    /// Percent change in numeric guidance that rates a medium key change.
    pub value_change_pct: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertPolicy {
    /// Used when a company has no watch entries. 0 disables alerting.
    pub default_threshold: f32,
    /// |change| / threshold at or above which severity is high.
    pub high_multiplier: f32,
}

/// Optional domain term lexicon nudging the aggregate score. Empty by
/// default so the aggregate equals the pure weighted mean.
#[derive(Debug, Clone, Deserialize)]
pub struct LexiconConfig {
    pub positive_terms: Vec<String>,
    pub negative_terms: Vec<String>,
    pub term_weight: f32,
    pub max_adjustment: f32,
}

impl Default for TrendPolicy {
    fn default() -> Self {
        Self {
            comparison_window: parse_env_or("CALLSIGHT_COMPARISON_WINDOW", 4),
            sentiment_delta: parse_env_or("CALLSIGHT_SENTIMENT_DELTA", 0.1),
            notable_quote_threshold: parse_env_or("CALLSIGHT_NOTABLE_QUOTE_THRESHOLD", 0.3),
            max_notable_quotes: parse_env_or("CALLSIGHT_MAX_NOTABLE_QUOTES", 5),
            value_change_pct: parse_env_or("CALLSIGHT_VALUE_CHANGE_PCT", 10.0),
        }
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            default_threshold: parse_env_or("CALLSIGHT_DEFAULT_ALERT_THRESHOLD", 0.2),
            high_multiplier: parse_env_or("CALLSIGHT_ALERT_HIGH_MULTIPLIER", 1.5),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            cue_phrases: parse_env_list("CALLSIGHT_CUE_PHRASES", DEFAULT_CUE_PHRASES),
            metric_keywords: parse_metric_keywords(),
            min_quote_tokens: parse_env_or("CALLSIGHT_MIN_QUOTE_TOKENS", 8),
            notable_threshold: parse_env_or("CALLSIGHT_NOTABLE_THRESHOLD", 0.3),
            max_quotes: parse_env_or("CALLSIGHT_MAX_QUOTES", 10),
        }
    }
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            positive_terms: parse_env_list("CALLSIGHT_LEXICON_POSITIVE", &[]),
            negative_terms: parse_env_list("CALLSIGHT_LEXICON_NEGATIVE", &[]),
            term_weight: parse_env_or("CALLSIGHT_LEXICON_TERM_WEIGHT", 0.02),
            max_adjustment: parse_env_or("CALLSIGHT_LEXICON_MAX_ADJUSTMENT", 0.3),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scoring: env::var("CALLSIGHT_SCORING_URL").ok().map(|base_url| {
                ScoringConfig {
                    base_url,
                    api_key: env::var("CALLSIGHT_SCORING_API_KEY").ok(),
                    model: env::var("CALLSIGHT_SCORING_MODEL")
                        .unwrap_or_else(|_| "finbert-tone".to_string()),
                    timeout_secs: parse_env_or("CALLSIGHT_SCORING_TIMEOUT", 30),
                    max_retries: parse_env_or("CALLSIGHT_SCORING_MAX_RETRIES", 3),
                    batch_size: parse_env_or("CALLSIGHT_SCORING_BATCH_SIZE", 32),
                }
            }),
            extraction: ExtractionConfig::default(),
            trend: TrendPolicy::default(),
            alerts: AlertPolicy::default(),
            lexicon: LexiconConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
