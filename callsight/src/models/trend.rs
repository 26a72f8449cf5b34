use serde::{Deserialize, Serialize};

use super::sentiment::GuidanceMetric;

/// Classification of a company's sentiment trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendCategory {
    Improving,
    Stable,
    Declining,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeMagnitude {
    Low,
    Medium,
    High,
}

/// One notable period-over-period change in guidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyChange {
    pub metric: GuidanceMetric,
    pub description: String,
    pub magnitude: ChangeMagnitude,
}

/// Result of comparing the current `SentimentResult` against a company's
/// history. One per company per analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendResult {
    pub company_id: String,
    pub trend_category: TrendCategory,
    /// Current overall sentiment minus the historical baseline. Unset when
    /// the category is `insufficient_data`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_change: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_change: Option<f32>,
    pub key_changes: Vec<KeyChange>,
    /// Texts of the strongest current-quarter quotes; full quote objects
    /// live on the `SentimentResult`.
    pub notable_quotes: Vec<String>,
    /// Number of prior periods actually used for the baseline.
    pub comparison_window: usize,
}

impl TrendResult {
    pub fn insufficient_data(company_id: &str) -> Self {
        Self {
            company_id: company_id.to_string(),
            trend_category: TrendCategory::InsufficientData,
            sentiment_change: None,
            confidence_change: None,
            key_changes: Vec::new(),
            notable_quotes: Vec::new(),
            comparison_window: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_has_no_change_values() {
        let trend = TrendResult::insufficient_data("acme");
        assert_eq!(trend.trend_category, TrendCategory::InsufficientData);
        assert!(trend.sentiment_change.is_none());
        assert!(trend.confidence_change.is_none());
        assert_eq!(trend.comparison_window, 0);

        let json = serde_json::to_string(&trend).unwrap();
        assert!(!json.contains("sentiment_change"));
    }

    #[test]
    fn change_magnitude_orders_low_to_high() {
        assert!(ChangeMagnitude::Low < ChangeMagnitude::Medium);
        assert!(ChangeMagnitude::Medium < ChangeMagnitude::High);
    }
}
