use tracing::debug;

use crate::config::TrendPolicy;
use crate::error::{CallsightError, Result};
use crate::models::{
    ChangeMagnitude, GuidanceItem, GuidanceMetric, KeyChange, SentimentResult, TrendCategory,
    TrendResult,
};

/// Compares the current quarter's sentiment against a rolling baseline of
/// prior quarters and classifies the direction of travel.
pub struct TrendComparator {
    policy: TrendPolicy,
}

impl TrendComparator {
    pub fn new(policy: &TrendPolicy) -> Self {
        Self {
            policy: policy.clone(),
        }
    }

    /// `history` is ordered most recent first; only the configured
    /// comparison window is consulted.
    pub fn compare(
        &self,
        current: &SentimentResult,
        history: &[SentimentResult],
    ) -> Result<TrendResult> {
        for prior in history {
            if !prior.is_well_formed() {
                return Err(CallsightError::MalformedHistory(format!(
                    "history entry for {} {}Q{} has out-of-range scores",
                    prior.company_id, prior.fiscal_year, prior.fiscal_quarter
                )));
            }
        }

        if history.is_empty() {
            debug!(company_id = %current.company_id, "no history, trend unavailable");
            return Ok(TrendResult::insufficient_data(&current.company_id));
        }
        // A single prior quarter that scored nothing carries no signal.
        if history.len() == 1 && history[0].scored_segments == 0 {
            return Ok(TrendResult::insufficient_data(&current.company_id));
        }

        let window = history.len().min(self.policy.comparison_window);
        let baseline_sentiment =
            mean(history[..window].iter().map(|r| r.overall_sentiment));
        let baseline_confidence =
            mean(history[..window].iter().map(|r| r.management_confidence));

        let sentiment_change = current.overall_sentiment - baseline_sentiment;
        let confidence_change = current.management_confidence - baseline_confidence;

        let trend_category = if sentiment_change > self.policy.sentiment_delta
            && confidence_change >= 0.0
        {
            TrendCategory::Improving
        } else if sentiment_change < -self.policy.sentiment_delta && confidence_change <= 0.0 {
            TrendCategory::Declining
        } else {
            TrendCategory::Stable
        };

        let key_changes = self.diff_guidance(current, &history[0]);

        let notable_quotes: Vec<String> = current
            .key_quotes
            .iter()
            .filter(|q| q.sentiment_score.abs() > self.policy.notable_quote_threshold)
            .take(self.policy.max_notable_quotes)
            .map(|q| q.text.clone())
            .collect();

        debug!(
            company_id = %current.company_id,
            category = ?trend_category,
            sentiment_change,
            confidence_change,
            window,
            "trend computed"
        );

        Ok(TrendResult {
            company_id: current.company_id.clone(),
            trend_category,
            sentiment_change: Some(sentiment_change),
            confidence_change: Some(confidence_change),
            key_changes,
            notable_quotes,
            comparison_window: window,
        })
    }

    /// Per-metric guidance diff against the immediately preceding quarter.
    /// Only the first item for each metric on either side is considered.
    fn diff_guidance(&self, current: &SentimentResult, previous: &SentimentResult) -> Vec<KeyChange> {
        let mut changes = Vec::new();
        let mut seen: Vec<GuidanceMetric> = Vec::new();

        for item in &current.extracted_guidance {
            if seen.contains(&item.metric) {
                continue;
            }
            seen.push(item.metric);

            match first_for_metric(&previous.extracted_guidance, item.metric) {
                None => changes.push(KeyChange {
                    metric: item.metric,
                    description: format!(
                        "new {} guidance: {} ({})",
                        item.metric, item.value, item.timeframe
                    ),
                    magnitude: ChangeMagnitude::High,
                }),
                Some(prior) => {
                    if let Some(change) = self.compare_items(item, prior) {
                        changes.push(change);
                    }
                }
            }
        }

        for prior in &previous.extracted_guidance {
            if seen.contains(&prior.metric) {
                continue;
            }
            seen.push(prior.metric);
            changes.push(KeyChange {
                metric: prior.metric,
                description: format!(
                    "{} guidance withdrawn (was {})",
                    prior.metric, prior.value
                ),
                magnitude: ChangeMagnitude::High,
            });
        }

        changes
    }

    fn compare_items(&self, current: &GuidanceItem, prior: &GuidanceItem) -> Option<KeyChange> {
        if let (Some(cur), Some(prev)) = (current.numeric_value, prior.numeric_value) {
            if prev != 0.0 {
                let pct = (cur - prev) / prev.abs() * 100.0;
                if pct.abs() > self.policy.value_change_pct {
                    return Some(KeyChange {
                        metric: current.metric,
                        description: format!(
                            "{} guidance moved from {} to {} ({pct:+.1}%)",
                            current.metric, prior.value, current.value
                        ),
                        magnitude: ChangeMagnitude::Medium,
                    });
                }
            }
        }

        if current.value != prior.value || current.confidence != prior.confidence {
            return Some(KeyChange {
                metric: current.metric,
                description: format!(
                    "{} guidance revised from {} to {}",
                    current.metric, prior.value, current.value
                ),
                magnitude: ChangeMagnitude::Low,
            });
        }

        None
    }
}

fn first_for_metric(items: &[GuidanceItem], metric: GuidanceMetric) -> Option<&GuidanceItem> {
    items.iter().find(|item| item.metric == metric)
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let mut sum = 0.0f32;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{GuidanceConfidence, Quote, SectionTag, SentimentLabel, SpeakerRole};
    use std::collections::BTreeSet;

    fn comparator() -> TrendComparator {
        TrendComparator::new(&Config::from_env().trend)
    }

    fn result(sentiment: f32, confidence: f32) -> SentimentResult {
        SentimentResult {
            company_id: "acme".to_string(),
            fiscal_year: 2026,
            fiscal_quarter: 2,
            overall_sentiment: sentiment,
            sentiment_label: SentimentLabel::from_score(sentiment),
            management_confidence: confidence,
            guidance_sentiment: 0.0,
            scored_segments: 12,
            polarity_counts: Default::default(),
            confidence_markers: Default::default(),
            key_quotes: Vec::new(),
            extracted_guidance: Vec::new(),
            key_topics: BTreeSet::new(),
            word_count: 900,
        }
    }

    fn guidance(metric: GuidanceMetric, value: &str, numeric: Option<f64>) -> GuidanceItem {
        GuidanceItem {
            metric,
            value: value.to_string(),
            timeframe: "fiscal year 2026".to_string(),
            confidence: GuidanceConfidence::High,
            numeric_value: numeric,
            change_from_previous: None,
        }
    }

    #[test]
    fn empty_history_yields_insufficient_data() {
        let trend = comparator().compare(&result(0.4, 0.3), &[]).unwrap();
        assert_eq!(trend.trend_category, TrendCategory::InsufficientData);
        assert!(trend.sentiment_change.is_none());
        assert_eq!(trend.comparison_window, 0);
    }

    #[test]
    fn lone_unscored_history_entry_yields_insufficient_data() {
        let mut prior = result(0.0, 0.0);
        prior.scored_segments = 0;

        let trend = comparator().compare(&result(0.4, 0.3), &[prior]).unwrap();
        assert_eq!(trend.trend_category, TrendCategory::InsufficientData);
    }

    #[test]
    fn rising_sentiment_with_steady_confidence_is_improving() {
        let history = vec![result(0.10, 0.2)];
        let trend = comparator().compare(&result(0.45, 0.2), &history).unwrap();

        assert_eq!(trend.trend_category, TrendCategory::Improving);
        let change = trend.sentiment_change.unwrap();
        assert!((change - 0.35).abs() < 1e-6);
        assert_eq!(trend.comparison_window, 1);
    }

    #[test]
    fn falling_sentiment_and_confidence_is_declining() {
        let history = vec![result(0.05, 0.3), result(-0.05, 0.3)];
        let trend = comparator().compare(&result(-0.30, 0.1), &history).unwrap();

        assert_eq!(trend.trend_category, TrendCategory::Declining);
        let change = trend.sentiment_change.unwrap();
        assert!((change + 0.30).abs() < 1e-6);
    }

    #[test]
    fn diverging_signals_are_stable() {
        // Sentiment up past the delta but confidence moving down.
        let history = vec![result(0.0, 0.5)];
        let trend = comparator().compare(&result(0.3, 0.2), &history).unwrap();
        assert_eq!(trend.trend_category, TrendCategory::Stable);
    }

    #[test]
    fn baseline_uses_at_most_the_comparison_window() {
        // Window is 4; the fifth entry would drag the mean down if counted.
        let history = vec![
            result(0.2, 0.2),
            result(0.2, 0.2),
            result(0.2, 0.2),
            result(0.2, 0.2),
            result(-1.0, -1.0),
        ];
        let trend = comparator().compare(&result(0.2, 0.2), &history).unwrap();

        assert_eq!(trend.comparison_window, 4);
        assert!(trend.sentiment_change.unwrap().abs() < 1e-6);
        assert_eq!(trend.trend_category, TrendCategory::Stable);
    }

    #[test]
    fn malformed_history_is_rejected() {
        let mut bad = result(0.2, 0.2);
        bad.overall_sentiment = 3.5;

        let err = comparator()
            .compare(&result(0.1, 0.1), &[bad])
            .unwrap_err();
        assert!(matches!(err, CallsightError::MalformedHistory(_)));
    }

    #[test]
    fn new_guidance_metric_is_a_high_magnitude_change() {
        let mut current = result(0.2, 0.2);
        current.extracted_guidance =
            vec![guidance(GuidanceMetric::Revenue, "$150 million", Some(150e6))];
        let history = vec![result(0.2, 0.2)];

        let trend = comparator().compare(&current, &history).unwrap();
        assert_eq!(trend.key_changes.len(), 1);
        assert_eq!(trend.key_changes[0].magnitude, ChangeMagnitude::High);
        assert!(trend.key_changes[0].description.contains("new revenue guidance"));
    }

    #[test]
    fn withdrawn_guidance_metric_is_a_high_magnitude_change() {
        let current = result(0.2, 0.2);
        let mut prior = result(0.2, 0.2);
        prior.extracted_guidance =
            vec![guidance(GuidanceMetric::Earnings, "$2.10", Some(2.10))];

        let trend = comparator().compare(&current, &[prior]).unwrap();
        assert_eq!(trend.key_changes.len(), 1);
        assert_eq!(trend.key_changes[0].magnitude, ChangeMagnitude::High);
        assert!(trend.key_changes[0].description.contains("withdrawn"));
    }

    #[test]
    fn large_numeric_move_is_medium_magnitude() {
        let mut current = result(0.2, 0.2);
        current.extracted_guidance =
            vec![guidance(GuidanceMetric::Revenue, "$115 million", Some(115e6))];
        let mut prior = result(0.2, 0.2);
        prior.extracted_guidance =
            vec![guidance(GuidanceMetric::Revenue, "$100 million", Some(100e6))];

        let trend = comparator().compare(&current, &[prior]).unwrap();
        assert_eq!(trend.key_changes.len(), 1);
        assert_eq!(trend.key_changes[0].magnitude, ChangeMagnitude::Medium);
        assert!(trend.key_changes[0].description.contains("+15.0%"));
    }

    #[test]
    fn small_numeric_move_within_tolerance_is_ignored() {
        let mut current = result(0.2, 0.2);
        current.extracted_guidance =
            vec![guidance(GuidanceMetric::Revenue, "$105 million", Some(105e6))];
        let mut prior = result(0.2, 0.2);
        prior.extracted_guidance =
            vec![guidance(GuidanceMetric::Revenue, "$100 million", Some(100e6))];

        let trend = comparator().compare(&current, &[prior]).unwrap();
        // 5% move is under the 10% bar, but the value text differs.
        assert_eq!(trend.key_changes.len(), 1);
        assert_eq!(trend.key_changes[0].magnitude, ChangeMagnitude::Low);
    }

    #[test]
    fn identical_guidance_produces_no_changes() {
        let mut current = result(0.2, 0.2);
        current.extracted_guidance =
            vec![guidance(GuidanceMetric::Revenue, "$100 million", Some(100e6))];
        let mut prior = result(0.2, 0.2);
        prior.extracted_guidance =
            vec![guidance(GuidanceMetric::Revenue, "$100 million", Some(100e6))];

        let trend = comparator().compare(&current, &[prior]).unwrap();
        assert!(trend.key_changes.is_empty());
    }

    #[test]
    fn notable_quotes_filtered_and_capped() {
        let mut current = result(0.2, 0.2);
        current.key_quotes = (0..8)
            .map(|i| Quote {
                text: format!("quote {i}"),
                speaker_role: SpeakerRole::Management,
                section: SectionTag::Financial,
                sentiment_score: if i < 7 { 0.6 } else { 0.1 },
                topic: None,
            })
            .collect();

        let trend = comparator().compare(&current, &[result(0.2, 0.2)]).unwrap();
        assert_eq!(trend.notable_quotes.len(), 5);
        assert_eq!(trend.notable_quotes[0], "quote 0");
    }
}
