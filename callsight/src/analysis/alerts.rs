use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::AlertPolicy;
use crate::models::{
    AlertRecord, AlertSeverity, AlertType, ChangeMagnitude, TrendCategory, TrendResult,
    WatchThreshold,
};

/// Turns a computed trend into alert records for the users watching the
/// company. With no watchers, a single anonymous watch at the default
/// threshold still produces company-level alerts.
pub struct AlertGenerator {
    policy: AlertPolicy,
}

impl AlertGenerator {
    pub fn new(policy: &AlertPolicy) -> Self {
        Self {
            policy: policy.clone(),
        }
    }

    pub fn generate(&self, trend: &TrendResult, watches: &[WatchThreshold]) -> Vec<AlertRecord> {
        if trend.trend_category == TrendCategory::InsufficientData {
            debug!(company_id = %trend.company_id, "insufficient data, no alerts");
            return Vec::new();
        }

        let mut alerts = Vec::new();

        let anonymous;
        let effective: &[WatchThreshold] = if watches.is_empty() {
            anonymous = [WatchThreshold {
                user_id: None,
                alert_threshold: self.policy.default_threshold,
            }];
            &anonymous
        } else {
            watches
        };

        for watch in effective {
            let threshold = watch.alert_threshold;
            if !(0.0..=1.0).contains(&threshold) {
                warn!(
                    company_id = %trend.company_id,
                    user_id = ?watch.user_id,
                    threshold,
                    "ignoring watch with out-of-range threshold"
                );
                continue;
            }
            // Zero disables alerting for the watch.
            if threshold == 0.0 {
                continue;
            }

            if let Some(change) = trend.sentiment_change {
                if change.abs() >= threshold {
                    alerts.push(self.shift_alert(
                        trend,
                        watch,
                        AlertType::SentimentShift,
                        "sentiment",
                        change,
                        threshold,
                    ));
                }
            }
            if let Some(change) = trend.confidence_change {
                if change.abs() >= threshold {
                    alerts.push(self.shift_alert(
                        trend,
                        watch,
                        AlertType::ConfidenceShift,
                        "management confidence",
                        change,
                        threshold,
                    ));
                }
            }
        }

        // Guidance alerts are company-level: one record at most, issued
        // whenever a high-magnitude change exists, independent of watch
        // thresholds.
        if let Some(change) = trend
            .key_changes
            .iter()
            .find(|c| c.magnitude == ChangeMagnitude::High)
        {
            alerts.push(AlertRecord {
                company_id: trend.company_id.clone(),
                user_id: None,
                alert_type: AlertType::GuidanceChange,
                severity: AlertSeverity::High,
                message: format!("Guidance change for {}: {}", trend.company_id, change.description),
                data: json!({
                    "metric": change.metric.to_string(),
                    "description": change.description,
                    "magnitude": change.magnitude,
                    "trend_category": trend.trend_category,
                }),
                resolved: false,
                created_at: Utc::now(),
            });
        }

        debug!(company_id = %trend.company_id, count = alerts.len(), "alerts generated");
        alerts
    }

    fn shift_alert(
        &self,
        trend: &TrendResult,
        watch: &WatchThreshold,
        alert_type: AlertType,
        what: &str,
        change: f32,
        threshold: f32,
    ) -> AlertRecord {
        let severity = if change.abs() >= threshold * self.policy.high_multiplier {
            AlertSeverity::High
        } else {
            AlertSeverity::Medium
        };
        let direction = if change > 0.0 { "improved" } else { "declined" };

        AlertRecord {
            company_id: trend.company_id.clone(),
            user_id: watch.user_id.clone(),
            alert_type,
            severity,
            message: format!(
                "{} for {} {} by {:.2} against the recent baseline",
                capitalize(what),
                trend.company_id,
                direction,
                change.abs()
            ),
            data: json!({
                "change": change,
                "threshold": threshold,
                "trend_category": trend.trend_category,
                "comparison_window": trend.comparison_window,
            }),
            resolved: false,
            created_at: Utc::now(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
