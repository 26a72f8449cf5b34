use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    SentimentShift,
    ConfidenceShift,
    GuidanceChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

/// An alert raised for a material shift. The engine only creates these;
/// resolution is an external state transition and deduplication against
/// previously emitted alerts is the caller's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub company_id: String,
    /// Watch owner the alert was raised for. Company-level guidance alerts
    /// carry no user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    /// Snapshot of the values that triggered the alert.
    pub data: Value,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

/// Per (user, company) alert sensitivity. A threshold of 0 disables alerting
/// for that pair; entries outside [0, 1] are skipped with a warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchThreshold {
    /// None for the synthetic company-level watch used when nobody is
    /// watching a company.
    #[serde(default)]
    pub user_id: Option<String>,
    pub alert_threshold: f32,
}
