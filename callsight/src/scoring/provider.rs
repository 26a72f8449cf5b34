use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::error::{CallsightError, Result};
use crate::scoring::api::ScoringApiClient;

/// Polarity/confidence pair returned by the scoring oracle for one text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentScore {
    /// Polarity in [-1, 1].
    pub polarity: f32,
    /// Model confidence in [0, 1].
    pub confidence: f32,
}

/// Capability contract for the external financial-text sentiment model.
/// The engine treats the model as a black box; tests substitute a mock.
#[async_trait]
pub trait SentimentOracle: Send + Sync {
    /// Score a batch of texts, returning one score per input in order.
    async fn score_batch(&self, texts: &[&str]) -> Result<Vec<SegmentScore>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoringBackend {
    Api,
    Unavailable { reason: String },
}

/// Facade over the configured scoring backend. Unconfigured deployments get
/// an `Unavailable` backend that surfaces `ScoringUnavailable` on use.
#[derive(Debug, Clone)]
pub struct ScoringProvider {
    backend: ScoringBackend,
    config: Option<Arc<ScoringConfig>>,
}

impl ScoringProvider {
    pub fn new(config: Option<&ScoringConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable("No scoring configuration provided");
        };

        Self {
            backend: ScoringBackend::Api,
            config: Some(Arc::new(config.clone())),
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: ScoringBackend::Unavailable {
                reason: reason.to_string(),
            },
            config: None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, ScoringBackend::Unavailable { .. })
    }

    pub fn backend(&self) -> &ScoringBackend {
        &self.backend
    }

    fn unavailable_reason(&self) -> String {
        match &self.backend {
            ScoringBackend::Unavailable { reason } => reason.clone(),
            _ => "Scoring backend not configured".to_string(),
        }
    }
}

#[async_trait]
impl SentimentOracle for ScoringProvider {
    async fn score_batch(&self, texts: &[&str]) -> Result<Vec<SegmentScore>> {
        if !self.is_available() {
            return Err(CallsightError::ScoringUnavailable(self.unavailable_reason()));
        }

        let config = self.config.as_deref().ok_or_else(|| {
            CallsightError::ScoringUnavailable("No scoring config available".to_string())
        })?;

        let client = ScoringApiClient::new(config)?;
        client.score(texts).await
    }
}
