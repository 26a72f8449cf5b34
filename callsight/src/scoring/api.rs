use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::error::{CallsightError, Result};
use crate::scoring::provider::SegmentScore;

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    data: Vec<ScoreData>,
}

#[derive(Debug, Deserialize)]
struct ScoreData {
    polarity: f32,
    confidence: f32,
}

/// HTTP client for a `POST {base_url}/score` inference endpoint.
#[derive(Clone)]
pub struct ScoringApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_retries: u32,
}

impl ScoringApiClient {
    pub fn new(config: &ScoringConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CallsightError::Scoring(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    /// Score a batch of texts. The response carries one entry per input in
    /// order, preserving per-segment attribution for extraction.
    pub async fn score(&self, texts: &[&str]) -> Result<Vec<SegmentScore>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = ScoreRequest {
            model: &self.model,
            input: texts.to_vec(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(ref api_key) = self.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {api_key}"))
                    .map_err(|e| CallsightError::Scoring(format!("Invalid API key header: {e}")))?,
            );
        }

        let url = format!("{}/score", self.base_url);

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(100 * 2_u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .headers(headers.clone())
                .json(&request)
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        let body: ScoreResponse = resp.json().await.map_err(|e| {
                            CallsightError::Scoring(format!("Failed to parse response: {e}"))
                        })?;
                        return Self::validate(texts.len(), body);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse().ok());
                        last_error = Some(CallsightError::ApiRateLimit { retry_after });
                        continue;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED
                        || status == reqwest::StatusCode::FORBIDDEN
                    {
                        let body = resp.text().await.unwrap_or_default();
                        return Err(CallsightError::ApiAuth(body));
                    }

                    if status.is_server_error() {
                        let body = resp.text().await.unwrap_or_default();
                        last_error = Some(CallsightError::ScoringUnavailable(format!(
                            "Server error {status}: {body}"
                        )));
                        continue;
                    }

                    let body = resp.text().await.unwrap_or_default();
                    return Err(CallsightError::Scoring(format!("API error {status}: {body}")));
                }
                Err(e) => {
                    last_error = Some(CallsightError::ScoringUnavailable(format!(
                        "Request failed: {e}"
                    )));
                    continue;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| CallsightError::ScoringUnavailable("Unknown error".to_string())))
    }

    fn validate(expected: usize, body: ScoreResponse) -> Result<Vec<SegmentScore>> {
        if body.data.len() != expected {
            return Err(CallsightError::Scoring(format!(
                "Expected {expected} scores, got {}",
                body.data.len()
            )));
        }

        body.data
            .into_iter()
            .map(|entry| {
                if !entry.polarity.is_finite() || !entry.confidence.is_finite() {
                    return Err(CallsightError::Scoring(
                        "Non-finite score in response".to_string(),
                    ));
                }
                Ok(SegmentScore {
                    polarity: entry.polarity.clamp(-1.0, 1.0),
                    confidence: entry.confidence.clamp(0.0, 1.0),
                })
            })
            .collect()
    }
}
