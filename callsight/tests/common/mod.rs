#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use callsight::error::Result;
use callsight::models::{
    SentimentLabel, SentimentResult, Transcript, WatchThreshold,
};
use callsight::scoring::{SegmentScore, SentimentOracle};

/// Oracle returning a fixed score for every segment.
pub struct FlatOracle {
    pub polarity: f32,
    pub confidence: f32,
}

#[async_trait]
impl SentimentOracle for FlatOracle {
    async fn score_batch(&self, texts: &[&str]) -> Result<Vec<SegmentScore>> {
        Ok(texts
            .iter()
            .map(|_| SegmentScore {
                polarity: self.polarity,
                confidence: self.confidence,
            })
            .collect())
    }
}

pub fn flat_oracle(polarity: f32, confidence: f32) -> Arc<dyn SentimentOracle> {
    Arc::new(FlatOracle {
        polarity,
        confidence,
    })
}

pub fn transcript(company_id: &str, quarter: u8, raw_text: &str) -> Transcript {
    Transcript {
        company_id: company_id.to_string(),
        ticker: None,
        fiscal_year: 2026,
        fiscal_quarter: quarter,
        call_date: Utc.with_ymd_and_hms(2026, 5, 7, 21, 0, 0).unwrap(),
        raw_text: raw_text.to_string(),
        management_roster: vec!["Jane Doe".to_string(), "John Smith".to_string()],
    }
}

pub fn prior_result(company_id: &str, sentiment: f32, confidence: f32) -> SentimentResult {
    SentimentResult {
        company_id: company_id.to_string(),
        fiscal_year: 2026,
        fiscal_quarter: 1,
        overall_sentiment: sentiment,
        sentiment_label: SentimentLabel::from_score(sentiment),
        management_confidence: confidence,
        guidance_sentiment: 0.0,
        scored_segments: 10,
        polarity_counts: Default::default(),
        confidence_markers: Default::default(),
        key_quotes: Vec::new(),
        extracted_guidance: Vec::new(),
        key_topics: BTreeSet::new(),
        word_count: 800,
    }
}

pub fn watch(user_id: &str, threshold: f32) -> WatchThreshold {
    WatchThreshold {
        user_id: Some(user_id.to_string()),
        alert_threshold: threshold,
    }
}
