use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::{
    AlertGenerator, ExtractionEngine, SentimentScorer, TrendComparator,
};
use crate::config::Config;
use crate::error::{CallsightError, Result};
use crate::models::{
    AlertRecord, SentimentLabel, SentimentResult, Transcript, TrendResult, WatchThreshold,
};
use crate::processing::TextNormalizer;
use crate::scoring::SentimentOracle;

/// Everything one analysis run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sentiment: SentimentResult,
    pub trend: TrendResult,
    pub alerts: Vec<AlertRecord>,
}

/// Runs the full pipeline for one transcript: normalize, score, extract,
/// compare against history, and raise alerts.
pub struct AnalysisEngine {
    normalizer: TextNormalizer,
    scorer: SentimentScorer,
    extractor: ExtractionEngine,
    comparator: TrendComparator,
    alerts: AlertGenerator,
}

impl AnalysisEngine {
    pub fn new(config: &Config, oracle: Arc<dyn SentimentOracle>) -> Result<Self> {
        Ok(Self {
            normalizer: TextNormalizer::new()?,
            scorer: SentimentScorer::new(
                oracle,
                config.scoring.as_ref(),
                &config.extraction,
                &config.lexicon,
            ),
            extractor: ExtractionEngine::new(&config.extraction)?,
            comparator: TrendComparator::new(&config.trend),
            alerts: AlertGenerator::new(&config.alerts),
        })
    }

    /// `history` must be ordered most recent first. Scoring is
    /// all-or-nothing: an unavailable oracle fails the run rather than
    /// producing a partial result.
    pub async fn analyze(
        &self,
        transcript: &Transcript,
        history: &[SentimentResult],
        watches: &[WatchThreshold],
    ) -> Result<AnalysisResult> {
        validate(transcript)?;

        info!(
            company_id = %transcript.company_id,
            fiscal_year = transcript.fiscal_year,
            fiscal_quarter = transcript.fiscal_quarter,
            "analyzing transcript"
        );

        let normalized = self.normalizer.normalize(transcript);

        let sentiment = if normalized.is_empty() {
            warn!(
                company_id = %transcript.company_id,
                "transcript normalized to nothing, recording an empty result"
            );
            empty_result(transcript)
        } else {
            let scored = self.scorer.score_segments(&normalized.segments).await?;
            let aggregates = self.scorer.aggregate(&normalized.cleaned_text, &scored);

            let key_quotes = self.extractor.extract_quotes(&scored);
            let extracted_guidance = self.extractor.extract_guidance(&scored, history.first());
            let key_topics = self.extractor.extract_topics(&scored);

            SentimentResult {
                company_id: transcript.company_id.clone(),
                fiscal_year: transcript.fiscal_year,
                fiscal_quarter: transcript.fiscal_quarter,
                overall_sentiment: aggregates.overall_sentiment,
                sentiment_label: SentimentLabel::from_score(aggregates.overall_sentiment),
                management_confidence: aggregates.management_confidence,
                guidance_sentiment: aggregates.guidance_sentiment,
                scored_segments: aggregates.scored_segments,
                polarity_counts: aggregates.polarity_counts,
                confidence_markers: aggregates.confidence_markers,
                key_quotes,
                extracted_guidance,
                key_topics,
                word_count: normalized.word_count,
            }
        };

        let trend = self.comparator.compare(&sentiment, history)?;
        let alerts = self.alerts.generate(&trend, watches);

        info!(
            company_id = %sentiment.company_id,
            overall_sentiment = sentiment.overall_sentiment,
            trend = ?trend.trend_category,
            alerts = alerts.len(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            sentiment,
            trend,
            alerts,
        })
    }
}

fn validate(transcript: &Transcript) -> Result<()> {
    if transcript.company_id.trim().is_empty() {
        return Err(CallsightError::Validation(
            "transcript has no company id".to_string(),
        ));
    }
    if !(1..=4).contains(&transcript.fiscal_quarter) {
        return Err(CallsightError::Validation(format!(
            "fiscal quarter must be 1-4, got {}",
            transcript.fiscal_quarter
        )));
    }
    Ok(())
}

/// Zero-valued result for a transcript with no usable text. Recorded so the
/// quarter still appears in history.
fn empty_result(transcript: &Transcript) -> SentimentResult {
    SentimentResult {
        company_id: transcript.company_id.clone(),
        fiscal_year: transcript.fiscal_year,
        fiscal_quarter: transcript.fiscal_quarter,
        overall_sentiment: 0.0,
        sentiment_label: SentimentLabel::Neutral,
        management_confidence: 0.0,
        guidance_sentiment: 0.0,
        scored_segments: 0,
        polarity_counts: Default::default(),
        confidence_markers: Default::default(),
        key_quotes: Vec::new(),
        extracted_guidance: Vec::new(),
        key_topics: Default::default(),
        word_count: 0,
    }
}
