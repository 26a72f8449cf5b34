use std::sync::Arc;

use futures::future::try_join_all;

use crate::analysis::contains_cue_phrase;
use crate::config::{ExtractionConfig, LexiconConfig, ScoringConfig};
use crate::error::Result;
use crate::models::{ConfidenceMarkers, PolarityCounts, SectionTag, Segment, SpeakerRole};
use crate::scoring::{SegmentScore, SentimentOracle};

/// Phrases signalling management confidence. Counted per segment to sign
/// the oracle's confidence scalar, and document-wide for reporting.
const POSITIVE_CONFIDENCE_MARKERS: &[&str] = &[
    "strong momentum",
    "ahead of schedule",
    "exceeded expectations",
    "exceeding expectations",
    "confident in our ability",
    "on track",
    "well positioned",
    "well-positioned",
    "significant progress",
    "pleased with",
    "robust demand",
    "positive momentum",
    "breakthrough",
    "accelerating growth",
    "outperform",
];

const NEGATIVE_CONFIDENCE_MARKERS: &[&str] = &[
    "challenging environment",
    "below expectations",
    "uncertain",
    "delayed",
    "setback",
    "concerns about",
    "difficult quarter",
    "headwind",
    "disappointing",
    "slower than expected",
    "competitive pressure",
    "supply chain issues",
    "regulatory challenges",
    "going concern",
];

const NEUTRAL_CONFIDENCE_MARKERS: &[&str] = &[
    "in line with",
    "as expected",
    "maintain",
    "steady",
    "consistent with",
    "on plan",
    "unchanged",
];

/// A normalized segment paired with its oracle score.
#[derive(Debug, Clone)]
pub struct ScoredSegment {
    pub segment: Segment,
    pub score: SegmentScore,
}

/// Document-level aggregates computed from scored segments.
#[derive(Debug, Clone, Copy)]
pub struct AggregateScores {
    pub overall_sentiment: f32,
    pub management_confidence: f32,
    pub guidance_sentiment: f32,
    pub scored_segments: usize,
    pub polarity_counts: PolarityCounts,
    pub confidence_markers: ConfidenceMarkers,
}

/// Scores segments through the external oracle and aggregates them to
/// document-level sentiment and confidence.
pub struct SentimentScorer {
    oracle: Arc<dyn SentimentOracle>,
    batch_size: usize,
    cue_phrases: Vec<String>,
    lexicon: LexiconConfig,
}

impl SentimentScorer {
    pub fn new(
        oracle: Arc<dyn SentimentOracle>,
        scoring: Option<&ScoringConfig>,
        extraction: &ExtractionConfig,
        lexicon: &LexiconConfig,
    ) -> Self {
        Self {
            oracle,
            batch_size: scoring.map(|c| c.batch_size).unwrap_or(32).max(1),
            cue_phrases: extraction.cue_phrases.clone(),
            lexicon: lexicon.clone(),
        }
    }

    /// Score all segments, batching oracle calls while preserving
    /// per-segment attribution and order.
    pub async fn score_segments(&self, segments: &[Segment]) -> Result<Vec<ScoredSegment>> {
        if segments.is_empty() {
            return Ok(Vec::new());
        }

        let batches = segments.chunks(self.batch_size).map(|batch| {
            let texts: Vec<&str> = batch.iter().map(|s| s.text.as_str()).collect();
            async move { self.oracle.score_batch(&texts).await }
        });

        let scores: Vec<SegmentScore> = try_join_all(batches)
            .await?
            .into_iter()
            .flatten()
            .collect();

        Ok(segments
            .iter()
            .cloned()
            .zip(scores)
            .map(|(segment, score)| ScoredSegment { segment, score })
            .collect())
    }

    /// Aggregate per-segment scores. Management segments drive the overall
    /// score; analyst questions are retained for context only.
    pub fn aggregate(&self, cleaned_text: &str, scored: &[ScoredSegment]) -> AggregateScores {
        let management: Vec<&ScoredSegment> = scored
            .iter()
            .filter(|s| s.segment.role == SpeakerRole::Management)
            .collect();

        let total_weight: f32 = management
            .iter()
            .map(|s| s.segment.token_count as f32)
            .sum();

        let (overall_sentiment, management_confidence) = if management.is_empty()
            || total_weight == 0.0
        {
            (0.0, 0.0)
        } else {
            let sentiment: f32 = management
                .iter()
                .map(|s| s.score.polarity * s.segment.token_count as f32)
                .sum::<f32>()
                / total_weight;

            let confidence: f32 = management
                .iter()
                .map(|s| {
                    let sign = segment_confidence_sign(&s.segment.text, s.score.polarity);
                    s.score.confidence * sign * s.segment.token_count as f32
                })
                .sum::<f32>()
                / total_weight;

            (sentiment, confidence)
        };

        let overall_sentiment =
            (overall_sentiment + self.lexicon_adjustment(cleaned_text)).clamp(-1.0, 1.0);

        let guidance: Vec<f32> = scored
            .iter()
            .filter(|s| {
                matches!(
                    s.segment.section,
                    SectionTag::Financial | SectionTag::Product
                ) && contains_cue_phrase(&s.segment.text, &self.cue_phrases)
            })
            .map(|s| s.score.polarity)
            .collect();
        let guidance_sentiment = if guidance.is_empty() {
            0.0
        } else {
            guidance.iter().sum::<f32>() / guidance.len() as f32
        };

        let mut polarity_counts = PolarityCounts::default();
        for s in scored {
            if s.score.polarity > 0.1 {
                polarity_counts.positive += 1;
            } else if s.score.polarity < -0.1 {
                polarity_counts.negative += 1;
            } else {
                polarity_counts.neutral += 1;
            }
        }

        AggregateScores {
            overall_sentiment,
            management_confidence: management_confidence.clamp(-1.0, 1.0),
            guidance_sentiment,
            scored_segments: management.len(),
            polarity_counts,
            confidence_markers: count_markers(cleaned_text),
        }
    }

    /// Net count of configured domain terms, scaled and clamped. Zero with
    /// the default empty lexicon.
    fn lexicon_adjustment(&self, text: &str) -> f32 {
        if self.lexicon.positive_terms.is_empty() && self.lexicon.negative_terms.is_empty() {
            return 0.0;
        }

        let lower = text.to_lowercase();
        let count_terms = |terms: &[String]| -> i64 {
            terms
                .iter()
                .map(|term| lower.matches(term.as_str()).count() as i64)
                .sum()
        };

        let net = count_terms(&self.lexicon.positive_terms) - count_terms(&self.lexicon.negative_terms);
        (net as f32 * self.lexicon.term_weight)
            .clamp(-self.lexicon.max_adjustment, self.lexicon.max_adjustment)
    }
}

/// Sign for a segment's confidence contribution: dominant marker polarity
/// wins, falling back to the sign of the oracle polarity.
fn segment_confidence_sign(text: &str, polarity: f32) -> f32 {
    let lower = text.to_lowercase();
    let count = |markers: &[&str]| markers.iter().filter(|m| lower.contains(*m)).count();

    let positive = count(POSITIVE_CONFIDENCE_MARKERS);
    let negative = count(NEGATIVE_CONFIDENCE_MARKERS);

    if positive > negative {
        1.0
    } else if negative > positive {
        -1.0
    } else if polarity > 0.0 {
        1.0
    } else if polarity < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn count_markers(text: &str) -> ConfidenceMarkers {
    let lower = text.to_lowercase();
    let count = |markers: &[&str]| -> usize {
        markers
            .iter()
            .map(|m| lower.matches(*m).count())
            .sum()
    };

    ConfidenceMarkers {
        positive: count(POSITIVE_CONFIDENCE_MARKERS),
        negative: count(NEGATIVE_CONFIDENCE_MARKERS),
        neutral: count(NEUTRAL_CONFIDENCE_MARKERS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::config::Config;
    use crate::error::CallsightError;

    /// Oracle returning a fixed score per call, in input order.
    struct ScriptedOracle {
        scores: Vec<SegmentScore>,
    }

    #[async_trait]
    impl SentimentOracle for ScriptedOracle {
        async fn score_batch(&self, texts: &[&str]) -> crate::error::Result<Vec<SegmentScore>> {
            if texts.len() > self.scores.len() {
                return Err(CallsightError::Scoring("not enough scripted scores".into()));
            }
            Ok(self.scores[..texts.len()].to_vec())
        }
    }

    fn segment(index: usize, text: &str, role: SpeakerRole, section: SectionTag) -> Segment {
        Segment {
            index,
            text: text.to_string(),
            speaker: None,
            role,
            section,
            token_count: text.split_whitespace().count(),
        }
    }

    fn scorer_with(scores: Vec<SegmentScore>) -> SentimentScorer {
        let config = Config {
            scoring: None,
            ..Config::from_env()
        };
        SentimentScorer::new(
            Arc::new(ScriptedOracle { scores }),
            None,
            &config.extraction,
            &config.lexicon,
        )
    }

    fn scored(segment: Segment, polarity: f32, confidence: f32) -> ScoredSegment {
        ScoredSegment {
            segment,
            score: SegmentScore {
                polarity,
                confidence,
            },
        }
    }

    #[tokio::test]
    async fn score_segments_preserves_order_and_attribution() {
        let scorer = scorer_with(vec![
            SegmentScore {
                polarity: 0.5,
                confidence: 0.9,
            },
            SegmentScore {
                polarity: -0.2,
                confidence: 0.8,
            },
        ]);

        let segments = vec![
            segment(0, "first text", SpeakerRole::Management, SectionTag::General),
            segment(1, "second text", SpeakerRole::Analyst, SectionTag::General),
        ];

        let scored = scorer.score_segments(&segments).await.unwrap();
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].segment.text, "first text");
        assert_eq!(scored[0].score.polarity, 0.5);
        assert_eq!(scored[1].score.polarity, -0.2);
    }

    #[test]
    fn zero_management_segments_report_zero_scores() {
        let scorer = scorer_with(Vec::new());
        let scored = vec![scored(
            segment(0, "analyst question about revenue", SpeakerRole::Analyst, SectionTag::Financial),
            0.8,
            0.9,
        )];

        let aggregates = scorer.aggregate("analyst question about revenue", &scored);
        assert_eq!(aggregates.overall_sentiment, 0.0);
        assert_eq!(aggregates.management_confidence, 0.0);
        assert_eq!(aggregates.scored_segments, 0);
    }

    #[test]
    fn overall_sentiment_is_length_weighted_over_management() {
        let scorer = scorer_with(Vec::new());
        // 7-token segment at 0.6, 2-token segment at -0.2, analyst ignored.
        let scored = vec![
            scored(
                segment(0, "we are pleased with results this quarter", SpeakerRole::Management, SectionTag::General),
                0.6,
                0.9,
            ),
            scored(
                segment(1, "tough comps", SpeakerRole::Management, SectionTag::General),
                -0.2,
                0.9,
            ),
            scored(
                segment(2, "what about churn", SpeakerRole::Analyst, SectionTag::General),
                -1.0,
                1.0,
            ),
        ];

        let aggregates = scorer.aggregate("", &scored);
        // (0.6*7 + -0.2*2) / 9
        let expected = (0.6 * 7.0 - 0.2 * 2.0) / 9.0;
        assert!((aggregates.overall_sentiment - expected).abs() < 1e-6);
        assert_eq!(aggregates.scored_segments, 2);
    }

    #[test]
    fn guidance_sentiment_restricted_to_forward_looking_sections() {
        let scorer = scorer_with(Vec::new());
        let scored = vec![
            scored(
                segment(0, "we expect revenue to grow next year", SpeakerRole::Management, SectionTag::Financial),
                0.4,
                0.9,
            ),
            scored(
                segment(1, "revenue was flat last quarter", SpeakerRole::Management, SectionTag::Financial),
                -0.4,
                0.9,
            ),
            scored(
                segment(2, "we expect to hire more staff", SpeakerRole::Management, SectionTag::General),
                0.9,
                0.9,
            ),
        ];

        let aggregates = scorer.aggregate("", &scored);
        // Only segment 0 qualifies: financial section plus cue phrase.
        assert!((aggregates.guidance_sentiment - 0.4).abs() < 1e-6);
    }

    #[test]
    fn negative_markers_flip_confidence_sign() {
        let scorer = scorer_with(Vec::new());
        let text = "we see a challenging environment and competitive pressure ahead for us";
        let scored = vec![scored(
            segment(0, text, SpeakerRole::Management, SectionTag::General),
            0.1,
            0.8,
        )];

        let aggregates = scorer.aggregate(text, &scored);
        assert!(aggregates.management_confidence < 0.0);
        assert_eq!(aggregates.confidence_markers.negative, 2);
    }

    #[test]
    fn polarity_counts_use_label_bands() {
        let scorer = scorer_with(Vec::new());
        let scored = vec![
            scored(segment(0, "a", SpeakerRole::Unknown, SectionTag::General), 0.5, 0.9),
            scored(segment(1, "b", SpeakerRole::Unknown, SectionTag::General), 0.05, 0.9),
            scored(segment(2, "c", SpeakerRole::Unknown, SectionTag::General), -0.5, 0.9),
        ];

        let counts = scorer.aggregate("", &scored).polarity_counts;
        assert_eq!(counts.positive, 1);
        assert_eq!(counts.neutral, 1);
        assert_eq!(counts.negative, 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn lexicon_adjustment_is_zero_by_default() {
        let scorer = scorer_with(Vec::new());
        assert_eq!(scorer.lexicon_adjustment("breakthrough results everywhere"), 0.0);
    }

    #[test]
    fn lexicon_adjustment_clamps_to_max() {
        let config = Config {
            scoring: None,
            ..Config::from_env()
        };
        let lexicon = LexiconConfig {
            positive_terms: vec!["breakthrough".to_string()],
            negative_terms: vec!["setback".to_string()],
            term_weight: 0.2,
            max_adjustment: 0.3,
        };
        let scorer = SentimentScorer::new(
            Arc::new(ScriptedOracle { scores: Vec::new() }),
            None,
            &config.extraction,
            &lexicon,
        );

        let text = "breakthrough breakthrough breakthrough breakthrough";
        assert_eq!(scorer.lexicon_adjustment(text), 0.3);
        assert_eq!(scorer.lexicon_adjustment("setback setback setback"), -0.3);
    }
}
