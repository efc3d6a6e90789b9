//! Batch evaluation pipeline
//!
//! Scores every labeled record exactly once, transposes labels and
//! predictions into per-dimension sequences and runs the aggregator over
//! them. Any scorer failure aborts the whole batch; metrics are never
//! computed over a partial result set.

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::aggregate::{evaluate_dimensions, ExampleAgreement, ScoresByDimension};
use crate::dataset::LabeledRecord;
use crate::dimension::DimensionSet;
use crate::error::{EvalError, Result};
use crate::report::EvaluationReport;
use crate::scorer::{ScoredTranscript, Scorer};

/// Default number of records between progress log lines
pub const DEFAULT_PROGRESS_EVERY: usize = 10;

/// Labels and predictions for a fully scored dataset
#[derive(Debug, Clone)]
pub struct ScoredBatch {
    pub n_samples: usize,
    /// Ground-truth scores per dimension, indexed by record
    pub ground_truth: ScoresByDimension,
    /// Predicted scores per dimension, aligned with `ground_truth`
    pub predicted: ScoresByDimension,
    pub examples: Vec<ExampleAgreement>,
    pub model_name: String,
    pub prompt_version: String,
}

/// Runs a scorer over a labeled dataset and aggregates the results
pub struct EvaluationPipeline<S> {
    scorer: S,
    dimensions: DimensionSet,
    progress_every: usize,
    experiment_name: Option<String>,
}

impl<S: Scorer> EvaluationPipeline<S> {
    pub fn new(scorer: S, dimensions: DimensionSet) -> Self {
        Self {
            scorer,
            dimensions,
            progress_every: DEFAULT_PROGRESS_EVERY,
            experiment_name: None,
        }
    }

    /// Log progress every `n` records (minimum 1)
    pub fn with_progress_every(mut self, n: usize) -> Self {
        self.progress_every = n.max(1);
        self
    }

    pub fn with_experiment_name(mut self, name: impl Into<String>) -> Self {
        self.experiment_name = Some(name.into());
        self
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn dimensions(&self) -> &DimensionSet {
        &self.dimensions
    }

    /// Score each record once and collect per-dimension sequences
    pub async fn score_batch(&self, records: &[LabeledRecord]) -> Result<ScoredBatch> {
        if records.is_empty() {
            return Err(EvalError::dataset("cannot evaluate an empty dataset"));
        }

        let total = records.len();
        info!(records = total, dimensions = self.dimensions.len(), "Scoring transcripts");

        let mut predictions: Vec<ScoredTranscript> = Vec::with_capacity(total);
        for (i, record) in records.iter().enumerate() {
            debug!(record_id = %record.id, "Scoring record");
            let scored = self
                .scorer
                .score(&record.text)
                .await
                .map_err(|e| EvalError::ScorerFailure {
                    record_id: record.id.clone(),
                    source: e.into(),
                })?;
            predictions.push(scored);

            let done = i + 1;
            if done % self.progress_every == 0 && done < total {
                info!("Scored {}/{} transcripts", done, total);
            }
        }
        info!("Completed scoring {} transcripts", total);

        let first = &predictions[0];
        let model_name = first.model_name.clone();
        let prompt_version = first.prompt_version.clone();
        if predictions
            .iter()
            .any(|p| p.model_name != model_name || p.prompt_version != prompt_version)
        {
            warn!(
                model = %model_name,
                prompt_version = %prompt_version,
                "Scorer reported differing model or prompt versions, keeping the first"
            );
        }

        let mut ground_truth = ScoresByDimension::new();
        let mut predicted = ScoresByDimension::new();
        for dim in self.dimensions.iter() {
            ground_truth.insert(
                dim,
                records.iter().map(|r| r.ground_truth.get(dim).value()).collect(),
            );
            predicted.insert(
                dim,
                predictions.iter().map(|p| p.scores.get(dim).value()).collect(),
            );
        }

        let examples = records
            .iter()
            .zip(&predictions)
            .map(|(record, prediction)| {
                ExampleAgreement::compute(
                    record.id.clone(),
                    &self.dimensions,
                    &record.ground_truth,
                    &prediction.scores,
                )
            })
            .collect();

        Ok(ScoredBatch {
            n_samples: total,
            ground_truth,
            predicted,
            examples,
            model_name,
            prompt_version,
        })
    }

    /// Score the dataset, compute metrics and build the report
    pub async fn run(&self, records: &[LabeledRecord]) -> Result<EvaluationReport> {
        let started = Instant::now();
        let timestamp = Utc::now();

        let batch = self.score_batch(records).await?;
        let (per_dimension_metrics, macro_averages) =
            evaluate_dimensions(&self.dimensions, &batch.ground_truth, &batch.predicted)?;

        let runtime_seconds = started.elapsed().as_secs_f64();
        let experiment_name = self
            .experiment_name
            .clone()
            .unwrap_or_else(|| format!("eval_{}", timestamp.format("%Y%m%d_%H%M%S")));

        info!(
            experiment = %experiment_name,
            n_samples = batch.n_samples,
            pearson_r = macro_averages.pearson_r,
            qwk = macro_averages.qwk,
            plus_minus_one_accuracy = macro_averages.plus_minus_one_accuracy,
            runtime_seconds,
            "Evaluation complete"
        );

        Ok(EvaluationReport {
            experiment_name,
            model_name: batch.model_name,
            prompt_version: batch.prompt_version,
            timestamp,
            n_samples: batch.n_samples,
            dimensions: self.dimensions.clone(),
            per_dimension_metrics,
            macro_averages,
            runtime_seconds,
            examples: batch.examples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::{Dimension, Score, ScoreCard};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns canned cards keyed by transcript text and counts calls
    struct StubScorer {
        cards: HashMap<String, ScoreCard>,
        fail_on: Option<String>,
        calls: AtomicUsize,
    }

    impl StubScorer {
        fn exact(records: &[LabeledRecord]) -> Self {
            Self {
                cards: records
                    .iter()
                    .map(|r| (r.text.clone(), r.ground_truth))
                    .collect(),
                fail_on: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Scorer for StubScorer {
        async fn score(&self, transcript: &str) -> anyhow::Result<ScoredTranscript> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.as_deref() == Some(transcript) {
                anyhow::bail!("provider timed out");
            }
            let scores = *self
                .cards
                .get(transcript)
                .ok_or_else(|| anyhow::anyhow!("unexpected transcript"))?;
            Ok(ScoredTranscript {
                scores,
                coaching: None,
                model_name: "stub-model".to_string(),
                prompt_version: "stub_v1".to_string(),
            })
        }
    }

    fn card(values: [i64; 7]) -> ScoreCard {
        let mut iter = values.into_iter();
        ScoreCard::try_from_fn(|_| Score::new(iter.next().unwrap_or(3))).unwrap()
    }

    fn record(id: &str, values: [i64; 7]) -> LabeledRecord {
        LabeledRecord {
            id: id.to_string(),
            text: format!("Rep: transcript {}", id),
            ground_truth: card(values),
        }
    }

    fn three_records() -> Vec<LabeledRecord> {
        vec![
            record("a", [1, 2, 3, 4, 5, 1, 2]),
            record("b", [3, 3, 4, 2, 1, 5, 4]),
            record("c", [5, 4, 1, 3, 2, 3, 5]),
        ]
    }

    #[tokio::test]
    async fn test_exact_match_scores_perfectly() {
        let records = three_records();
        let pipeline = EvaluationPipeline::new(StubScorer::exact(&records), DimensionSet::spin())
            .with_experiment_name("exact");

        let report = pipeline.run(&records).await.unwrap();

        assert_eq!(report.experiment_name, "exact");
        assert_eq!(report.n_samples, 3);
        assert_eq!(report.per_dimension_metrics.len(), 7);
        assert!((report.macro_averages.pearson_r - 1.0).abs() < 1e-6);
        assert!((report.macro_averages.qwk - 1.0).abs() < 1e-6);
        assert!((report.macro_averages.plus_minus_one_accuracy - 1.0).abs() < 1e-6);
        assert_eq!(report.model_name, "stub-model");
        assert_eq!(report.prompt_version, "stub_v1");
        assert!(report.runtime_seconds >= 0.0);
        assert!(report.examples.iter().all(|e| e.exact_matches == 7));
    }

    #[tokio::test]
    async fn test_scorer_called_once_per_record() {
        let records = three_records();
        let pipeline = EvaluationPipeline::new(StubScorer::exact(&records), DimensionSet::spin())
            .with_progress_every(1);

        pipeline.run(&records).await.unwrap();
        assert_eq!(pipeline.scorer().calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_dataset_fails_without_scoring() {
        let pipeline = EvaluationPipeline::new(StubScorer::exact(&[]), DimensionSet::spin());

        let result = pipeline.run(&[]).await;
        assert!(matches!(result, Err(EvalError::Dataset(_))));
        assert_eq!(pipeline.scorer().calls(), 0);
    }

    #[tokio::test]
    async fn test_scorer_failure_aborts_batch() {
        let records = three_records();
        let mut scorer = StubScorer::exact(&records);
        scorer.fail_on = Some(records[1].text.clone());
        let pipeline = EvaluationPipeline::new(scorer, DimensionSet::spin());

        match pipeline.run(&records).await {
            Err(EvalError::ScorerFailure { record_id, source }) => {
                assert_eq!(record_id, "b");
                assert_eq!(source.to_string(), "provider timed out");
            }
            other => panic!("expected ScorerFailure, got {:?}", other.map(|r| r.n_samples)),
        }
        // the third record is never scored
        assert_eq!(pipeline.scorer().calls(), 2);
    }

    #[tokio::test]
    async fn test_dimension_subset() {
        let records = three_records();
        let dims = DimensionSet::parse_list("tone,situation").unwrap();
        let pipeline = EvaluationPipeline::new(StubScorer::exact(&records), dims);

        let batch = pipeline.score_batch(&records).await.unwrap();
        assert_eq!(batch.ground_truth.len(), 2);
        assert_eq!(batch.predicted[&Dimension::Tone], vec![1, 5, 3]);
        assert_eq!(batch.ground_truth[&Dimension::Situation], vec![1, 3, 5]);

        let report = pipeline.run(&records).await.unwrap();
        let keys: Vec<_> = report.per_dimension_metrics.keys().copied().collect();
        assert_eq!(keys, vec![Dimension::Situation, Dimension::Tone]);
    }

    #[tokio::test]
    async fn test_default_experiment_name() {
        let records = three_records();
        let pipeline = EvaluationPipeline::new(StubScorer::exact(&records), DimensionSet::spin());
        let report = pipeline.run(&records).await.unwrap();
        assert!(report.experiment_name.starts_with("eval_"));
    }
}
