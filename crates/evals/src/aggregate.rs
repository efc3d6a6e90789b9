//! Per-dimension metrics and macro averages
//!
//! Applies the metrics engine once per rubric dimension, then averages the
//! results across dimensions with equal weight.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dimension::{Dimension, DimensionSet, ScoreCard, MAX_SCORE, MIN_SCORE};
use crate::error::{EvalError, Result};
use crate::metrics::{pearson_r, plus_minus_one_accuracy, quadratic_weighted_kappa};

/// Calibration metrics for one dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionMetrics {
    pub pearson_r: f64,
    pub qwk: f64,
    pub plus_minus_one_accuracy: f64,
}

/// Unweighted mean of each metric across the evaluated dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroAverages {
    pub pearson_r: f64,
    pub qwk: f64,
    pub plus_minus_one_accuracy: f64,
}

/// Metrics keyed by dimension, iterated in canonical rubric order
pub type PerDimensionMetrics = BTreeMap<Dimension, DimensionMetrics>;

/// Score sequences keyed by dimension, aligned by record index
pub type ScoresByDimension = BTreeMap<Dimension, Vec<i32>>;

/// Compute all three metrics for one dimension's label/prediction pair
pub fn compute_dimension_metrics(ground_truth: &[i32], predicted: &[i32]) -> Result<DimensionMetrics> {
    Ok(DimensionMetrics {
        pearson_r: pearson_r(ground_truth, predicted)?,
        qwk: quadratic_weighted_kappa(ground_truth, predicted)?,
        plus_minus_one_accuracy: plus_minus_one_accuracy(ground_truth, predicted)?,
    })
}

/// Average each metric across whatever dimensions are present
pub fn compute_macro_averages(per_dimension: &PerDimensionMetrics) -> Result<MacroAverages> {
    if per_dimension.is_empty() {
        return Err(EvalError::EmptyAggregation);
    }

    let n = per_dimension.len() as f64;
    let sum = |field: fn(&DimensionMetrics) -> f64| per_dimension.values().map(field).sum::<f64>();

    Ok(MacroAverages {
        pearson_r: sum(|m| m.pearson_r) / n,
        qwk: sum(|m| m.qwk) / n,
        plus_minus_one_accuracy: sum(|m| m.plus_minus_one_accuracy) / n,
    })
}

/// Run the metrics for every dimension of `dimensions`, then macro-average
///
/// Both maps must hold a sequence for each requested dimension.
pub fn evaluate_dimensions(
    dimensions: &DimensionSet,
    ground_truth: &ScoresByDimension,
    predicted: &ScoresByDimension,
) -> Result<(PerDimensionMetrics, MacroAverages)> {
    let mut per_dimension = PerDimensionMetrics::new();

    for dim in dimensions.iter() {
        let truth = ground_truth
            .get(&dim)
            .ok_or_else(|| EvalError::invalid(format!("no ground truth for dimension {}", dim)))?;
        let pred = predicted
            .get(&dim)
            .ok_or_else(|| EvalError::invalid(format!("no predictions for dimension {}", dim)))?;
        per_dimension.insert(dim, compute_dimension_metrics(truth, pred)?);
    }

    let macro_averages = compute_macro_averages(&per_dimension)?;
    Ok((per_dimension, macro_averages))
}

/// Agreement between one record's labels and its predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleAgreement {
    /// Record identifier from the dataset
    pub id: String,
    /// Dimensions where prediction equals the label
    pub exact_matches: usize,
    /// Dimensions where prediction is within one point
    pub within_one: usize,
    /// Mean absolute score gap across dimensions
    pub mean_distance: f64,
    /// `1 - mean_distance / 4`, so 1.0 is perfect and 0.0 is maximally wrong
    pub overall_quality: f64,
}

impl ExampleAgreement {
    pub fn compute(
        id: impl Into<String>,
        dimensions: &DimensionSet,
        ground_truth: &ScoreCard,
        predicted: &ScoreCard,
    ) -> Self {
        let distances: Vec<i32> = dimensions
            .iter()
            .map(|dim| (ground_truth.get(dim).value() - predicted.get(dim).value()).abs())
            .collect();

        let exact_matches = distances.iter().filter(|&&d| d == 0).count();
        let within_one = distances.iter().filter(|&&d| d <= 1).count();
        let mean_distance = distances.iter().sum::<i32>() as f64 / distances.len().max(1) as f64;
        let max_distance = (MAX_SCORE - MIN_SCORE) as f64;

        Self {
            id: id.into(),
            exact_matches,
            within_one,
            mean_distance,
            overall_quality: 1.0 - mean_distance / max_distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::Score;

    fn metrics(r: f64, qwk: f64, pm1: f64) -> DimensionMetrics {
        DimensionMetrics {
            pearson_r: r,
            qwk,
            plus_minus_one_accuracy: pm1,
        }
    }

    #[test]
    fn test_dimension_metrics_bundle_all_three() {
        let m = compute_dimension_metrics(&[1, 2, 3, 4, 5], &[1, 2, 5, 4, 5]).unwrap();
        assert!((m.plus_minus_one_accuracy - 0.8).abs() < 1e-9);
        assert!(m.pearson_r > 0.0 && m.pearson_r < 1.0);
        assert!(m.qwk > 0.0 && m.qwk < 1.0);
    }

    #[test]
    fn test_dimension_metrics_propagates_invalid_input() {
        assert!(matches!(
            compute_dimension_metrics(&[1, 2, 3], &[1, 2]),
            Err(EvalError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_macro_of_single_dimension_is_identity() {
        let mut map = PerDimensionMetrics::new();
        map.insert(Dimension::Tone, metrics(0.42, -0.1, 0.75));

        let avg = compute_macro_averages(&map).unwrap();
        assert_eq!(avg.pearson_r, 0.42);
        assert_eq!(avg.qwk, -0.1);
        assert_eq!(avg.plus_minus_one_accuracy, 0.75);
    }

    #[test]
    fn test_macro_of_identical_dimensions_is_unchanged() {
        let map: PerDimensionMetrics = Dimension::ALL
            .into_iter()
            .map(|d| (d, metrics(0.5, 0.25, 1.0)))
            .collect();

        let avg = compute_macro_averages(&map).unwrap();
        assert!((avg.pearson_r - 0.5).abs() < 1e-12);
        assert!((avg.qwk - 0.25).abs() < 1e-12);
        assert!((avg.plus_minus_one_accuracy - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_macro_averages_fewer_than_seven() {
        let mut map = PerDimensionMetrics::new();
        map.insert(Dimension::Situation, metrics(1.0, 1.0, 1.0));
        map.insert(Dimension::Flow, metrics(0.0, 0.5, 0.5));

        let avg = compute_macro_averages(&map).unwrap();
        assert!((avg.pearson_r - 0.5).abs() < 1e-12);
        assert!((avg.qwk - 0.75).abs() < 1e-12);
        assert!((avg.plus_minus_one_accuracy - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_macro_averages_empty_fails() {
        assert!(matches!(
            compute_macro_averages(&PerDimensionMetrics::new()),
            Err(EvalError::EmptyAggregation)
        ));
    }

    #[test]
    fn test_evaluate_dimensions_covers_requested_set() {
        let dims = DimensionSet::parse_list("situation,tone").unwrap();
        let mut truth = ScoresByDimension::new();
        let mut pred = ScoresByDimension::new();
        truth.insert(Dimension::Situation, vec![1, 2, 3]);
        pred.insert(Dimension::Situation, vec![1, 2, 3]);
        truth.insert(Dimension::Tone, vec![3, 4, 5]);
        pred.insert(Dimension::Tone, vec![5, 4, 3]);

        let (per_dim, avg) = evaluate_dimensions(&dims, &truth, &pred).unwrap();
        assert_eq!(per_dim.len(), 2);
        assert!((per_dim[&Dimension::Tone].pearson_r + 1.0).abs() < 1e-6);
        assert!(avg.pearson_r.abs() < 1e-6);
    }

    #[test]
    fn test_evaluate_dimensions_missing_sequence() {
        let dims = DimensionSet::parse_list("problem").unwrap();
        let result = evaluate_dimensions(&dims, &ScoresByDimension::new(), &ScoresByDimension::new());
        assert!(matches!(result, Err(EvalError::InvalidInput(_))));
    }

    #[test]
    fn test_example_agreement() {
        let truth = ScoreCard::uniform(Score::new(3).unwrap());
        let mut pred = truth;
        pred.situation = Score::new(4).unwrap();
        pred.problem = Score::new(5).unwrap();

        let agreement = ExampleAgreement::compute("call-1", &DimensionSet::spin(), &truth, &pred);
        assert_eq!(agreement.exact_matches, 5);
        assert_eq!(agreement.within_one, 6);
        assert!((agreement.mean_distance - 3.0 / 7.0).abs() < 1e-12);
        assert!((agreement.overall_quality - (1.0 - 3.0 / 28.0)).abs() < 1e-12);
    }

    #[test]
    fn test_example_agreement_worst_case() {
        let truth = ScoreCard::uniform(Score::new(1).unwrap());
        let pred = ScoreCard::uniform(Score::new(5).unwrap());
        let agreement = ExampleAgreement::compute("x", &DimensionSet::spin(), &truth, &pred);
        assert_eq!(agreement.exact_matches, 0);
        assert_eq!(agreement.within_one, 0);
        assert_eq!(agreement.overall_quality, 0.0);
    }
}
