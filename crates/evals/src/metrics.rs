//! Agreement metrics between human labels and scorer predictions
//!
//! - **Pearson r**: linear correlation of the two score sequences
//! - **Quadratic Weighted Kappa**: chance-corrected ordinal agreement
//! - **±1 accuracy**: share of predictions within one point of the label
//!
//! All three take `(ground_truth, predicted)` as equal-length, non-empty
//! slices and reject anything else with [`EvalError::InvalidInput`] before
//! doing any arithmetic.

use std::collections::BTreeSet;

use crate::error::{EvalError, Result};

fn validate_pair(ground_truth: &[i32], predicted: &[i32]) -> Result<()> {
    if ground_truth.is_empty() || predicted.is_empty() {
        return Err(EvalError::invalid("arrays must contain at least one element"));
    }
    if ground_truth.len() != predicted.len() {
        return Err(EvalError::invalid(format!(
            "arrays must be same length: {} vs {}",
            ground_truth.len(),
            predicted.len()
        )));
    }
    Ok(())
}

/// Pearson correlation coefficient
///
/// Returns `0.0` for a single sample and when either sequence is constant,
/// since the correlation is undefined there.
///
/// The denominator is `sqrt(var_true * var_pred)` rather than the product of
/// two square roots. Taking one root keeps an exact linear match at exactly
/// `1.0` (or `-1.0`), so `pearson_r(a, a) == 1.0` holds without a tolerance.
pub fn pearson_r(ground_truth: &[i32], predicted: &[i32]) -> Result<f64> {
    validate_pair(ground_truth, predicted)?;

    let n = ground_truth.len();
    if n == 1 {
        return Ok(0.0);
    }

    let mean_true = ground_truth.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let mean_pred = predicted.iter().map(|&v| v as f64).sum::<f64>() / n as f64;

    let mut covariance = 0.0;
    let mut var_true = 0.0;
    let mut var_pred = 0.0;

    for (&t, &p) in ground_truth.iter().zip(predicted) {
        let dt = t as f64 - mean_true;
        let dp = p as f64 - mean_pred;
        covariance += dt * dp;
        var_true += dt * dt;
        var_pred += dp * dp;
    }

    if var_true == 0.0 || var_pred == 0.0 {
        return Ok(0.0);
    }

    Ok(covariance / (var_true * var_pred).sqrt())
}

/// Quadratic Weighted Kappa over integer labels
///
/// Weights are computed over the sorted label *indices*, not the raw label
/// values, so `{1, 3, 5}` is treated as three adjacent categories.
/// Returns `1.0` when only one distinct label appears anywhere, and `0.0`
/// when the expected disagreement is exactly `1.0`.
pub fn quadratic_weighted_kappa(ground_truth: &[i32], predicted: &[i32]) -> Result<f64> {
    validate_pair(ground_truth, predicted)?;

    let labels: Vec<i32> = ground_truth
        .iter()
        .chain(predicted)
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let n_labels = labels.len();

    if n_labels == 1 {
        return Ok(1.0);
    }

    // labels is sorted and contains every value, so the search always hits
    let index = |label: i32| labels.binary_search(&label).unwrap_or_default();

    let mut confusion = vec![vec![0u64; n_labels]; n_labels];
    for (&t, &p) in ground_truth.iter().zip(predicted) {
        confusion[index(t)][index(p)] += 1;
    }

    let denom = ((n_labels - 1) * (n_labels - 1)) as f64;
    let weight = |i: usize, j: usize| {
        let d = i as f64 - j as f64;
        d * d / denom
    };

    let n_samples = ground_truth.len() as f64;

    let mut observed = 0.0;
    for (i, row) in confusion.iter().enumerate() {
        for (j, &count) in row.iter().enumerate() {
            observed += weight(i, j) * count as f64;
        }
    }
    observed /= n_samples;

    let hist_true: Vec<f64> = confusion
        .iter()
        .map(|row| row.iter().sum::<u64>() as f64)
        .collect();
    let hist_pred: Vec<f64> = (0..n_labels)
        .map(|j| confusion.iter().map(|row| row[j]).sum::<u64>() as f64)
        .collect();

    let mut expected = 0.0;
    for (i, &ht) in hist_true.iter().enumerate() {
        for (j, &hp) in hist_pred.iter().enumerate() {
            expected += weight(i, j) * ht * hp;
        }
    }
    expected /= n_samples * n_samples;

    if expected == 1.0 {
        return Ok(0.0);
    }

    Ok(1.0 - observed / expected)
}

/// Fraction of positions where prediction and label differ by at most 1
pub fn plus_minus_one_accuracy(ground_truth: &[i32], predicted: &[i32]) -> Result<f64> {
    validate_pair(ground_truth, predicted)?;

    let within = ground_truth
        .iter()
        .zip(predicted)
        .filter(|&(&t, &p)| t.abs_diff(p) <= 1)
        .count();

    Ok(within as f64 / ground_truth.len() as f64)
}
