//! Comparison of two evaluation reports
//!
//! Used to decide whether a new model or prompt version calibrates better
//! than the current one. Dimensions are compared on QWK and Pearson r.

use serde::{Deserialize, Serialize};

use crate::dimension::Dimension;
use crate::report::EvaluationReport;

/// Smallest metric change counted as a real difference
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Status of a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffStatus {
    /// Improved by more than the threshold
    Improved,
    /// No significant change
    Unchanged,
    /// Regressed by more than the threshold
    Regressed,
}

impl DiffStatus {
    pub fn from_delta(delta: f64) -> Self {
        if delta > SIGNIFICANCE_THRESHOLD {
            DiffStatus::Improved
        } else if delta < -SIGNIFICANCE_THRESHOLD {
            DiffStatus::Regressed
        } else {
            DiffStatus::Unchanged
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            DiffStatus::Improved => "+",
            DiffStatus::Unchanged => "=",
            DiffStatus::Regressed => "-",
        }
    }
}

/// Overall comparison verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonVerdict {
    /// Candidate is better overall
    Better,
    /// No significant difference
    Equivalent,
    /// Candidate is worse overall
    Worse,
    /// Mixed results - some better, some worse
    Mixed,
}

/// One metric on one dimension, before and after
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricDiff {
    pub dimension: Dimension,
    pub metric: String,
    pub baseline: f64,
    pub candidate: f64,
    pub delta: f64,
    pub status: DiffStatus,
}

impl MetricDiff {
    fn new(dimension: Dimension, metric: &str, baseline: f64, candidate: f64) -> Self {
        let delta = candidate - baseline;
        Self {
            dimension,
            metric: metric.to_string(),
            baseline,
            candidate,
            delta,
            status: DiffStatus::from_delta(delta),
        }
    }
}

/// Comparison between a baseline and a candidate report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportComparison {
    pub baseline_name: String,
    pub candidate_name: String,
    pub diffs: Vec<MetricDiff>,
    /// Dimensions evaluated in only one of the two reports
    pub unmatched: Vec<Dimension>,
    pub verdict: ComparisonVerdict,
}

impl ReportComparison {
    /// Compare every dimension the two reports share
    pub fn between(baseline: &EvaluationReport, candidate: &EvaluationReport) -> Self {
        let mut diffs = Vec::new();
        let mut unmatched = Vec::new();

        for (dim, base) in &baseline.per_dimension_metrics {
            match candidate.per_dimension_metrics.get(dim) {
                Some(cand) => {
                    diffs.push(MetricDiff::new(*dim, "qwk", base.qwk, cand.qwk));
                    diffs.push(MetricDiff::new(*dim, "pearson_r", base.pearson_r, cand.pearson_r));
                }
                None => unmatched.push(*dim),
            }
        }
        unmatched.extend(
            candidate
                .per_dimension_metrics
                .keys()
                .filter(|dim| !baseline.per_dimension_metrics.contains_key(*dim)),
        );

        let improved_count = diffs.iter().filter(|d| d.status == DiffStatus::Improved).count();
        let regressed_count = diffs.iter().filter(|d| d.status == DiffStatus::Regressed).count();

        let verdict = if regressed_count == 0 && improved_count > 0 {
            ComparisonVerdict::Better
        } else if improved_count == 0 && regressed_count > 0 {
            ComparisonVerdict::Worse
        } else if improved_count > 0 && regressed_count > 0 {
            ComparisonVerdict::Mixed
        } else {
            ComparisonVerdict::Equivalent
        };

        Self {
            baseline_name: label(baseline),
            candidate_name: label(candidate),
            diffs,
            unmatched,
            verdict,
        }
    }

    pub fn print_summary(&self) {
        println!("\n========== REPORT COMPARISON ==========");
        println!();
        println!("Baseline:  {}", self.baseline_name);
        println!("Candidate: {}", self.candidate_name);
        println!();
        println!(
            "{:<14} {:<10} {:>10} {:>10} {:>10} {:>7}",
            "Dimension", "Metric", "Baseline", "Candidate", "Delta", "Status"
        );
        println!("{}", "-".repeat(66));

        for diff in &self.diffs {
            println!(
                "{:<14} {:<10} {:>10.3} {:>10.3} {:>+10.3} {:>7}",
                diff.dimension.as_str(),
                diff.metric,
                diff.baseline,
                diff.candidate,
                diff.delta,
                diff.status.symbol()
            );
        }

        if !self.unmatched.is_empty() {
            let names: Vec<&str> = self.unmatched.iter().map(|d| d.as_str()).collect();
            println!();
            println!("Not compared (missing from one report): {}", names.join(", "));
        }

        println!();
        let verdict_str = match self.verdict {
            ComparisonVerdict::Better => "BETTER - Candidate improves on baseline",
            ComparisonVerdict::Equivalent => "EQUIVALENT - No significant difference",
            ComparisonVerdict::Worse => "WORSE - Candidate regresses from baseline",
            ComparisonVerdict::Mixed => "MIXED - Some improvements, some regressions",
        };
        println!("Verdict: {}", verdict_str);
        println!();
        println!("==========================================\n");
    }
}

fn label(report: &EvaluationReport) -> String {
    format!(
        "{} ({}, {})",
        report.experiment_name, report.model_name, report.prompt_version
    )
}
