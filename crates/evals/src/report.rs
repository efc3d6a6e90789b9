//! Evaluation reports
//!
//! The report is plain data: callers print it, save it as JSON or hand it
//! to a [`ReportSink`](crate::sink::ReportSink).

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{ExampleAgreement, MacroAverages, PerDimensionMetrics};
use crate::dimension::DimensionSet;

/// Number of lowest-agreement examples listed by `print_summary`
const WORST_EXAMPLES_SHOWN: usize = 5;

/// Result of one calibration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub experiment_name: String,
    /// Model identity reported by the scorer
    pub model_name: String,
    /// Prompt version reported by the scorer
    pub prompt_version: String,
    /// When the run started
    pub timestamp: DateTime<Utc>,
    pub n_samples: usize,
    pub dimensions: DimensionSet,
    pub per_dimension_metrics: PerDimensionMetrics,
    pub macro_averages: MacroAverages,
    /// Wall-clock time of the batch, scoring included
    pub runtime_seconds: f64,
    #[serde(default)]
    pub examples: Vec<ExampleAgreement>,
}

impl EvaluationReport {
    /// Save the report as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write report: {}", path.display()))
    }

    /// Load a report saved with [`save`](Self::save)
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse report: {}", path.display()))
    }

    /// Examples sorted from lowest to highest agreement
    pub fn worst_examples(&self, n: usize) -> Vec<&ExampleAgreement> {
        let mut sorted: Vec<&ExampleAgreement> = self.examples.iter().collect();
        sorted.sort_by(|a, b| a.overall_quality.total_cmp(&b.overall_quality));
        sorted.truncate(n);
        sorted
    }

    pub fn print_summary(&self) {
        println!("\n========== EVALUATION REPORT ==========\n");
        println!("Experiment: {}", self.experiment_name);
        println!("Model:      {} (prompt {})", self.model_name, self.prompt_version);
        println!("Timestamp:  {}", self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("Samples:    {}", self.n_samples);
        println!("Runtime:    {:.2}s", self.runtime_seconds);

        println!("\n---------- Per-Dimension Metrics ----------\n");
        println!(
            "{:<14} {:>10} {:>10} {:>12}",
            "Dimension", "Pearson r", "QWK", "+/-1 Acc"
        );
        println!("{}", "-".repeat(49));
        for (dim, metrics) in &self.per_dimension_metrics {
            println!(
                "{:<14} {:>10.3} {:>10.3} {:>11.1}%",
                dim.as_str(),
                metrics.pearson_r,
                metrics.qwk,
                metrics.plus_minus_one_accuracy * 100.0
            );
        }
        println!("{}", "-".repeat(49));
        println!(
            "{:<14} {:>10.3} {:>10.3} {:>11.1}%",
            "macro",
            self.macro_averages.pearson_r,
            self.macro_averages.qwk,
            self.macro_averages.plus_minus_one_accuracy * 100.0
        );

        let worst = self.worst_examples(WORST_EXAMPLES_SHOWN);
        if !worst.is_empty() {
            println!("\n---------- Lowest Agreement ----------\n");
            for example in worst {
                println!(
                    "  {} - quality {:.2}, exact {}/{}, within one {}/{}",
                    example.id,
                    example.overall_quality,
                    example.exact_matches,
                    self.dimensions.len(),
                    example.within_one,
                    self.dimensions.len()
                );
            }
        }
        println!("\n========================================\n");
    }
}
