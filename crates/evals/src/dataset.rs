//! Labeled dataset loader
//!
//! Reads human-labeled transcripts from CSV or JSON. Every record carries a
//! complete [`ScoreCard`] of ground-truth scores.
//!
//! CSV layout: one row per transcript with an `id` column, a text column
//! (`transcript` by default) and one `score_<dimension>` column for each of
//! the seven rubric dimensions.
//!
//! JSON layout: an array of `{"id", "text", "scores": {...}}` objects.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dimension::{Dimension, Score, ScoreCard, MAX_SCORE, MIN_SCORE};
use crate::error::{EvalError, Result};

/// Default name of the CSV column holding the transcript
pub const DEFAULT_TEXT_COLUMN: &str = "transcript";

/// One human-labeled transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub id: String,
    pub text: String,
    #[serde(rename = "scores")]
    pub ground_truth: ScoreCard,
}

/// Load a dataset, choosing the format from the file extension
pub fn load_dataset(path: &Path, text_column: &str) -> Result<Vec<LabeledRecord>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    let records = match extension.as_deref() {
        Some("csv") => {
            let content = read_file(path)?;
            parse_csv(&content, text_column)?
        }
        Some("json") => {
            let content = read_file(path)?;
            parse_json(&content)?
        }
        _ => {
            return Err(EvalError::dataset(format!(
                "Unsupported dataset format: {} (expected .csv or .json)",
                path.display()
            )))
        }
    };

    debug!(path = %path.display(), records = records.len(), "Loaded dataset");
    Ok(records)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| EvalError::dataset(format!("Failed to read {}: {}", path.display(), e)))
}

/// Parse CSV text into labeled records
pub fn parse_csv(content: &str, text_column: &str) -> Result<Vec<LabeledRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| EvalError::dataset(format!("Failed to read CSV headers: {}", e)))?
        .clone();

    let column_index = |name: &str| headers.iter().position(|h| h == name);

    let mut required = vec!["id".to_string(), text_column.to_string()];
    required.extend(Dimension::ALL.iter().map(|d| d.column()));

    let missing: Vec<&str> = required
        .iter()
        .filter(|name| column_index(name).is_none())
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(EvalError::dataset(format!(
            "Missing required columns: {}",
            missing.join(", ")
        )));
    }

    let id_idx = column_index("id").unwrap_or_default();
    let text_idx = column_index(text_column).unwrap_or_default();
    let score_idx: BTreeMap<Dimension, usize> = Dimension::ALL
        .into_iter()
        .map(|d| (d, column_index(&d.column()).unwrap_or_default()))
        .collect();

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row_number = i + 1;
        let row = row.map_err(|e| EvalError::dataset(format!("Row {}: {}", row_number, e)))?;
        let cell = |idx: usize| row.get(idx).unwrap_or_default();

        let ground_truth = ScoreCard::try_from_fn(|dim| {
            let column = dim.column();
            let raw = cell(score_idx[&dim]).trim();
            let value: i64 = raw.parse().map_err(|_| {
                EvalError::dataset(format!(
                    "Row {}, column {}: expected an integer score, got '{}'",
                    row_number, column, raw
                ))
            })?;
            Score::new(value).map_err(|_| {
                EvalError::dataset(format!(
                    "Row {}, column {}: score {} outside [{}, {}]",
                    row_number, column, value, MIN_SCORE, MAX_SCORE
                ))
            })
        })?;

        records.push(LabeledRecord {
            id: cell(id_idx).trim().to_string(),
            text: cell(text_idx).to_string(),
            ground_truth,
        });
    }

    if records.is_empty() {
        return Err(EvalError::dataset("CSV contains no data rows"));
    }

    Ok(records)
}

/// Parse a JSON array of labeled records
pub fn parse_json(content: &str) -> Result<Vec<LabeledRecord>> {
    let records: Vec<LabeledRecord> = serde_json::from_str(content)
        .map_err(|e| EvalError::dataset(format!("Failed to parse JSON dataset: {}", e)))?;

    if records.is_empty() {
        return Err(EvalError::dataset("JSON dataset contains no records"));
    }

    Ok(records)
}

/// Ground-truth label statistics for one dimension
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelDistribution {
    /// Count of each score, index 0 is score 1
    pub histogram: [usize; 5],
    pub mean: f64,
}

/// Overview of a dataset's ground-truth labels
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub n_records: usize,
    pub distributions: BTreeMap<Dimension, LabelDistribution>,
}

impl DatasetSummary {
    pub fn from_records(records: &[LabeledRecord]) -> Self {
        let distributions = Dimension::ALL
            .into_iter()
            .map(|dim| {
                let mut histogram = [0usize; 5];
                let mut total = 0i64;
                for record in records {
                    let score = record.ground_truth.get(dim).value();
                    histogram[(score - MIN_SCORE as i32) as usize] += 1;
                    total += score as i64;
                }
                let mean = if records.is_empty() {
                    0.0
                } else {
                    total as f64 / records.len() as f64
                };
                (dim, LabelDistribution { histogram, mean })
            })
            .collect();

        Self {
            n_records: records.len(),
            distributions,
        }
    }

    pub fn print_summary(&self) {
        println!("\n==========================================");
        println!("Dataset Summary: {} records", self.n_records);
        println!("==========================================\n");

        println!(
            "{:<14} {:>5} {:>5} {:>5} {:>5} {:>5} {:>7}",
            "Dimension", "1", "2", "3", "4", "5", "Mean"
        );
        println!("{}", "-".repeat(52));

        for (dim, dist) in &self.distributions {
            let [s1, s2, s3, s4, s5] = dist.histogram;
            println!(
                "{:<14} {:>5} {:>5} {:>5} {:>5} {:>5} {:>7.2}",
                dim.as_str(),
                s1,
                s2,
                s3,
                s4,
                s5,
                dist.mean
            );
        }
    }
}
