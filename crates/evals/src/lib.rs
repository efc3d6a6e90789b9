//! Offline calibration for the SPIN transcript scorer
//!
//! Runs the scorer over a human-labeled dataset and measures how closely
//! its scores track the labels on each rubric dimension.
//!
//! ## Metrics
//!
//! - **Pearson r**: linear correlation between labels and predictions
//! - **QWK**: quadratic weighted kappa, chance-corrected ordinal agreement
//! - **±1 accuracy**: share of predictions within one point of the label
//!
//! Each metric is computed per dimension and then macro-averaged with equal
//! weight across the evaluated dimensions.

pub mod aggregate;
pub mod compare;
pub mod config;
pub mod dataset;
pub mod dimension;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod scorer;
pub mod sink;

pub use aggregate::{
    compute_dimension_metrics, compute_macro_averages, evaluate_dimensions, DimensionMetrics,
    ExampleAgreement, MacroAverages, PerDimensionMetrics,
};
pub use compare::{ComparisonVerdict, DiffStatus, ReportComparison};
pub use dataset::{load_dataset, DatasetSummary, LabeledRecord};
pub use dimension::{Dimension, DimensionSet, Score, ScoreCard};
pub use error::{EvalError, Result};
pub use metrics::{pearson_r, plus_minus_one_accuracy, quadratic_weighted_kappa};
pub use pipeline::{EvaluationPipeline, ScoredBatch};
pub use prompts::PromptTemplate;
pub use report::EvaluationReport;
pub use scorer::{Coaching, LlmScorer, ScoredTranscript, Scorer, MOCK_ASSESSMENT};
pub use sink::{publish_report, JsonFileSink, ReportSink, SinkOutcome};
