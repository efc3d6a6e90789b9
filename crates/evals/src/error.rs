//! Error types for calibration runs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    /// Metric inputs were empty or misaligned
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The labeled dataset is empty or malformed
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Macro averages were requested over zero dimensions
    #[error("Cannot aggregate metrics over zero dimensions")]
    EmptyAggregation,

    /// The scorer failed on one record, aborting the batch
    #[error("Scorer failed on record '{record_id}'")]
    ScorerFailure {
        record_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl EvalError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
