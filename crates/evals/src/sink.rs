//! Optional destinations for finished reports
//!
//! Publishing is best effort. A missing or failing sink is reported through
//! [`SinkOutcome`] and never fails the evaluation that produced the report.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::report::EvaluationReport;

/// Somewhere a report can be persisted
pub trait ReportSink {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Persist the report and return where it went
    fn publish(&self, report: &EvaluationReport) -> Result<String>;
}

/// What happened when a report was offered to a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    Published { sink: String, location: String },
    Skipped { reason: String },
    Failed { sink: String, reason: String },
}

impl SinkOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, SinkOutcome::Published { .. })
    }
}

impl fmt::Display for SinkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkOutcome::Published { sink, location } => {
                write!(f, "published to {} at {}", sink, location)
            }
            SinkOutcome::Skipped { reason } => write!(f, "skipped: {}", reason),
            SinkOutcome::Failed { sink, reason } => write!(f, "{} failed: {}", sink, reason),
        }
    }
}

/// Offer a report to an optional sink
pub fn publish_report(report: &EvaluationReport, sink: Option<&dyn ReportSink>) -> SinkOutcome {
    let Some(sink) = sink else {
        return SinkOutcome::Skipped {
            reason: "no report sink configured".to_string(),
        };
    };

    match sink.publish(report) {
        Ok(location) => {
            info!(sink = sink.name(), location = %location, "Published report");
            SinkOutcome::Published {
                sink: sink.name().to_string(),
                location,
            }
        }
        Err(e) => {
            warn!(sink = sink.name(), "Failed to publish report: {:#}", e);
            SinkOutcome::Failed {
                sink: sink.name().to_string(),
                reason: format!("{:#}", e),
            }
        }
    }
}

/// Writes the report as pretty JSON to a fixed path
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for JsonFileSink {
    fn name(&self) -> &str {
        "json-file"
    }

    fn publish(&self, report: &EvaluationReport) -> Result<String> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create report directory: {}", parent.display())
                })?;
            }
        }
        report.save(&self.path)?;
        Ok(self.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;

    struct BrokenSink;

    impl ReportSink for BrokenSink {
        fn name(&self) -> &str {
            "broken"
        }

        fn publish(&self, _report: &EvaluationReport) -> Result<String> {
            anyhow::bail!("service unavailable")
        }
    }

    #[test]
    fn test_no_sink_is_skipped() {
        let outcome = publish_report(&sample_report("x", 0.5, 0.5), None);
        assert!(matches!(outcome, SinkOutcome::Skipped { .. }));
        assert!(!outcome.is_published());
    }

    #[test]
    fn test_failing_sink_is_reported_not_raised() {
        let outcome = publish_report(&sample_report("x", 0.5, 0.5), Some(&BrokenSink));
        assert_eq!(
            outcome,
            SinkOutcome::Failed {
                sink: "broken".to_string(),
                reason: "service unavailable".to_string(),
            }
        );
    }

    #[test]
    fn test_json_file_sink_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs").join("nested").join("report.json");
        let sink = JsonFileSink::new(&path);

        let outcome = publish_report(&sample_report("x", 0.5, 0.5), Some(&sink));
        assert!(outcome.is_published());
        assert!(path.exists());
        assert_eq!(EvaluationReport::load(&path).unwrap().experiment_name, "x");
    }
}
