//! SPIN scorer calibration runner
//!
//! Scores a labeled dataset and reports agreement with the human labels.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use evals::config::{load_config, Config};
use evals::{
    load_dataset, publish_report, ComparisonVerdict, DatasetSummary, DimensionSet,
    EvaluationPipeline, EvaluationReport, JsonFileSink, LlmScorer, ReportComparison, ReportSink,
    MOCK_ASSESSMENT,
};
use llm::LlmClient;

#[derive(Parser)]
#[command(name = "spin-eval")]
#[command(about = "Calibrate the SPIN transcript scorer against human labels")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (or set SPIN_EVAL_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a labeled dataset and compute calibration metrics
    Run {
        /// Labeled dataset (.csv or .json)
        #[arg(short, long)]
        input: PathBuf,

        /// Write the report as JSON to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Experiment name recorded on the report
        #[arg(short, long)]
        experiment: Option<String>,

        /// Comma-separated dimensions to evaluate (default: all seven)
        #[arg(short, long)]
        dimensions: Option<String>,

        /// Use the mock LLM provider instead of a real model
        #[arg(long)]
        mock: bool,
    },

    /// Load a dataset and summarize its labels without scoring
    Validate {
        /// Labeled dataset (.csv or .json)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print a saved report
    Show {
        /// Report JSON file
        report: PathBuf,
    },

    /// Compare a candidate report against a baseline
    Compare {
        /// Baseline report JSON file
        baseline: PathBuf,

        /// Candidate report JSON file
        candidate: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            input,
            output,
            experiment,
            dimensions,
            mock,
        } => {
            run_evaluation(
                config,
                &input,
                output.as_deref(),
                experiment,
                dimensions.as_deref(),
                mock,
            )
            .await
        }
        Commands::Validate { input } => validate_dataset(&config, &input),
        Commands::Show { report } => {
            EvaluationReport::load(&report)?.print_summary();
            Ok(())
        }
        Commands::Compare {
            baseline,
            candidate,
        } => compare_reports(&baseline, &candidate),
    }
}

async fn run_evaluation(
    mut config: Config,
    input: &Path,
    output: Option<&Path>,
    experiment: Option<String>,
    dimensions: Option<&str>,
    mock: bool,
) -> Result<()> {
    if mock {
        config.llm.provider = "mock".to_string();
    }
    if config.llm.provider == "mock" && config.llm.mock_response.is_none() {
        config.llm.mock_response = Some(MOCK_ASSESSMENT.to_string());
    }

    let dimensions = match dimensions {
        Some(list) => DimensionSet::parse_list(list)?,
        None => config.evaluation.dimension_set()?,
    };
    let template = config.evaluation.prompt_template()?;

    let records = load_dataset(input, &config.evaluation.text_column)
        .with_context(|| format!("Failed to load dataset: {}", input.display()))?;
    println!("Loaded {} labeled transcripts from {}", records.len(), input.display());

    let client = LlmClient::from_config(config.llm).context("Failed to create LLM client")?;
    info!(
        provider = client.provider(),
        model = client.model(),
        prompt_version = %template.version,
        "Scorer ready"
    );

    let mut pipeline = EvaluationPipeline::new(LlmScorer::new(client, template), dimensions)
        .with_progress_every(config.evaluation.progress_every);
    if let Some(name) = experiment {
        pipeline = pipeline.with_experiment_name(name);
    }

    let report = pipeline.run(&records).await?;
    report.print_summary();

    let sink = output.map(JsonFileSink::new);
    let outcome = publish_report(&report, sink.as_ref().map(|s| s as &dyn ReportSink));
    println!("Report {}", outcome);

    Ok(())
}

fn validate_dataset(config: &Config, input: &Path) -> Result<()> {
    let records = load_dataset(input, &config.evaluation.text_column)
        .with_context(|| format!("Failed to load dataset: {}", input.display()))?;

    DatasetSummary::from_records(&records).print_summary();
    println!("\nDataset is valid: {}", input.display());
    Ok(())
}

fn compare_reports(baseline: &Path, candidate: &Path) -> Result<()> {
    let baseline = EvaluationReport::load(baseline)?;
    let candidate = EvaluationReport::load(candidate)?;

    let comparison = ReportComparison::between(&baseline, &candidate);
    comparison.print_summary();

    if comparison.verdict == ComparisonVerdict::Worse {
        std::process::exit(1);
    }

    Ok(())
}
