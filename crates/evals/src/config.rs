//! Configuration for `spin-eval`
//!
//! Read from TOML. The file is located by `--config`, then the
//! `SPIN_EVAL_CONFIG` environment variable, then
//! `<config dir>/spin-eval/config.toml`. A missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use llm::LlmConfig;
use serde::{Deserialize, Serialize};

use crate::dataset::DEFAULT_TEXT_COLUMN;
use crate::dimension::{Dimension, DimensionSet};
use crate::pipeline::DEFAULT_PROGRESS_EVERY;
use crate::prompts::PromptTemplate;

const APP_NAME: &str = "spin-eval";

/// Environment variable pointing at a config file
pub const CONFIG_ENV_VAR: &str = "SPIN_EVAL_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Dimensions to evaluate, all seven when unset
    #[serde(default)]
    pub dimensions: Option<Vec<Dimension>>,
    /// CSV column holding the transcript text
    #[serde(default = "default_text_column")]
    pub text_column: String,
    /// TOML prompt template replacing the built-in one
    #[serde(default)]
    pub prompt_template: Option<PathBuf>,
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

fn default_text_column() -> String {
    DEFAULT_TEXT_COLUMN.to_string()
}

fn default_progress_every() -> usize {
    DEFAULT_PROGRESS_EVERY
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            dimensions: None,
            text_column: default_text_column(),
            prompt_template: None,
            progress_every: default_progress_every(),
        }
    }
}

impl EvaluationConfig {
    pub fn dimension_set(&self) -> Result<DimensionSet> {
        match &self.dimensions {
            Some(dims) => Ok(DimensionSet::new(dims.iter().copied())?),
            None => Ok(DimensionSet::spin()),
        }
    }

    pub fn prompt_template(&self) -> Result<PromptTemplate> {
        match &self.prompt_template {
            Some(path) => PromptTemplate::load(path),
            None => Ok(PromptTemplate::default()),
        }
    }
}

pub fn get_config_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .context("Could not determine config directory")
}

/// Resolve which config file to read
pub fn get_config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }
    Ok(get_config_dir()?.join("config.toml"))
}

/// Load the config, applying LLM environment overrides
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let config_file = get_config_file(explicit)?;
    let mut config = load_config_file(&config_file)?;
    config.llm = config.llm.with_env_overrides();
    Ok(config)
}

fn load_config_file(config_file: &Path) -> Result<Config> {
    if !config_file.exists() {
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(config_file)
        .with_context(|| format!("Failed to read config file: {}", config_file.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", config_file.display()))
}
