//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables (`AGDEVAL_*` overrides)

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Experiment definition
    #[serde(default)]
    pub experiment: ExperimentConfig,

    /// Source material and output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Model provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| EvalError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| EvalError::Config(format!("Failed to parse config: {e}")))
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(id) = std::env::var("AGDEVAL_EXPERIMENT") {
            if let Ok(id) = id.parse() {
                self.experiment.id = id;
            }
        }
        if let Ok(size) = std::env::var("AGDEVAL_BATCH_SIZE") {
            if let Ok(size) = size.parse() {
                self.experiment.batch_size = size;
            }
        }
        if let Ok(dir) = std::env::var("AGDEVAL_OUTPUT_DIR") {
            self.paths.output_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("AGDEVAL_BASE_URL") {
            self.provider.base_url = url;
        }
    }

    /// Resolve the provider API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.provider.api_key_env).map_err(|_| {
            EvalError::Config(format!(
                "API key environment variable '{}' not set",
                self.provider.api_key_env
            ))
        })
    }
}

/// One experiment: which prompt sections to use and how many domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Experiment identifier, used in file names.
    pub id: u32,

    /// Domains per request batch.
    pub batch_size: usize,

    /// Starting section file name.
    pub starting_prompt: String,

    /// Middle section file names, in order.
    pub middle_prompts: Vec<String>,

    /// Final section file name.
    pub final_prompt: String,

    /// Training samples per family (0 = no training block).
    pub train_samples_per_family: usize,

    /// Test domains drawn per family.
    pub test_domains_per_family: usize,

    /// Legitimate domains spread across the test list.
    pub legitimate_count: usize,

    /// Cap on classification lines consumed during analysis.
    pub analysis_limit: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            id: 1,
            batch_size: 125,
            starting_prompt: "StartBase.txt".to_string(),
            middle_prompts: Vec::new(),
            final_prompt: "EndBinary.txt".to_string(),
            train_samples_per_family: 0,
            test_domains_per_family: 1000,
            legitimate_count: 25000,
            analysis_limit: 100_000,
        }
    }
}

/// Source material and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Prompt section library root.
    pub prompt_dir: PathBuf,

    /// Directory of malicious family files.
    pub families_dir: PathBuf,

    /// Legitimate-domains file.
    pub legitimate_file: PathBuf,

    /// Cached prompt/test-set JSON.
    pub dataset_dir: PathBuf,

    /// Model transcripts.
    pub output_dir: PathBuf,

    /// Metrics CSV files.
    pub metrics_dir: PathBuf,

    /// Missing-domain JSON files for follow-up rounds.
    pub retry_dir: PathBuf,

    /// Append-only log of malformed classification lines.
    pub format_error_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            prompt_dir: PathBuf::from("prompts"),
            families_dir: PathBuf::from("prompts/datasetAGDFamilies"),
            legitimate_file: PathBuf::from("prompts/legitimateDomains/domains.csv"),
            dataset_dir: PathBuf::from("dataset"),
            output_dir: PathBuf::from("output"),
            metrics_dir: PathBuf::from("metrics"),
            retry_dir: PathBuf::from("try_again_domains"),
            format_error_file: PathBuf::from("format_error.txt"),
        }
    }
}

/// Model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API root for OpenAI-compatible endpoints.
    pub base_url: String,

    /// Name of the environment variable holding the API key.
    pub api_key_env: String,

    /// Models to evaluate.
    pub models: Vec<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Retries per request before giving up.
    pub max_retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            models: Vec::new(),
            timeout_secs: 300,
            max_retries: 3,
        }
    }
}

impl ProviderConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
