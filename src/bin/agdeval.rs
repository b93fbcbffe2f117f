//! AGD-Eval CLI binary.
//!
//! Benchmark LLM binary classification of algorithmically generated domains.
//!
//! # Commands
//!
//! - `generate` - Assemble (or reload) the prompt and cached test set
//! - `run` - Submit the test set to the configured models
//! - `retry` - Resubmit unanswered domains until coverage is complete
//! - `analyze` - Validate coverage and append metrics CSV rows

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use agdeval::{Config, OpenAiCompatProvider, Runner, VERSION};

#[derive(Parser)]
#[command(name = "agdeval")]
#[command(version = VERSION)]
#[command(about = "LLM domain-classification benchmark", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "agdeval.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the prompt and test set, caching them under the dataset dir
    Generate,

    /// Submit the test set to models and record transcripts
    Run {
        /// Only run this model (default: every configured model)
        #[arg(short, long)]
        model: Option<String>,

        /// Skip the automatic resubmission rounds after the first pass
        #[arg(long)]
        no_retry: bool,
    },

    /// Resubmit unanswered domains for models with incomplete transcripts
    Retry {
        /// Only retry this model
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Validate coverage and append metrics rows for each model
    Analyze {
        /// Only analyze this model
        #[arg(short, long)]
        model: Option<String>,
    },
}

fn selected_models(config: &Config, only: Option<String>) -> Vec<String> {
    match only {
        Some(model) => vec![model],
        None => config.provider.models.clone(),
    }
}

fn provider_for(config: &Config, model: &str) -> anyhow::Result<OpenAiCompatProvider> {
    let provider = OpenAiCompatProvider::new(
        &config.provider.base_url,
        config.api_key()?,
        model,
        config.provider.timeout(),
    )?
    .with_max_retries(config.provider.max_retries);
    Ok(provider)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_file(&cli.config)
        .with_context(|| format!("loading config '{}'", cli.config.display()))?;
    config.apply_env();

    let runner = Runner::from_config(config.clone())?;
    let mut rng = rand::thread_rng();

    match cli.command {
        Commands::Generate => {
            let prompt = runner.prepare(&mut rng)?;
            println!(
                "prompt: {} chars, test set: {} domains",
                prompt.text.len(),
                prompt.test_domains.len()
            );
        }

        Commands::Run { model, no_retry } => {
            let prompt = runner.prepare(&mut rng)?;
            for model in selected_models(&config, model) {
                let provider = provider_for(&config, &model)?;
                runner.run(&provider, &prompt)?;
                if !no_retry {
                    runner.resubmit(&provider, &prompt)?;
                }
            }
        }

        Commands::Retry { model } => {
            let prompt = runner.prepare(&mut rng)?;
            for model in selected_models(&config, model) {
                let provider = provider_for(&config, &model)?;
                runner.resubmit(&provider, &prompt)?;
            }
        }

        Commands::Analyze { model } => {
            for model in selected_models(&config, model) {
                match runner.report(&model)? {
                    Some(report) => {
                        println!("{model}: {}", report.overall);
                    }
                    None => {
                        println!(
                            "{model}: unclassified domains remain, see {}",
                            runner.missing_path(&model).display()
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
