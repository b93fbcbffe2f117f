//! # AGD-Eval - LLM Domain-Classification Benchmark
//!
//! Evaluates language models on binary classification of internet domain
//! names: algorithmically generated (malicious) versus legitimate. The
//! harness builds batched prompts from a domain corpus, collects model
//! responses into append-only transcripts, recovers structured verdicts
//! from the free-text output, and aggregates confusion-matrix metrics per
//! model.
//!
//! ## Pipeline
//!
//! ```text
//! DomainCorpus ──> PromptAssembler ──> ModelProvider (batched chat)
//!                                            │
//!                                            v
//!                              transcript (append-only .out file)
//!                                            │
//!                  parse_transcript <────────┘
//!                         │
//!                         v
//!                  validate coverage ── incomplete ──> missing-domains JSON
//!                         │                                  │
//!                      complete                        resubmit round
//!                         v
//!                  confusion scan ──> Metrics ──> per-experiment CSVs
//! ```
//!
//! ## Transcript wire format
//!
//! Each answered batch occupies one block in the transcript:
//!
//! ```text
//! d1.com, d2.com
//! ---------------
//! d1.com|Y|0.9
//! d2.com|N|0.8
//! ***************
//! ```
//!
//! Classification lines are `domain|verdict|confidence` with verdict `Y`
//! (malicious) or `N` (benign). Malformed lines go to a format-error log;
//! any other verdict token scores as the wrong class for the domain's true
//! label. Metric ratios with zero denominators evaluate to 0.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agdeval::{Config, Runner, OpenAiCompatProvider};
//!
//! let mut config = Config::from_file("agdeval.toml")?;
//! config.apply_env();
//!
//! let runner = Runner::from_config(config.clone())?;
//! let prompt = runner.prepare(&mut rand::thread_rng())?;
//!
//! for model in &config.provider.models {
//!     let provider = OpenAiCompatProvider::new(
//!         &config.provider.base_url,
//!         config.api_key()?,
//!         model,
//!         config.provider.timeout(),
//!     )?;
//!     runner.run(&provider, &prompt)?;
//!     runner.resubmit(&provider, &prompt)?;
//!     runner.report(model)?;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`corpus`]: Family/legitimate domain loading and sampling sessions
//! - [`prompt`]: Prompt assembly and interleaved test-set construction
//! - [`report`]: Transcript writer and parser
//! - [`analysis`]: Completion validation, confusion scan, metric derivation
//! - [`provider`]: Model-call contract and HTTP implementations
//! - [`runner`]: Experiment driver
//! - [`storage`]: JSON caches, logs, and metrics CSVs
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result alias

pub mod analysis;
pub mod config;
pub mod corpus;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod report;
pub mod runner;
pub mod storage;

// Re-exports for convenience
pub use analysis::{AnalysisReport, Analyzer, ConfusionCounts, Metrics, ValidationReport};
pub use config::Config;
pub use corpus::{DomainCorpus, SampleSession, TrueLabel};
pub use error::{EvalError, Result};
pub use prompt::{AssembledPrompt, AssemblySpec, PromptAssembler, SectionLibrary};
pub use provider::{ChatMessage, ModelProvider, OpenAiCompatProvider};
pub use report::{parse_transcript, ParsedTranscript};
pub use runner::Runner;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
