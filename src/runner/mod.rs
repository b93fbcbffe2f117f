//! Experiment driver.
//!
//! Wires the pipeline together for one experiment: generate (or reload) the
//! prompt and test set, stream batches through a model provider into its
//! transcript, resubmit unanswered domains, and emit the metrics CSV rows.

use std::path::PathBuf;

use rand::Rng;

use crate::analysis::{Analyzer, AnalysisReport};
use crate::config::Config;
use crate::corpus::{DomainCorpus, SampleSession};
use crate::error::Result;
use crate::prompt::{render_batch, AssembledPrompt, AssemblySpec, PromptAssembler, SectionLibrary};
use crate::provider::{craft_history, ModelProvider};
use crate::report::append_result_block;
use crate::storage;

/// Drives one experiment end to end.
#[derive(Debug)]
pub struct Runner {
    config: Config,
    assembler: PromptAssembler,
    analyzer: Analyzer,
}

impl Runner {
    /// Build a runner from configuration, loading the section library and
    /// the domain corpus.
    pub fn from_config(config: Config) -> Result<Self> {
        let library = SectionLibrary::open(&config.paths.prompt_dir)?;
        let corpus = DomainCorpus::load(&config.paths.families_dir, &config.paths.legitimate_file)?;
        let analyzer = Analyzer::new(corpus.clone(), &config.paths.format_error_file);
        Ok(Self {
            config,
            assembler: PromptAssembler::new(library, corpus),
            analyzer,
        })
    }

    /// The effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn assembly_spec(&self) -> AssemblySpec {
        let exp = &self.config.experiment;
        AssemblySpec {
            starting: exp.starting_prompt.clone(),
            middle: exp.middle_prompts.clone(),
            finals: exp.final_prompt.clone(),
            train_samples_per_family: exp.train_samples_per_family,
            test_domains_per_family: exp.test_domains_per_family,
            legitimate_count: exp.legitimate_count,
        }
    }

    fn prompt_cache(&self) -> PathBuf {
        self.config
            .paths
            .dataset_dir
            .join(self.config.experiment.id.to_string())
            .join("prompt.json")
    }

    fn samples_cache(&self) -> PathBuf {
        self.config
            .paths
            .dataset_dir
            .join(self.config.experiment.id.to_string())
            .join("samples.json")
    }

    /// Transcript file for one model.
    pub fn transcript_path(&self, model: &str) -> PathBuf {
        self.config
            .paths
            .output_dir
            .join(format!("{}_EXP{}.out", file_stem(model), self.config.experiment.id))
    }

    /// Missing-domains JSON file for one model.
    pub fn missing_path(&self, model: &str) -> PathBuf {
        self.config
            .paths
            .retry_dir
            .join(format!("{}_EXP{}.json", file_stem(model), self.config.experiment.id))
    }

    /// Load the cached prompt and test set, or generate and cache them.
    ///
    /// The cache makes the test set stable across models and re-runs: every
    /// model in an experiment classifies the same domains.
    pub fn prepare<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<AssembledPrompt> {
        let cached_text: Option<String> = storage::load_json(self.prompt_cache())?;
        let cached_samples: Option<Vec<String>> = storage::load_json(self.samples_cache())?;

        if let (Some(text), Some(test_domains)) = (cached_text, cached_samples) {
            tracing::info!(domains = test_domains.len(), "loaded cached test set");
            return Ok(AssembledPrompt { text, test_domains });
        }

        let mut session = SampleSession::new();
        let prompt = self
            .assembler
            .assemble(&mut session, rng, &self.assembly_spec())?;

        storage::save_json(self.prompt_cache(), &prompt.text)?;
        storage::save_json(self.samples_cache(), &prompt.test_domains)?;
        Ok(prompt)
    }

    /// Send `domains` to the provider in batches, appending each
    /// request/response pair to the model's transcript.
    fn submit_batches(
        &self,
        provider: &dyn ModelProvider,
        explanation: &str,
        domains: &[String],
    ) -> Result<()> {
        let history = craft_history(explanation, "yes");
        let transcript = self.transcript_path(provider.model());
        if let Some(parent) = transcript.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let batch_size = self.config.experiment.batch_size.max(1);
        let total = domains.len().div_ceil(batch_size);
        for (index, chunk) in domains.chunks(batch_size).enumerate() {
            let batch = render_batch(chunk);
            tracing::info!(
                model = provider.model(),
                chunk = index + 1,
                total,
                domains = chunk.len(),
                "submitting batch"
            );
            let (response, _) = provider.chat(&batch, &history)?;
            append_result_block(&transcript, &batch, &response)?;
        }
        Ok(())
    }

    /// First-round run: submit the full test set to one model.
    pub fn run(&self, provider: &dyn ModelProvider, prompt: &AssembledPrompt) -> Result<()> {
        tracing::info!(
            model = provider.model(),
            total = prompt.test_domains.len(),
            "running experiment"
        );
        self.submit_batches(provider, &prompt.text, &prompt.test_domains)
    }

    /// Follow-up rounds: resubmit unanswered domains until coverage is
    /// complete.
    pub fn resubmit(&self, provider: &dyn ModelProvider, prompt: &AssembledPrompt) -> Result<()> {
        let transcript = self.transcript_path(provider.model());
        let missing_file = self.missing_path(provider.model());

        while !self.analyzer.check(&transcript, &missing_file)? {
            let missing: Vec<String> = storage::load_json(&missing_file)?.unwrap_or_default();
            tracing::info!(
                model = provider.model(),
                missing = missing.len(),
                "resubmitting unanswered domains"
            );
            self.submit_batches(provider, &prompt.text, &missing)?;
        }
        Ok(())
    }

    /// Analyze one model's transcript and append its metrics rows.
    ///
    /// Returns `None` (without touching the CSVs) when some domains are
    /// still unanswered; the missing-domains file then lists them.
    pub fn report(&self, model: &str) -> Result<Option<AnalysisReport>> {
        let transcript = self.transcript_path(model);
        let missing_file = self.missing_path(model);

        if !self.analyzer.check(&transcript, &missing_file)? {
            tracing::warn!(
                model,
                missing_file = %missing_file.display(),
                "unclassified domains remain; skipping metrics"
            );
            return Ok(None);
        }

        let report = self
            .analyzer
            .analyze(&transcript, self.config.experiment.analysis_limit)?;

        let id = self.config.experiment.id;
        let metrics_dir = &self.config.paths.metrics_dir;
        storage::append_metrics_row(
            metrics_dir.join(format!("GLOBAL_EXP{id}.csv")),
            model,
            &report.overall,
        )?;
        storage::append_metrics_row(
            metrics_dir.join(format!("MALICIOUS_EXP{id}.csv")),
            model,
            &report.malicious,
        )?;
        storage::append_metrics_row(
            metrics_dir.join(format!("BENIGN_EXP{id}.csv")),
            model,
            &report.benign,
        )?;

        tracing::info!(model, overall = %report.overall, "metrics written");
        Ok(Some(report))
    }
}

/// Model identifier as a file-name stem (slashes and colons replaced).
fn file_stem(model: &str) -> String {
    model.replace(['/', ':'], "-")
}
