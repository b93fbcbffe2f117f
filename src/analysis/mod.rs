//! Response analysis: completion validation and metrics aggregation.
//!
//! [`Analyzer`] ties the stages together over a transcript file:
//! parse → validate coverage → scan the confusion matrix → derive three
//! metric sets (malicious-only, benign-only, overall). Everything is
//! recomputed fresh on every pass; nothing is cached between calls.

pub mod confusion;
pub mod metrics;
pub mod validator;

use std::path::{Path, PathBuf};

pub use confusion::{
    scan_classifications, ClassificationRecord, ConfusionCounts, ConfusionScan, Verdict,
};
pub use metrics::Metrics;
pub use validator::{validate, ValidationReport};

use crate::corpus::DomainCorpus;
use crate::error::Result;
use crate::report::{parse_transcript, read_transcript};
use crate::storage;

/// Metrics for one model over one experiment, per class view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisReport {
    /// Metrics over malicious-family domains only.
    pub malicious: Metrics,
    /// Metrics over legitimate domains only (benign as positive class).
    pub benign: Metrics,
    /// Metrics over the full confusion matrix.
    pub overall: Metrics,
    /// The underlying counts.
    pub counts: ConfusionCounts,
}

/// Analyzes transcript files against the ground-truth corpus.
#[derive(Debug)]
pub struct Analyzer {
    corpus: DomainCorpus,
    format_error_log: PathBuf,
}

impl Analyzer {
    /// Create an analyzer over a corpus. Malformed classification lines are
    /// appended to `format_error_log`.
    pub fn new(corpus: DomainCorpus, format_error_log: impl Into<PathBuf>) -> Self {
        Self {
            corpus,
            format_error_log: format_error_log.into(),
        }
    }

    /// The ground-truth corpus.
    pub fn corpus(&self) -> &DomainCorpus {
        &self.corpus
    }

    /// Check whether every domain sent in `transcript` has been answered.
    ///
    /// When domains are missing, they are written to `missing_file` as a
    /// JSON array for a follow-up round; when coverage is complete, a stale
    /// `missing_file` from an earlier round is removed.
    pub fn check(&self, transcript: impl AsRef<Path>, missing_file: impl AsRef<Path>) -> Result<bool> {
        let parsed = parse_transcript(&read_transcript(transcript)?);
        let report = validate(&parsed.sent_domains, &parsed.classification_lines);

        if report.complete {
            storage::remove_if_exists(missing_file)?;
        } else {
            tracing::warn!(missing = report.missing.len(), "unanswered domains");
            storage::save_json(missing_file, &report.missing)?;
        }
        Ok(report.complete)
    }

    /// Analyze a transcript file and derive metrics for the first `limit`
    /// classification lines.
    pub fn analyze(&self, transcript: impl AsRef<Path>, limit: usize) -> Result<AnalysisReport> {
        let parsed = parse_transcript(&read_transcript(transcript)?);
        let lines = &parsed.classification_lines[..parsed.classification_lines.len().min(limit)];

        let scan = scan_classifications(
            lines.iter().map(String::as_str),
            self.corpus.malicious(),
            self.corpus.benign(),
        );
        if !scan.malformed.is_empty() {
            tracing::warn!(count = scan.malformed.len(), "malformed classification lines");
            storage::append_lines(&self.format_error_log, &scan.malformed)?;
        }

        let counts = scan.counts;
        tracing::info!(
            tp = counts.tp,
            fp = counts.fp,
            fn_count = counts.fn_count,
            tn = counts.tn,
            "confusion matrix"
        );

        Ok(AnalysisReport {
            malicious: Metrics::from_counts(&counts.malicious_view()),
            benign: Metrics::from_counts(&counts.benign_view()),
            overall: Metrics::from_counts(&counts),
            counts,
        })
    }
}
