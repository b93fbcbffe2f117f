//! Completion validation: did every sent domain get a classification?

use std::collections::HashSet;

/// Outcome of cross-checking sent domains against classification lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// True when every sent domain was answered.
    pub complete: bool,
    /// De-duplicated unanswered domains, in first-sent order. Persisted for
    /// a follow-up submission round when non-empty.
    pub missing: Vec<String>,
}

/// Cross-check sent domains against classification lines.
///
/// A line answers the domain given by its text before the first `|`.
/// Lines without a pipe simply answer nothing meaningful; they are not
/// treated as errors here. Sent domains are de-duplicated before the check.
pub fn validate(sent_domains: &[String], classification_lines: &[String]) -> ValidationReport {
    let answered: HashSet<&str> = classification_lines
        .iter()
        .filter_map(|line| line.split('|').next())
        .collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut missing = Vec::new();
    for domain in sent_domains {
        if !seen.insert(domain.as_str()) {
            continue;
        }
        if !answered.contains(domain.as_str()) {
            missing.push(domain.clone());
        }
    }

    ValidationReport {
        complete: missing.is_empty(),
        missing,
    }
}
