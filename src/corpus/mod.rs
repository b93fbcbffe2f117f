//! Domain corpus loading and ground-truth lookup.
//!
//! The corpus holds two read-only domain sources:
//! - Malicious families: one file per family under a directory, the file
//!   stem is the family name, one domain per non-empty line.
//! - Legitimate domains: a single file, one domain per non-empty line.
//!
//! Sampling without replacement goes through an explicit [`SampleSession`]
//! so repeated test-set generation never hands out the same domain twice
//! within a session.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{EvalError, Result};

/// Ground-truth label of a domain, derived from corpus membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrueLabel {
    /// Domain belongs to a malicious family.
    Malicious,
    /// Domain belongs to the legitimate list.
    Benign,
}

/// Read-only domain corpus: malicious families plus the legitimate list.
///
/// Loaded once at startup; all lookups afterwards are in-memory set checks.
#[derive(Debug, Clone)]
pub struct DomainCorpus {
    /// Family name -> domains, ordered by name for deterministic iteration.
    families: BTreeMap<String, Vec<String>>,
    /// Union of all family domains.
    malicious: HashSet<String>,
    /// Legitimate domains in file order.
    legitimate: Vec<String>,
    /// Legitimate domains as a set.
    benign: HashSet<String>,
}

impl DomainCorpus {
    /// Load the corpus from a family directory and a legitimate-domains file.
    pub fn load(families_dir: impl AsRef<Path>, legitimate_file: impl AsRef<Path>) -> Result<Self> {
        let families = load_families(families_dir)?;
        let legitimate = load_domain_file(legitimate_file)?;

        let malicious = families.values().flatten().cloned().collect();
        let benign = legitimate.iter().cloned().collect();

        tracing::debug!(
            families = families.len(),
            legitimate = legitimate.len(),
            "corpus loaded"
        );

        Ok(Self {
            families,
            malicious,
            legitimate,
            benign,
        })
    }

    /// Family name -> domain list, ordered by family name.
    pub fn families(&self) -> &BTreeMap<String, Vec<String>> {
        &self.families
    }

    /// All malicious domains across families.
    pub fn malicious(&self) -> &HashSet<String> {
        &self.malicious
    }

    /// Legitimate domains in file order.
    pub fn legitimate(&self) -> &[String] {
        &self.legitimate
    }

    /// Legitimate domains as a set.
    pub fn benign(&self) -> &HashSet<String> {
        &self.benign
    }

    /// Ground-truth label for a domain, `None` when the corpus has never
    /// seen it (such domains are ignored by the metrics stage).
    pub fn label_of(&self, domain: &str) -> Option<TrueLabel> {
        if self.malicious.contains(domain) {
            Some(TrueLabel::Malicious)
        } else if self.benign.contains(domain) {
            Some(TrueLabel::Benign)
        } else {
            None
        }
    }
}

/// Load every family file in a directory.
///
/// The file stem is the family name; each non-empty trimmed line is a domain.
pub fn load_families(dir: impl AsRef<Path>) -> Result<BTreeMap<String, Vec<String>>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(EvalError::NotFound(format!(
            "families directory '{}'",
            dir.display()
        )));
    }

    let mut families = BTreeMap::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        families.insert(name.to_string(), load_domain_file(&path)?);
    }

    Ok(families)
}

/// Load one domain per non-empty trimmed line from a file.
pub fn load_domain_file(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(EvalError::NotFound(format!(
            "domain file '{}'",
            path.display()
        )));
    }

    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Tracks domains already allocated within one generation session.
///
/// Scoped to a single prompt-generation invocation: the assembler resets it
/// at the start of a full generation, and every sampling operation claims
/// its picks here before returning them.
#[derive(Debug, Default)]
pub struct SampleSession {
    used: HashSet<String>,
}

impl SampleSession {
    /// Start a fresh session with no domains claimed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all claimed domains.
    pub fn reset(&mut self) {
        self.used.clear();
    }

    /// Whether a domain has already been claimed this session.
    pub fn is_used(&self, domain: &str) -> bool {
        self.used.contains(domain)
    }

    /// Number of domains claimed so far.
    pub fn claimed(&self) -> usize {
        self.used.len()
    }

    /// Draw `count` domains uniformly at random without replacement from the
    /// unused portion of `pool`, claiming them in the session.
    ///
    /// `pool_name` only feeds the error message. Fails with
    /// [`EvalError::InsufficientDomains`] when fewer than `count` unused
    /// domains remain.
    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        pool_name: &str,
        pool: &[String],
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<String>> {
        let available: Vec<&String> = pool.iter().filter(|d| !self.is_used(d)).collect();
        if available.len() < count {
            return Err(EvalError::InsufficientDomains {
                pool: pool_name.to_string(),
                requested: count,
                available: available.len(),
            });
        }

        let selected: Vec<String> = available
            .choose_multiple(rng, count)
            .map(|d| (*d).clone())
            .collect();
        self.used.extend(selected.iter().cloned());
        Ok(selected)
    }
}
