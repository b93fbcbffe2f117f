//! Prompt assembly and test-set construction.
//!
//! A prompt is built from ordered text sections (starting / middle /
//! optional training block / final) read from a section library on disk.
//! The test set interleaves one domain per malicious family per cycle with
//! a near-even spread of legitimate domains, so no family clusters at one
//! end of the batch stream.

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::corpus::{DomainCorpus, SampleSession};
use crate::error::{EvalError, Result};

/// Section kinds within a [`SectionLibrary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Opening instructions.
    Starting,
    /// Optional experiment-specific middle sections.
    Middle,
    /// Closing instructions (output format contract).
    Final,
}

/// On-disk library of prompt section files.
///
/// Layout mirrors the experiment material: one subdirectory per section
/// kind, each holding named text files.
#[derive(Debug, Clone)]
pub struct SectionLibrary {
    starting: PathBuf,
    middle: PathBuf,
    finals: PathBuf,
}

impl SectionLibrary {
    /// Open a section library rooted at `base`, validating that all three
    /// section directories exist.
    pub fn open(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref();
        let library = Self {
            starting: base.join("StartingPoints"),
            middle: base.join("Prompt4Experiments"),
            finals: base.join("EndingPoints"),
        };

        for dir in [&library.starting, &library.middle, &library.finals] {
            if !dir.is_dir() {
                return Err(EvalError::NotFound(format!(
                    "section directory '{}'",
                    dir.display()
                )));
            }
        }
        Ok(library)
    }

    /// Read a named section file, trimmed.
    pub fn read(&self, section: Section, filename: &str) -> Result<String> {
        let dir = match section {
            Section::Starting => &self.starting,
            Section::Middle => &self.middle,
            Section::Final => &self.finals,
        };
        let path = dir.join(filename);
        if !path.is_file() {
            return Err(EvalError::NotFound(format!(
                "section file '{}'",
                path.display()
            )));
        }
        Ok(fs::read_to_string(path)?.trim().to_string())
    }
}

/// What to assemble: section file names plus sample counts.
#[derive(Debug, Clone)]
pub struct AssemblySpec {
    /// Starting section file name.
    pub starting: String,
    /// Middle section file names, in order. May be empty.
    pub middle: Vec<String>,
    /// Final section file name.
    pub finals: String,
    /// Training samples per family; 0 skips the training block.
    pub train_samples_per_family: usize,
    /// Test domains drawn per family.
    pub test_domains_per_family: usize,
    /// Legitimate domains spread across the test list.
    pub legitimate_count: usize,
}

/// A fully assembled prompt plus the test domains it covers.
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    /// Complete explanation prompt text.
    pub text: String,
    /// Interleaved test-domain list, to be sent in batches.
    pub test_domains: Vec<String>,
}

/// Assembles prompts and test sets from a [`SectionLibrary`] and a
/// [`DomainCorpus`].
#[derive(Debug)]
pub struct PromptAssembler {
    library: SectionLibrary,
    corpus: DomainCorpus,
}

impl PromptAssembler {
    /// Create an assembler over a section library and corpus.
    pub fn new(library: SectionLibrary, corpus: DomainCorpus) -> Self {
        Self { library, corpus }
    }

    /// The corpus behind this assembler.
    pub fn corpus(&self) -> &DomainCorpus {
        &self.corpus
    }

    /// Assemble a complete prompt and its test-domain list.
    ///
    /// Resets `session` first, then claims every sampled domain in it, so a
    /// follow-up [`assemble_test_domains`](Self::assemble_test_domains) call
    /// within the same session can never hand out an already-used domain.
    pub fn assemble<R: Rng + ?Sized>(
        &self,
        session: &mut SampleSession,
        rng: &mut R,
        spec: &AssemblySpec,
    ) -> Result<AssembledPrompt> {
        session.reset();

        let mut sections = Vec::new();
        sections.push(self.library.read(Section::Starting, &spec.starting)?);
        for name in &spec.middle {
            sections.push(self.library.read(Section::Middle, name)?);
        }
        if spec.train_samples_per_family > 0 {
            sections.push(self.training_block(session, rng, spec.train_samples_per_family)?);
        }
        sections.push(self.library.read(Section::Final, &spec.finals)?);

        let test_domains = self.assemble_test_domains(
            session,
            rng,
            spec.test_domains_per_family,
            spec.legitimate_count,
        )?;

        tracing::info!(
            sections = sections.len(),
            test_domains = test_domains.len(),
            "prompt assembled"
        );

        Ok(AssembledPrompt {
            text: sections.join("\n\n"),
            test_domains,
        })
    }

    /// Format a training block: per family, `train_per_family` sampled
    /// domains as a `family: d1, d2, ...;` line.
    fn training_block<R: Rng + ?Sized>(
        &self,
        session: &mut SampleSession,
        rng: &mut R,
        train_per_family: usize,
    ) -> Result<String> {
        let mut lines = Vec::new();
        for (family, domains) in self.corpus.families() {
            let selected = session.sample(family, domains, train_per_family, rng)?;
            lines.push(format!("{family}: {};", selected.join(", ")));
        }
        Ok(lines.join("\n"))
    }

    /// Build the interleaved test-domain list.
    ///
    /// Runs `per_family` cycles. Each cycle takes one domain from every
    /// family, then `legitimate_count / per_family` legitimate domains, with
    /// one extra legitimate domain in each of the first
    /// `legitimate_count % per_family` cycles. Every sampled domain is
    /// claimed in `session`.
    pub fn assemble_test_domains<R: Rng + ?Sized>(
        &self,
        session: &mut SampleSession,
        rng: &mut R,
        per_family: usize,
        legitimate_count: usize,
    ) -> Result<Vec<String>> {
        let mut family_picks = Vec::new();
        for (family, domains) in self.corpus.families() {
            family_picks.push(session.sample(family, domains, per_family, rng)?);
        }

        let mut legitimate = session
            .sample("legitimate", self.corpus.legitimate(), legitimate_count, rng)?
            .into_iter();

        if per_family == 0 {
            return Ok(Vec::new());
        }
        let per_cycle = legitimate_count / per_family;
        let mut leftover = legitimate_count % per_family;

        let mut interleaved = Vec::with_capacity(
            family_picks.len() * per_family + legitimate_count,
        );
        for cycle in 0..per_family {
            for picks in &family_picks {
                interleaved.push(picks[cycle].clone());
            }
            interleaved.extend(legitimate.by_ref().take(per_cycle));
            if leftover > 0 {
                if let Some(extra) = legitimate.next() {
                    interleaved.push(extra);
                    leftover -= 1;
                }
            }
        }

        Ok(interleaved)
    }
}

/// Render a domain batch as it is embedded in outgoing prompts.
pub fn render_batch(domains: &[String]) -> String {
    domains.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;
    use std::io::Write;

    fn fixture() -> (tempfile::TempDir, PromptAssembler) {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path();

        for dir in ["StartingPoints", "Prompt4Experiments", "EndingPoints"] {
            fs::create_dir(base.join(dir)).unwrap();
        }
        fs::write(base.join("StartingPoints/Start.txt"), "START\n").unwrap();
        fs::write(base.join("Prompt4Experiments/Mid.txt"), "MIDDLE\n").unwrap();
        fs::write(base.join("EndingPoints/End.txt"), "END\n").unwrap();

        let fam_dir = base.join("families");
        fs::create_dir(&fam_dir).unwrap();
        for fam in ["alpha", "beta"] {
            let mut f = fs::File::create(fam_dir.join(format!("{fam}.csv"))).unwrap();
            for i in 0..20 {
                writeln!(f, "{fam}{i}.bad").unwrap();
            }
        }
        let mut f = fs::File::create(base.join("legit.csv")).unwrap();
        for i in 0..30 {
            writeln!(f, "legit{i}.com").unwrap();
        }

        let library = SectionLibrary::open(base).unwrap();
        let corpus = DomainCorpus::load(&fam_dir, base.join("legit.csv")).unwrap();
        (tmp, PromptAssembler::new(library, corpus))
    }

    fn spec() -> AssemblySpec {
        AssemblySpec {
            starting: "Start.txt".into(),
            middle: vec!["Mid.txt".into()],
            finals: "End.txt".into(),
            train_samples_per_family: 0,
            test_domains_per_family: 3,
            legitimate_count: 7,
        }
    }

    #[test]
    fn test_sections_joined_with_blank_line() {
        let (_tmp, assembler) = fixture();
        let mut session = SampleSession::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let prompt = assembler.assemble(&mut session, &mut rng, &spec()).unwrap();
        assert_eq!(prompt.text, "START\n\nMIDDLE\n\nEND");
    }

    #[test]
    fn test_training_block_included_when_requested() {
        let (_tmp, assembler) = fixture();
        let mut session = SampleSession::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut with_train = spec();
        with_train.train_samples_per_family = 2;
        let prompt = assembler
            .assemble(&mut session, &mut rng, &with_train)
            .unwrap();

        let block = prompt
            .text
            .split("\n\n")
            .find(|s| s.starts_with("alpha: "))
            .expect("training block present");
        assert!(block.contains("beta: "));
        assert!(block.ends_with(';'));
    }

    #[test]
    fn test_interleaving_counts() {
        // 3 per family * 2 families + 7 legitimate = 13 domains total,
        // 2 legitimate per cycle plus 1 extra in the first cycle (7 = 3*2+1).
        let (_tmp, assembler) = fixture();
        let mut session = SampleSession::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let domains = assembler
            .assemble_test_domains(&mut session, &mut rng, 3, 7)
            .unwrap();
        assert_eq!(domains.len(), 13);

        let legit_in = |range: &[String]| {
            range.iter().filter(|d| d.starts_with("legit")).count()
        };
        // Cycle layout: fam, fam, then 2 or 3 legitimate.
        assert_eq!(legit_in(&domains[0..2]), 0);
        assert_eq!(legit_in(&domains), 7);
        // First cycle gets the extra legitimate domain.
        assert_eq!(legit_in(&domains[2..5]), 3);
        assert_eq!(legit_in(&domains[7..9]), 2);
    }

    #[test]
    fn test_no_overlap_across_calls_in_one_session() {
        let (_tmp, assembler) = fixture();
        let mut session = SampleSession::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let first = assembler
            .assemble_test_domains(&mut session, &mut rng, 2, 4)
            .unwrap();
        let second = assembler
            .assemble_test_domains(&mut session, &mut rng, 2, 4)
            .unwrap();

        let first_set: HashSet<_> = first.iter().collect();
        assert!(second.iter().all(|d| !first_set.contains(d)));
    }

    #[test]
    fn test_no_domain_repeats_within_one_list() {
        let (_tmp, assembler) = fixture();
        let mut session = SampleSession::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let domains = assembler
            .assemble_test_domains(&mut session, &mut rng, 5, 11)
            .unwrap();
        let unique: HashSet<_> = domains.iter().collect();
        assert_eq!(unique.len(), domains.len());
    }

    #[test]
    fn test_insufficient_family_pool_fails() {
        let (_tmp, assembler) = fixture();
        let mut session = SampleSession::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let err = assembler
            .assemble_test_domains(&mut session, &mut rng, 25, 0)
            .unwrap_err();
        assert!(matches!(err, EvalError::InsufficientDomains { .. }));
    }

    #[test]
    fn test_missing_section_file_fails() {
        let (_tmp, assembler) = fixture();
        let mut session = SampleSession::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let mut bad = spec();
        bad.starting = "Missing.txt".into();
        let err = assembler.assemble(&mut session, &mut rng, &bad).unwrap_err();
        assert!(matches!(err, EvalError::NotFound(_)));
    }

    #[test]
    fn test_render_batch() {
        let domains = vec!["a.com".to_string(), "b.net".to_string()];
        assert_eq!(render_batch(&domains), "a.com, b.net");
    }
}
