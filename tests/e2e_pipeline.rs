//! End-to-end pipeline test with a scripted model provider.
//!
//! Drives one full experiment against a fake provider: prepare (generate +
//! cache), run in batches, drop one answer to force a resubmission round,
//! then analyze and check the emitted metrics CSVs.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use agdeval::error::Result;
use agdeval::{ChatMessage, Config, ModelProvider, Runner};

/// Answers every domain correctly (`Y` for `.bad`, `N` otherwise), except
/// that the very first domain it ever sees is silently dropped once.
struct ScriptedProvider {
    skipped: RefCell<Option<()>>,
}

impl ScriptedProvider {
    fn new() -> Self {
        Self {
            skipped: RefCell::new(None),
        }
    }
}

impl ModelProvider for ScriptedProvider {
    fn model(&self) -> &str {
        "scripted-model"
    }

    fn chat(&self, prompt: &str, history: &[ChatMessage]) -> Result<(String, Vec<ChatMessage>)> {
        assert_eq!(history.len(), 2, "history seeded with explanation + ack");

        let mut lines = Vec::new();
        for domain in prompt.split(',').map(str::trim) {
            if self.skipped.borrow().is_none() {
                *self.skipped.borrow_mut() = Some(());
                continue;
            }
            let verdict = if domain.ends_with(".bad") { "Y" } else { "N" };
            lines.push(format!("{domain}|{verdict}|0.9"));
        }

        let reply = lines.join("\n");
        let mut updated = history.to_vec();
        updated.push(ChatMessage::user(prompt));
        updated.push(ChatMessage::assistant(reply.clone()));
        Ok((reply, updated))
    }
}

fn write_lines(path: &Path, lines: &[String]) {
    let mut f = fs::File::create(path).unwrap();
    for line in lines {
        writeln!(f, "{line}").unwrap();
    }
}

fn fixture_config(root: &Path) -> Config {
    let prompts = root.join("prompts");
    for dir in ["StartingPoints", "Prompt4Experiments", "EndingPoints"] {
        fs::create_dir_all(prompts.join(dir)).unwrap();
    }
    fs::write(prompts.join("StartingPoints/StartBase.txt"), "Classify domains.\n").unwrap();
    fs::write(
        prompts.join("EndingPoints/EndBinary.txt"),
        "Answer domain|Y/N|confidence.\n",
    )
    .unwrap();

    let families = root.join("families");
    fs::create_dir_all(&families).unwrap();
    for fam in ["alpha", "beta"] {
        let domains: Vec<String> = (0..15).map(|i| format!("{fam}{i}.bad")).collect();
        write_lines(&families.join(format!("{fam}.csv")), &domains);
    }
    let legit: Vec<String> = (0..20).map(|i| format!("legit{i}.com")).collect();
    write_lines(&root.join("legit.csv"), &legit);

    let mut config = Config::default();
    config.experiment.id = 1;
    config.experiment.batch_size = 5;
    config.experiment.starting_prompt = "StartBase.txt".into();
    config.experiment.middle_prompts = Vec::new();
    config.experiment.final_prompt = "EndBinary.txt".into();
    config.experiment.test_domains_per_family = 3;
    config.experiment.legitimate_count = 7;
    config.paths.prompt_dir = prompts;
    config.paths.families_dir = families;
    config.paths.legitimate_file = root.join("legit.csv");
    config.paths.dataset_dir = root.join("dataset");
    config.paths.output_dir = root.join("output");
    config.paths.metrics_dir = root.join("metrics");
    config.paths.retry_dir = root.join("retry");
    config.paths.format_error_file = root.join("format_error.txt");
    config
}

#[test]
fn full_experiment_with_resubmission_round() {
    let tmp = tempfile::tempdir().unwrap();
    let config = fixture_config(tmp.path());
    let runner = Runner::from_config(config).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    // 3 per family * 2 families + 7 legitimate = 13 test domains.
    let prompt = runner.prepare(&mut rng).unwrap();
    assert_eq!(prompt.test_domains.len(), 13);
    let unique: HashSet<_> = prompt.test_domains.iter().collect();
    assert_eq!(unique.len(), 13);

    // The cache must hand back the identical test set on a fresh RNG.
    let mut other_rng = ChaCha8Rng::seed_from_u64(7);
    let reloaded = runner.prepare(&mut other_rng).unwrap();
    assert_eq!(reloaded.test_domains, prompt.test_domains);
    assert_eq!(reloaded.text, prompt.text);

    let provider = ScriptedProvider::new();
    runner.run(&provider, &prompt).unwrap();

    // One domain was dropped, so the first pass is incomplete.
    let report = runner.report(provider.model()).unwrap();
    assert!(report.is_none());
    assert!(runner.missing_path(provider.model()).exists());

    runner.resubmit(&provider, &prompt).unwrap();
    assert!(!runner.missing_path(provider.model()).exists());

    // Every verdict matched ground truth: perfect scores across the board.
    let report = runner.report(provider.model()).unwrap().expect("complete");
    assert_eq!(report.counts.tp, 6);
    assert_eq!(report.counts.tn, 7);
    assert_eq!(report.counts.fp, 0);
    assert_eq!(report.counts.fn_count, 0);
    assert_eq!(report.overall.accuracy, 1.0);
    assert_eq!(report.overall.mcc, 1.0);
    assert_eq!(report.overall.kappa, 1.0);

    for csv in ["GLOBAL_EXP1.csv", "MALICIOUS_EXP1.csv", "BENIGN_EXP1.csv"] {
        let content = fs::read_to_string(tmp.path().join("metrics").join(csv)).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "model,accuracy,precision,recall,f1_score,fpr,tpr,mcc,kappa"
        );
        assert!(lines.next().unwrap().starts_with("scripted-model,1.000,"));
    }
}

#[test]
fn missing_material_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = fixture_config(tmp.path());
    config.paths.families_dir = PathBuf::from(tmp.path().join("no-such-dir"));

    assert!(Runner::from_config(config).is_err());
}
