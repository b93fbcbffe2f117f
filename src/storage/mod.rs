//! File persistence helpers.
//!
//! JSON caches (prompt text, test-domain lists, missing-domain lists),
//! append-only logs, and the per-experiment metrics CSV files.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::analysis::{metrics, Metrics};
use crate::error::Result;

/// Write a value to a file as pretty-printed JSON, replacing any previous
/// content. Parent directories are created as needed.
pub fn save_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Load a JSON value from a file, or `None` when the file does not exist.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Option<T>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&fs::read_to_string(path)?)?))
}

/// Remove a file if present; missing files are not an error.
pub fn remove_if_exists(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Append raw lines to a plain-text log, creating it on first use.
pub fn append_lines(path: impl AsRef<Path>, lines: &[String]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for line in lines {
        writeln!(file, "{line}")?;
    }
    Ok(())
}

/// Append one model's metrics row to a CSV file, writing the header first
/// when the file does not exist yet.
pub fn append_metrics_row(path: impl AsRef<Path>, model: &str, m: &Metrics) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let header_needed = !path.is_file();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if header_needed {
        writeln!(file, "model,{}", metrics::CSV_HEADER)?;
    }
    writeln!(file, "{model},{}", m.to_csv_row())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ConfusionCounts;

    #[test]
    fn test_json_round_trip_and_absence() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/list.json");

        let missing: Option<Vec<String>> = load_json(&path).unwrap();
        assert!(missing.is_none());

        let domains = vec!["a.com".to_string(), "b.com".to_string()];
        save_json(&path, &domains).unwrap();
        let loaded: Vec<String> = load_json(&path).unwrap().unwrap();
        assert_eq!(loaded, domains);
    }

    #[test]
    fn test_remove_if_exists_is_quiet() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("gone.json");
        remove_if_exists(&path).unwrap();

        save_json(&path, &vec!["x"]).unwrap();
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_metrics_csv_header_written_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("GLOBAL_EXP1.csv");
        let m = Metrics::from_counts(&ConfusionCounts::new(8, 2, 1, 9));

        append_metrics_row(&path, "model-a", &m).unwrap();
        append_metrics_row(&path, "model-b", &m).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "model,accuracy,precision,recall,f1_score,fpr,tpr,mcc,kappa"
        );
        assert!(lines[1].starts_with("model-a,0.850,"));
        assert!(lines[2].starts_with("model-b,0.850,"));
    }
}
