//! Classification records and confusion-matrix accumulation.

use std::collections::HashSet;

/// Model verdict token from a classification line.
///
/// Anything other than the literal `Y`/`N` is kept as [`Verdict::Other`]
/// and counts as the wrong class for the domain's true label. This mirrors
/// the scoring convention of the experiment material: a typo or alternate
/// token scores against the model, it is not a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The model called the domain malicious (`Y`).
    Malicious,
    /// The model called the domain benign (`N`).
    Benign,
    /// Any other token.
    Other,
}

impl From<&str> for Verdict {
    fn from(token: &str) -> Self {
        match token {
            "Y" => Verdict::Malicious,
            "N" => Verdict::Benign,
            _ => Verdict::Other,
        }
    }
}

/// One parsed classification line: `domain|verdict|confidence`.
///
/// Confidence is opaque; it is never validated or used in metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRecord {
    /// Domain the verdict applies to.
    pub domain: String,
    /// Parsed verdict token.
    pub verdict: Verdict,
    /// Raw confidence field.
    pub confidence: String,
}

impl ClassificationRecord {
    /// Parse a line into a record. Returns `None` unless the line splits
    /// into exactly three pipe-delimited fields.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split('|');
        let domain = fields.next()?;
        let verdict = fields.next()?;
        let confidence = fields.next()?;
        if fields.next().is_some() {
            return None;
        }
        Some(Self {
            domain: domain.to_string(),
            verdict: Verdict::from(verdict),
            confidence: confidence.to_string(),
        })
    }
}

/// Confusion-matrix counts. Positive class = malicious.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    /// True positives: malicious domains called malicious.
    pub tp: u64,
    /// False positives: benign domains called malicious.
    pub fp: u64,
    /// False negatives: malicious domains called benign.
    pub fn_count: u64,
    /// True negatives: benign domains called benign.
    pub tn: u64,
}

impl ConfusionCounts {
    /// Build counts directly.
    pub fn new(tp: u64, fp: u64, fn_count: u64, tn: u64) -> Self {
        Self {
            tp,
            fp,
            fn_count,
            tn,
        }
    }

    /// Total classified domains.
    pub fn total(&self) -> u64 {
        self.tp + self.fp + self.fn_count + self.tn
    }

    /// Restriction to the malicious class only (TP/FN, FP = TN = 0).
    pub fn malicious_view(&self) -> Self {
        Self::new(self.tp, 0, self.fn_count, 0)
    }

    /// Restriction to the benign class, with benign treated as the
    /// positive class (TN in the TP slot, FP in the FN slot).
    pub fn benign_view(&self) -> Self {
        Self::new(self.tn, 0, self.fp, 0)
    }
}

/// Outcome of one confusion-scan over a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfusionScan {
    /// Accumulated counts.
    pub counts: ConfusionCounts,
    /// Raw lines that did not split into exactly three fields. Diverted to
    /// the format-error log by the caller, never counted.
    pub malformed: Vec<String>,
}

/// Scan classification lines against the ground-truth sets.
///
/// Rules, in order per line:
/// - lines that do not parse into three fields are collected as malformed;
/// - a domain already counted in this scan is skipped (first wins);
/// - a domain in neither ground-truth set is ignored entirely;
/// - otherwise the verdict is tallied against the domain's true label.
pub fn scan_classifications<'a, I>(
    lines: I,
    malicious: &HashSet<String>,
    benign: &HashSet<String>,
) -> ConfusionScan
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scan = ConfusionScan::default();
    let mut counted: HashSet<String> = HashSet::new();

    for line in lines {
        let Some(record) = ClassificationRecord::parse(line) else {
            scan.malformed.push(line.to_string());
            continue;
        };
        if counted.contains(&record.domain) {
            continue;
        }

        if malicious.contains(&record.domain) {
            if record.verdict == Verdict::Malicious {
                scan.counts.tp += 1;
            } else {
                scan.counts.fn_count += 1;
            }
        } else if benign.contains(&record.domain) {
            if record.verdict == Verdict::Benign {
                scan.counts.tn += 1;
            } else {
                scan.counts.fp += 1;
            }
        } else {
            // Unknown to the corpus: not counted, not an error.
            continue;
        }
        counted.insert(record.domain);
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sets() -> (HashSet<String>, HashSet<String>) {
        let malicious = ["bad1.com", "bad2.com"].iter().map(|s| s.to_string()).collect();
        let benign = ["good1.com", "good2.com"].iter().map(|s| s.to_string()).collect();
        (malicious, benign)
    }

    #[test]
    fn test_record_parse() {
        let rec = ClassificationRecord::parse("a.com|Y|0.9").unwrap();
        assert_eq!(rec.domain, "a.com");
        assert_eq!(rec.verdict, Verdict::Malicious);
        assert_eq!(rec.confidence, "0.9");

        assert!(ClassificationRecord::parse("a.com|Y").is_none());
        assert!(ClassificationRecord::parse("a.com|Y|0.9|extra").is_none());
        assert!(ClassificationRecord::parse("free text answer").is_none());
    }

    #[test]
    fn test_scan_basic_tally() {
        let (malicious, benign) = sets();
        let lines = [
            "bad1.com|Y|0.9",
            "bad2.com|N|0.4",
            "good1.com|N|0.8",
            "good2.com|Y|0.6",
        ];
        let scan = scan_classifications(lines, &malicious, &benign);
        assert_eq!(scan.counts, ConfusionCounts::new(1, 1, 1, 1));
        assert!(scan.malformed.is_empty());
    }

    #[test]
    fn test_duplicate_domain_counted_once() {
        let (malicious, benign) = sets();
        let lines = ["bad1.com|Y|0.9", "bad1.com|Y|0.9", "bad1.com|N|0.1"];
        let scan = scan_classifications(lines, &malicious, &benign);
        assert_eq!(scan.counts.tp, 1);
        assert_eq!(scan.counts.fn_count, 0);
    }

    #[test]
    fn test_unknown_domain_ignored() {
        let (malicious, benign) = sets();
        let scan = scan_classifications(["stranger.xyz|Y|1.0"], &malicious, &benign);
        assert_eq!(scan.counts.total(), 0);
        assert!(scan.malformed.is_empty());
    }

    #[test]
    fn test_malformed_lines_diverted() {
        let (malicious, benign) = sets();
        let lines = ["I think bad1.com is malicious", "bad1.com|Y|0.9"];
        let scan = scan_classifications(lines, &malicious, &benign);
        assert_eq!(scan.counts.tp, 1);
        assert_eq!(scan.malformed, vec!["I think bad1.com is malicious"]);
    }

    #[test]
    fn test_alternate_token_scores_as_wrong_class() {
        let (malicious, benign) = sets();
        let lines = ["bad1.com|yes|0.9", "good1.com|maybe|0.5"];
        let scan = scan_classifications(lines, &malicious, &benign);
        assert_eq!(scan.counts, ConfusionCounts::new(0, 1, 1, 0));
    }

    #[test]
    fn test_class_views() {
        let counts = ConfusionCounts::new(8, 2, 1, 9);
        assert_eq!(counts.malicious_view(), ConfusionCounts::new(8, 0, 1, 0));
        assert_eq!(counts.benign_view(), ConfusionCounts::new(9, 0, 2, 0));
    }
}
