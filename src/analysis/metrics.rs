//! Confusion-matrix-derived performance metrics.
//!
//! Every metric is a pure function of the four confusion counts. Any ratio
//! whose denominator is zero evaluates to 0 rather than NaN or an error,
//! so degenerate result sets (empty, single-class) still produce a row.

use serde::{Deserialize, Serialize};

use super::confusion::ConfusionCounts;

/// Derived classification metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// (TP + TN) / N
    pub accuracy: f64,
    /// TP / (TP + FP)
    pub precision: f64,
    /// TP / (TP + FN)
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1_score: f64,
    /// FP / (FP + TN)
    pub fpr: f64,
    /// Alias of recall.
    pub tpr: f64,
    /// Matthews Correlation Coefficient.
    pub mcc: f64,
    /// Cohen's Kappa.
    pub kappa: f64,
}

/// CSV header for metric columns, matching [`Metrics::to_csv_row`].
pub const CSV_HEADER: &str = "accuracy,precision,recall,f1_score,fpr,tpr,mcc,kappa";

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

impl Metrics {
    /// Derive all metrics from confusion counts.
    pub fn from_counts(counts: &ConfusionCounts) -> Self {
        let tp = counts.tp as f64;
        let fp = counts.fp as f64;
        let fn_ = counts.fn_count as f64;
        let tn = counts.tn as f64;
        let n = tp + fp + fn_ + tn;

        let accuracy = ratio(tp + tn, n);
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1_score = ratio(2.0 * precision * recall, precision + recall);
        let fpr = ratio(fp, fp + tn);
        let tpr = recall;

        let mcc_den = ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt();
        let mcc = if mcc_den != 0.0 {
            (tp * tn - fp * fn_) / mcc_den
        } else {
            0.0
        };

        let kappa = if n != 0.0 {
            let p0 = (tn + tp) / n;
            let pa = ((tn + tp) / n) * ((tn + fn_) / n);
            let pb = ((fn_ + tp) / n) * ((fp + tp) / n);
            let pe = pa + pb;
            if (pe - 1.0).abs() > f64::EPSILON {
                (p0 - pe) / (1.0 - pe)
            } else {
                0.0
            }
        } else {
            0.0
        };

        Self {
            accuracy,
            precision,
            recall,
            f1_score,
            fpr,
            tpr,
            mcc,
            kappa,
        }
    }

    /// Render the metric values as one CSV row, 3 decimal places.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{:.3},{:.3},{:.3},{:.3},{:.3},{:.3},{:.3},{:.3}",
            self.accuracy,
            self.precision,
            self.recall,
            self.f1_score,
            self.fpr,
            self.tpr,
            self.mcc,
            self.kappa
        )
    }
}

impl std::fmt::Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "acc={:.3} prec={:.3} rec={:.3} f1={:.3} fpr={:.3} tpr={:.3} mcc={:.3} kappa={:.3}",
            self.accuracy,
            self.precision,
            self.recall,
            self.f1_score,
            self.fpr,
            self.tpr,
            self.mcc,
            self.kappa
        )
    }
}
