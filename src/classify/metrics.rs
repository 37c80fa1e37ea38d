//! Classification metrics over encoded labels.
//!
//! Labels considered by a metric are the union of the classes present in
//! `y_true` and `y_pred`, in ascending code order.

use std::collections::BTreeSet;

/// Fraction of exact matches. Empty input scores 0.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let hits = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    hits as f64 / y_true.len() as f64
}

/// Mean recall over the classes that occur in `y_true`
pub fn balanced_accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    let cm = ConfusionMatrix::new(y_true, y_pred);
    let recalls: Vec<f64> = (0..cm.labels.len())
        .filter_map(|i| {
            let support = cm.row_sum(i);
            (support > 0).then(|| cm.counts[i][i] as f64 / support as f64)
        })
        .collect();
    if recalls.is_empty() {
        return 0.0;
    }
    recalls.iter().sum::<f64>() / recalls.len() as f64
}

/// Multiclass Matthews correlation coefficient (Gorodkin's R_K).
/// Returns 0 when either marginal is constant.
pub fn matthews_corrcoef(y_true: &[usize], y_pred: &[usize]) -> f64 {
    let cm = ConfusionMatrix::new(y_true, y_pred);
    let k = cm.labels.len();
    let s = y_true.len() as f64;
    let c: f64 = (0..k).map(|i| cm.counts[i][i] as f64).sum();
    let t: Vec<f64> = (0..k).map(|i| cm.row_sum(i) as f64).collect();
    let p: Vec<f64> = (0..k).map(|j| cm.col_sum(j) as f64).collect();

    let cov_ytyp = c * s - t.iter().zip(&p).map(|(a, b)| a * b).sum::<f64>();
    let cov_ypyp = s * s - p.iter().map(|v| v * v).sum::<f64>();
    let cov_ytyt = s * s - t.iter().map(|v| v * v).sum::<f64>();
    let denom = cov_ytyt * cov_ypyp;
    if denom <= 0.0 {
        return 0.0;
    }
    (cov_ytyp / denom.sqrt()).clamp(-1.0, 1.0)
}

/// Rows are true classes, columns predicted classes, both in `labels` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub labels: Vec<usize>,
    pub counts: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
    pub fn new(y_true: &[usize], y_pred: &[usize]) -> Self {
        let labels: Vec<usize> = y_true
            .iter()
            .chain(y_pred)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut counts = vec![vec![0u64; labels.len()]; labels.len()];
        for (t, p) in y_true.iter().zip(y_pred) {
            // both are in `labels` by construction
            if let (Ok(i), Ok(j)) = (labels.binary_search(t), labels.binary_search(p)) {
                counts[i][j] += 1;
            }
        }
        Self { labels, counts }
    }

    pub fn row_sum(&self, i: usize) -> u64 {
        self.counts[i].iter().sum()
    }

    pub fn col_sum(&self, j: usize) -> u64 {
        self.counts.iter().map(|row| row[j]).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u64,
}

/// Per-class precision/recall/F1 plus the summary rows.
/// Undefined ratios (zero denominators) are reported as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: Vec<(usize, ClassMetrics)>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn new(y_true: &[usize], y_pred: &[usize]) -> Self {
        let cm = ConfusionMatrix::new(y_true, y_pred);
        let classes: Vec<(usize, ClassMetrics)> = cm
            .labels
            .iter()
            .enumerate()
            .map(|(i, &label)| {
                let tp = cm.counts[i][i] as f64;
                let support = cm.row_sum(i);
                let predicted = cm.col_sum(i);
                let precision = ratio(tp, predicted as f64);
                let recall = ratio(tp, support as f64);
                let f1 = ratio(2.0 * precision * recall, precision + recall);
                (label, ClassMetrics { precision, recall, f1, support })
            })
            .collect();

        let total: u64 = classes.iter().map(|(_, m)| m.support).sum();
        let n = classes.len() as f64;
        let mut macro_avg = ClassMetrics { support: total, ..Default::default() };
        let mut weighted_avg = ClassMetrics { support: total, ..Default::default() };
        for (_, m) in &classes {
            macro_avg.precision += m.precision / n;
            macro_avg.recall += m.recall / n;
            macro_avg.f1 += m.f1 / n;
            let w = ratio(m.support as f64, total as f64);
            weighted_avg.precision += m.precision * w;
            weighted_avg.recall += m.recall * w;
            weighted_avg.f1 += m.f1 * w;
        }

        Self {
            classes,
            accuracy: accuracy(y_true, y_pred),
            macro_avg,
            weighted_avg,
        }
    }
}

#[inline]
fn ratio(num: f64, denom: f64) -> f64 {
    if denom == 0.0 {
        0.0
    } else {
        num / denom
    }
}
