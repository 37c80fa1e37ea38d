use std::path::Path;

use crate::{
    classify::{
        label::LabelEncoder,
        metrics::{ClassMetrics, ClassificationReport, ConfusionMatrix},
        Scores,
    },
    error::{Error, Result},
    utils::fs::ensure_parent,
};

pub const METRICS_HEADER: [&str; 3] = ["Accuracy", "Balanced Accuracy", "Matthews Correlation Coefficient"];
pub const REPORT_HEADER: [&str; 5] = ["Class", "Precision", "Recall", "F1-Score", "Support"];

fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    ensure_parent(path)?;
    Ok(csv::Writer::from_path(path)?)
}

/// One header row and one row with the three headline scores
pub fn write_metrics(path: &Path, scores: &Scores) -> Result<()> {
    let mut wtr = writer(path)?;
    wtr.write_record(METRICS_HEADER)?;
    wtr.write_record([
        scores.accuracy.to_string(),
        scores.balanced_accuracy.to_string(),
        scores.mcc.to_string(),
    ])?;
    wtr.flush().map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// Per-class report with readable row names.
/// Class codes become their label strings; summary rows are
/// `Accuracy`, `Macro Average` and `Weighted Average`.
pub fn write_report(path: &Path, report: &ClassificationReport, encoder: &LabelEncoder) -> Result<()> {
    let mut wtr = writer(path)?;
    wtr.write_record(REPORT_HEADER)?;
    let row = |name: &str, m: &ClassMetrics| {
        [
            name.to_string(),
            m.precision.to_string(),
            m.recall.to_string(),
            m.f1.to_string(),
            m.support.to_string(),
        ]
    };
    for (code, metrics) in &report.classes {
        let name = encoder.decode(*code).unwrap_or_default();
        wtr.write_record(row(name, metrics))?;
    }
    let accuracy = ClassMetrics {
        precision: report.accuracy,
        recall: report.accuracy,
        f1: report.accuracy,
        support: report.macro_avg.support,
    };
    wtr.write_record(row("Accuracy", &accuracy))?;
    wtr.write_record(row("Macro Average", &report.macro_avg))?;
    wtr.write_record(row("Weighted Average", &report.weighted_avg))?;
    wtr.flush().map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// Square matrix indexed by label strings; the top-left cell is empty
pub fn write_confusion(path: &Path, cm: &ConfusionMatrix, encoder: &LabelEncoder) -> Result<()> {
    let names: Vec<&str> = cm
        .labels
        .iter()
        .map(|&code| encoder.decode(code).unwrap_or_default())
        .collect();
    let mut wtr = writer(path)?;
    wtr.write_record(std::iter::once("").chain(names.iter().copied()))?;
    for (name, counts) in names.iter().zip(&cm.counts) {
        wtr.write_record(std::iter::once(name.to_string()).chain(counts.iter().map(u64::to_string)))?;
    }
    wtr.flush().map_err(|e| Error::io(path, e))?;
    Ok(())
}
