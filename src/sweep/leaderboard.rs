use std::{cmp::Ordering, path::Path};

use indexmap::IndexMap;
use serde::Serialize;

use crate::{
    classify::Scores,
    error::{Error, Result},
    utils::fs::ensure_parent,
};

pub const LEADERBOARD_HEADER: [&str; 4] = [
    "Model",
    "Accuracy",
    "Balanced Accuracy",
    "Matthews Correlation Coefficient",
];

/// Result of evaluating one model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub accuracy: f64,
    pub balanced_accuracy: f64,
    pub mcc: f64,
    pub parameters: u64,
}

impl Evaluation {
    pub fn new(scores: Scores, parameters: u64) -> Self {
        Self {
            accuracy: scores.accuracy,
            balanced_accuracy: scores.balanced_accuracy,
            mcc: scores.mcc,
            parameters,
        }
    }
}

/// Ranking order: accuracy, balanced accuracy and MCC descending, then
/// fewer parameters first, then name.
pub fn compare(a: (&str, &Evaluation), b: (&str, &Evaluation)) -> Ordering {
    let ((a_name, a), (b_name, b)) = (a, b);
    b.accuracy
        .total_cmp(&a.accuracy)
        .then_with(|| b.balanced_accuracy.total_cmp(&a.balanced_accuracy))
        .then_with(|| b.mcc.total_cmp(&a.mcc))
        .then_with(|| a.parameters.cmp(&b.parameters))
        .then_with(|| a_name.cmp(b_name))
}

/// Evaluations keyed by model name, in insertion order
#[derive(Debug, Clone, Default)]
pub struct Leaderboard {
    entries: IndexMap<String, Evaluation>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced entry keeps its position
    pub fn insert(&mut self, name: impl Into<String>, evaluation: Evaluation) -> Option<Evaluation> {
        self.entries.insert(name.into(), evaluation)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Evaluation> {
        self.entries.get(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries sorted best first
    pub fn ranked(&self) -> Vec<(&str, &Evaluation)> {
        let mut ranked: Vec<(&str, &Evaluation)> = self.entries.iter().map(|(n, e)| (n.as_str(), e)).collect();
        ranked.sort_by(|a, b| compare(*a, *b));
        ranked
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(LEADERBOARD_HEADER)?;
        for (name, e) in self.ranked() {
            wtr.write_record([
                name.to_string(),
                e.accuracy.to_string(),
                e.balanced_accuracy.to_string(),
                e.mcc.to_string(),
            ])?;
        }
        wtr.flush().map_err(|e| Error::io(path, e))
    }
}
