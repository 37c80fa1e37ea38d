pub mod naive_bayes;
pub mod transformer;
pub mod word2vec;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    classify::{self, ClassifierSetup, Scores},
    error::Result,
    interchange,
};

/// Per-document output of an embedding strategy, aligned with the corpus
#[derive(Debug, Clone, PartialEq)]
pub enum SentenceVectors {
    /// fixed-length numeric embeddings
    Dense(Vec<Vec<f32>>),
    /// raw document text, vectorised later by the harness
    Text(Vec<String>),
}

impl SentenceVectors {
    /// `n` zero vectors of width `dim` (at least 1)
    pub fn zeros(n: usize, dim: usize) -> Self {
        SentenceVectors::Dense(vec![vec![0.0; dim.max(1)]; n])
    }

    pub fn len(&self) -> usize {
        match self {
            SentenceVectors::Dense(v) => v.len(),
            SentenceVectors::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SentenceVectors::Dense(_) => "vector",
            SentenceVectors::Text(_) => "text",
        }
    }
}

/// Word-vector hyperparameters; every key is optional.
/// Serialised with the `Alpha` / `Window` / `Negative` keys.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hyperparameters {
    #[serde(rename = "Alpha", default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(rename = "Window", default, skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,
    #[serde(rename = "Negative", default, skip_serializing_if = "Option::is_none")]
    pub negative: Option<usize>,
}

impl Hyperparameters {
    pub fn new(alpha: f64, window: usize, negative: usize) -> Self {
        Self {
            alpha: Some(alpha),
            window: Some(window),
            negative: Some(negative),
        }
    }
}

/// Common contract of every embedding strategy.
///
/// Lifecycle: constructed (possibly unfit) -> `fit` -> `sentence_vectors`
/// any number of times. `load` restores a persisted state and never fails
/// loudly: on error the model is left unfit and the problem is logged.
pub trait EmbeddingModel {
    /// Identity in file names and on the leaderboard
    fn name(&self) -> &str;

    /// Size of the model, used to break ties between equal scores
    fn parameter_count(&self) -> u64;

    /// Width of the vectors from `sentence_vectors`
    fn dimension(&self) -> usize;

    fn is_fit(&self) -> bool;

    /// Train internal state. Strategies without training keep the default.
    fn fit(&mut self, _corpus: &[Vec<String>], _output: &Path, _seed: u64, _params: &Hyperparameters) -> Result<()> {
        Ok(())
    }

    fn load(&mut self, _path: &Path) {}

    /// One entry per document. The default is a zero vector per document.
    fn sentence_vectors(&self, corpus: &[Vec<String>]) -> Result<SentenceVectors> {
        Ok(SentenceVectors::zeros(corpus.len(), self.dimension()))
    }

    /// Classifier used on this model's sentence vectors.
    /// The default is logistic regression on numeric vectors.
    fn classifier_setup(&self) -> ClassifierSetup {
        ClassifierSetup::default()
    }

    /// Train/test a classifier on this model's sentence vectors and persist the results
    fn classify(&self, corpus: &[Vec<String>], labels: &[String], output: &Path, seed: u64) -> Result<Scores> {
        classify::classify(self, corpus, labels, output, seed, self.classifier_setup())
    }

    /// Write document embeddings as `doc_{i}` rows in the word-vector text format.
    /// Returns `false` when the model produces text instead of vectors.
    fn save_embeddings(&self, corpus: &[Vec<String>], path: &Path) -> Result<bool> {
        save_vectors(&self.sentence_vectors(corpus)?, path)
    }
}

/// Write dense sentence vectors with `doc_{i}` ids; text is not written
pub fn save_vectors(vectors: &SentenceVectors, path: &Path) -> Result<bool> {
    match vectors {
        SentenceVectors::Dense(rows) => {
            let ids: Vec<String> = (0..rows.len()).map(|i| format!("doc_{i}")).collect();
            interchange::write_vectors(path, &ids, rows)?;
            Ok(true)
        }
        SentenceVectors::Text(_) => Ok(false),
    }
}
