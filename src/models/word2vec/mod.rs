//! Word2vec strategy: trains word vectors on the corpus and embeds each
//! document as the mean of its known word vectors.

pub mod train;

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

pub use train::{TrainParams, Word2Vec};

use crate::{
    error::Result,
    models::{EmbeddingModel, Hyperparameters, SentenceVectors},
    utils::fs::write_string,
};

pub const BASE_NAME: &str = "word2vec";
pub const DEFAULT_ALPHA: f64 = 0.025;
pub const DEFAULT_WINDOW: usize = 5;
pub const DEFAULT_NEGATIVE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    /// continuous bag of words: context mean predicts the centre word
    #[default]
    Cbow,
    /// each context word predicts the centre word
    SkipGram,
}

/// Training settings outside the swept hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Word2VecConfig {
    pub vector_size: usize,
    /// words rarer than this are dropped from the vocabulary
    pub min_count: u64,
    pub epochs: usize,
    /// downsampling threshold for frequent words; 0 disables it
    pub sample: f64,
    /// floor of the linearly decaying learning rate
    pub min_alpha: f64,
    /// exponent of the noise distribution
    pub ns_exponent: f64,
    pub architecture: Architecture,
    /// approximate number of tokens trained in parallel per batch
    pub batch_words: usize,
}

impl Default for Word2VecConfig {
    fn default() -> Self {
        Self {
            vector_size: 100,
            min_count: 5,
            epochs: 5,
            sample: 1e-3,
            min_alpha: 1e-4,
            ns_exponent: 0.75,
            architecture: Architecture::Cbow,
            batch_words: 10_000,
        }
    }
}

/// Word2vec embedding strategy.
///
/// The name is derived from the resolved hyperparameters when fitting,
/// e.g. `word2vec_alpha-0.025_window-5_negative-5`, and from the file
/// stem when a persisted model is loaded.
#[derive(Debug, Clone)]
pub struct Word2VecModel {
    name: String,
    config: Word2VecConfig,
    model: Option<Word2Vec>,
}

impl Default for Word2VecModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Word2VecModel {
    pub fn new() -> Self {
        Self::with_config(Word2VecConfig::default())
    }

    pub fn with_config(config: Word2VecConfig) -> Self {
        Self {
            name: BASE_NAME.to_string(),
            config,
            model: None,
        }
    }

    /// Construct and fit in one step
    pub fn fitted(
        corpus: &[Vec<String>],
        output: &Path,
        seed: u64,
        params: &Hyperparameters,
        config: Word2VecConfig,
    ) -> Result<Self> {
        let mut model = Self::with_config(config);
        model.fit(corpus, output, seed, params)?;
        Ok(model)
    }

    /// `(alpha, window, negative)` with defaults filled in
    pub fn resolve(params: &Hyperparameters) -> (f64, usize, usize) {
        (
            params.alpha.unwrap_or(DEFAULT_ALPHA),
            params.window.unwrap_or(DEFAULT_WINDOW),
            params.negative.unwrap_or(DEFAULT_NEGATIVE),
        )
    }

    /// Name for a hyperparameter combination
    pub fn model_name(params: &Hyperparameters) -> String {
        let (alpha, window, negative) = Self::resolve(params);
        format!(
            "{BASE_NAME}_alpha-{}_window-{window}_negative-{negative}",
            format_alpha(alpha)
        )
    }

    /// `{output}/{name}.model`
    pub fn model_path(output: &Path, name: &str) -> PathBuf {
        output.join(format!("{name}.model"))
    }

    /// `{output}_Loss/{name}_loss.txt`
    pub fn loss_path(output: &Path, name: &str) -> PathBuf {
        let loss_dir = match output.file_name() {
            Some(dir) => output.with_file_name(format!("{}_Loss", dir.to_string_lossy())),
            None => output.join("Loss"),
        };
        loss_dir.join(format!("{name}_loss.txt"))
    }

    #[inline]
    pub fn config(&self) -> &Word2VecConfig {
        &self.config
    }

    /// The trained vectors, if any
    #[inline]
    pub fn model(&self) -> Option<&Word2Vec> {
        self.model.as_ref()
    }

    /// Write the word vectors. Returns `false` when the model is unfit.
    pub fn save_word_vectors(&self, path: &Path) -> Result<bool> {
        match &self.model {
            Some(model) => {
                model.save_word_vectors(path)?;
                Ok(true)
            }
            None => {
                warn!(model = %self.name, "no word vectors to save, model is not fit");
                Ok(false)
            }
        }
    }
}

impl EmbeddingModel for Word2VecModel {
    fn name(&self) -> &str {
        &self.name
    }

    /// Input plus output weights
    fn parameter_count(&self) -> u64 {
        self.model
            .as_ref()
            .map_or(0, |m| 2 * (m.vocab_size() * m.vector_size()) as u64)
    }

    fn dimension(&self) -> usize {
        self.model
            .as_ref()
            .map_or(self.config.vector_size, Word2Vec::vector_size)
    }

    fn is_fit(&self) -> bool {
        self.model.is_some()
    }

    /// Train and persist, unless `{output}/{name}.model` already exists;
    /// then the existing artifact is loaded instead.
    fn fit(&mut self, corpus: &[Vec<String>], output: &Path, seed: u64, params: &Hyperparameters) -> Result<()> {
        let (alpha, window, negative) = Self::resolve(params);
        self.name = Self::model_name(params);
        let path = Self::model_path(output, &self.name);

        if path.exists() {
            info!(model = %self.name, path = %path.display(), "model already exists, loading");
            self.load(&path);
            return Ok(());
        }

        info!(model = %self.name, documents = corpus.len(), "fitting word2vec");
        let params = TrainParams {
            alpha,
            window,
            negative,
            config: self.config,
        };
        let model = Word2Vec::train(corpus, &params, seed);
        model.save(&path)?;
        let loss = model.training_loss();
        write_string(&Self::loss_path(output, &self.name), &loss.to_string())?;
        info!(
            model = %self.name,
            vocab = model.vocab_size(),
            loss,
            path = %path.display(),
            "word2vec fit"
        );
        self.model = Some(model);
        Ok(())
    }

    fn load(&mut self, path: &Path) {
        match Word2Vec::load(path) {
            Ok(model) => {
                if let Some(stem) = path.file_stem() {
                    self.name = stem.to_string_lossy().into_owned();
                }
                info!(model = %self.name, vocab = model.vocab_size(), "word2vec loaded");
                self.model = Some(model);
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load word2vec model");
                self.model = None;
            }
        }
    }

    fn sentence_vectors(&self, corpus: &[Vec<String>]) -> Result<SentenceVectors> {
        let Some(model) = &self.model else {
            error!(model = %self.name, "word2vec model is not fit, returning zero vectors");
            return Ok(SentenceVectors::zeros(corpus.len(), self.dimension()));
        };
        Ok(SentenceVectors::Dense(
            corpus.par_iter().map(|doc| model.mean_vector(doc)).collect(),
        ))
    }
}

/// Decimal text of a learning rate. Whole numbers keep one decimal
/// (`1.0`), everything else uses the shortest exact form (`0.025`).
pub fn format_alpha(alpha: f64) -> String {
    if alpha.is_finite() && alpha.fract() == 0.0 {
        format!("{alpha:.1}")
    } else {
        alpha.to_string()
    }
}
