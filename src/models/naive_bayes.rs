use crate::{
    classify::{self, ClassifierSetup},
    error::Result,
    models::{EmbeddingModel, SentenceVectors},
};

pub const NAME: &str = "Naive Bayes";

/// Text baseline: hands raw document text to the harness, which TF-IDF
/// vectorises it and classifies with multinomial Naive Bayes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveBayesModel;

impl NaiveBayesModel {
    pub fn new() -> Self {
        Self
    }
}

impl EmbeddingModel for NaiveBayesModel {
    fn name(&self) -> &str {
        NAME
    }

    fn parameter_count(&self) -> u64 {
        0
    }

    fn dimension(&self) -> usize {
        0
    }

    /// Nothing to train
    fn is_fit(&self) -> bool {
        true
    }

    fn sentence_vectors(&self, corpus: &[Vec<String>]) -> Result<SentenceVectors> {
        Ok(SentenceVectors::Text(corpus.iter().map(|doc| doc.join(" ")).collect()))
    }

    fn classifier_setup(&self) -> ClassifierSetup {
        classify::text_setup()
    }
}
