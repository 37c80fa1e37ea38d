//! This crate compares text embedding strategies by how well a classifier
//! separates a labelled corpus on top of their document vectors.

pub mod classify;
pub mod config;
pub mod data;
pub mod error;
pub mod interchange;
pub mod models;
pub mod sweep;
pub mod utils;
pub mod vectorizer;

/// Embedding Model Trait
/// The common contract of every embedding strategy.
///
/// A model has a name (its identity in output files and on the leaderboard),
/// a parameter count (used to break ties between equal scores), and turns a
/// tokenized corpus into one sentence vector per document.
///
/// Lifecycle: constructed, possibly unfit -> `fit` -> `sentence_vectors` any
/// number of times. An unfit model never fails; it yields zero vectors.
///
/// `classify` runs the shared classification procedure on the model's
/// sentence vectors and persists metrics, a per-class report and a
/// confusion matrix.
pub use models::{EmbeddingModel, Hyperparameters, SentenceVectors};

/// Embedding Strategies
/// - `NaiveBayesModel`: raw text, TF-IDF vectorised and classified with multinomial Naive Bayes
/// - `Word2VecModel`: mean of word2vec vectors trained on the corpus
/// - `TransformerModel`: masked mean pooling over a pretrained encoder
pub use models::{naive_bayes::NaiveBayesModel, transformer::TransformerModel, word2vec::Word2VecModel};

/// Pretrained Encoder Seams
/// `EncoderProvider` loads a `SentenceEncoder` by `root/name`.
/// `CandleProvider` reads BERT-family models from local directories.
pub use models::transformer::{candle::CandleProvider, EncoderProvider, SentenceEncoder};

/// Classification Harness
/// The shared classify procedure and its building blocks.
///
/// A `ClassifierSetup` pairs a classifier with the input it expects
/// (`InputKind::Vector` or `InputKind::Text`). Text input is TF-IDF
/// vectorised after the train/test split.
pub use classify::{classify, classify_vectors, Classifier, ClassifierSetup, InputKind, Scores};

/// Sweep Driver and Leaderboard
/// `Sweep` evaluates every configured strategy and hyperparameter
/// combination; `Leaderboard` ranks the results by accuracy, balanced
/// accuracy and MCC (descending), then parameter count (ascending), then name.
pub use sweep::{Evaluation, Leaderboard, Sweep};

/// Sweep Configuration
/// Loaded from TOML; every field has a default.
pub use config::{Axis, SweepConfig, TransformerSpec};

pub use error::{Error, Result};

/// TF-IDF Vectorizer
/// Learns a sorted vocabulary and smooth IDF weights from training texts and
/// maps any text onto L2-normalised TF-IDF rows.
///
/// `TFIDFVectorizer<N, E>` has the following generic parameters:
/// - `N`: value type (f32, f64)
/// - `E`: TF-IDF calculation engine (default `DefaultTFIDFEngine`)
pub use vectorizer::TFIDFVectorizer;

/// TF IDF Calculation Engine Trait
/// Defines how raw counts and document frequencies become weights.
/// Implement it to plug a different weighting into `TFIDFVectorizer<N, E>`.
pub use vectorizer::tfidf::{DefaultTFIDFEngine, TFIDFEngine};

/// Token Frequency structure
/// Counts token occurrences for a document or a whole collection.
/// Used for vocabulary building and corpus statistics.
pub use vectorizer::token::TokenFrequency;
