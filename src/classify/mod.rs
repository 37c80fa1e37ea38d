pub mod bayes;
pub mod features;
pub mod label;
pub mod linear;
pub mod metrics;
pub mod report;
pub mod split;

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::{
    classify::{
        bayes::MultinomialNb,
        features::Features,
        label::LabelEncoder,
        linear::LogisticRegression,
        metrics::{ClassificationReport, ConfusionMatrix},
        split::{take, train_test_split, TrainTestSplit},
    },
    error::{Error, Result},
    models::{EmbeddingModel, SentenceVectors},
    vectorizer::TFIDFVectorizer,
};

/// Share of documents held out for testing
pub const TEST_SIZE: f64 = 0.2;

/// A classifier over encoded labels `0..n_classes`
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;
    fn fit(&mut self, x: &Features, y: &[usize], n_classes: usize);
    fn predict(&self, x: &Features) -> Vec<usize>;
}

/// What the classifier consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// numeric sentence vectors, used as-is
    Vector,
    /// raw text, TF-IDF vectorised between split and fit
    Text,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Vector => "vector",
            InputKind::Text => "text",
        }
    }
}

/// A classifier together with the input mode it expects
pub struct ClassifierSetup {
    pub classifier: Box<dyn Classifier>,
    pub input: InputKind,
}

impl ClassifierSetup {
    pub fn vectors(classifier: impl Classifier + 'static) -> Self {
        Self {
            classifier: Box::new(classifier),
            input: InputKind::Vector,
        }
    }

    pub fn text(classifier: impl Classifier + 'static) -> Self {
        Self {
            classifier: Box::new(classifier),
            input: InputKind::Text,
        }
    }
}

impl Default for ClassifierSetup {
    /// Logistic regression on numeric vectors
    fn default() -> Self {
        Self::vectors(LogisticRegression::default())
    }
}

impl std::fmt::Debug for ClassifierSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierSetup")
            .field("classifier", &self.classifier.name())
            .field("input", &self.input)
            .finish()
    }
}

/// Headline scores of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scores {
    pub accuracy: f64,
    pub balanced_accuracy: f64,
    pub mcc: f64,
}

/// Output files of one classification run
pub fn metrics_path(output: &Path, name: &str) -> std::path::PathBuf {
    output.join("Classification").join("Metrics").join(format!("{name}.csv"))
}

pub fn report_path(output: &Path, name: &str) -> std::path::PathBuf {
    output.join("Classification").join("Report").join(format!("{name}.csv"))
}

pub fn confusion_path(output: &Path, name: &str) -> std::path::PathBuf {
    output.join("Classification").join("Confusion").join(format!("{name}.csv"))
}

/// Shared classification procedure for every embedding strategy.
///
/// Computes the sentence vectors of `model` and hands them to
/// [`classify_vectors`].
pub fn classify<M>(
    model: &M,
    corpus: &[Vec<String>],
    labels: &[String],
    output: &Path,
    seed: u64,
    setup: ClassifierSetup,
) -> Result<Scores>
where
    M: EmbeddingModel + ?Sized,
{
    let vectors = model.sentence_vectors(corpus)?;
    classify_vectors(model.name(), vectors, labels, output, seed, setup)
}

/// Classification on sentence vectors that were already computed.
///
/// 1. labels encoded to `0..k`
/// 2. seeded 80/20 train/test split
/// 3. TF-IDF on the split texts when `setup.input` is `Text`
/// 4. fit, predict, score against the decoded labels
/// 5. metrics, per-class report and confusion matrix written under
///    `{output}/Classification/`, named after `name`
///
/// `vectors` and `labels` must be aligned; that is not checked here.
pub fn classify_vectors(
    name: &str,
    vectors: SentenceVectors,
    labels: &[String],
    output: &Path,
    seed: u64,
    setup: ClassifierSetup,
) -> Result<Scores> {
    let ClassifierSetup { mut classifier, input } = setup;
    let (encoder, y) = LabelEncoder::fit_transform(labels);
    let split = train_test_split(vectors.len(), TEST_SIZE, seed)?;
    let (train_x, test_x) = split_features(vectors, input, &split)?;
    let train_y = take(&y, &split.train);
    let test_y = take(&y, &split.test);

    classifier.fit(&train_x, &train_y, encoder.len());
    let pred = classifier.predict(&test_x);

    let scores = Scores {
        accuracy: metrics::accuracy(&test_y, &pred),
        balanced_accuracy: metrics::balanced_accuracy(&test_y, &pred),
        mcc: metrics::matthews_corrcoef(&test_y, &pred),
    };
    report::write_metrics(&metrics_path(output, name), &scores)?;
    report::write_report(&report_path(output, name), &ClassificationReport::new(&test_y, &pred), &encoder)?;
    report::write_confusion(&confusion_path(output, name), &ConfusionMatrix::new(&test_y, &pred), &encoder)?;

    info!(
        model = name,
        classifier = classifier.name(),
        accuracy = scores.accuracy,
        balanced = scores.balanced_accuracy,
        mcc = scores.mcc,
        "classified"
    );
    Ok(scores)
}

fn split_features(vectors: SentenceVectors, input: InputKind, split: &TrainTestSplit) -> Result<(Features, Features)> {
    match (input, vectors) {
        (InputKind::Vector, SentenceVectors::Dense(rows)) => {
            let all = Features::dense(rows);
            Ok((all.select(&split.train), all.select(&split.test)))
        }
        (InputKind::Text, SentenceVectors::Text(texts)) => {
            let train: Vec<&str> = split.train.iter().map(|&i| texts[i].as_str()).collect();
            let test: Vec<&str> = split.test.iter().map(|&i| texts[i].as_str()).collect();
            let mut tfidf: TFIDFVectorizer<f64> = TFIDFVectorizer::new();
            let train_rows = tfidf.fit_transform(&train);
            let test_rows = tfidf.transform(&test);
            let dim = tfidf.vocab_size();
            Ok((Features::sparse(train_rows, dim), Features::sparse(test_rows, dim)))
        }
        (expected, actual) => Err(Error::InputMismatch {
            expected: expected.as_str(),
            actual: actual.kind(),
        }),
    }
}

/// Naive Bayes on TF-IDF features of the raw text
pub fn text_setup() -> ClassifierSetup {
    ClassifierSetup::text(MultinomialNb::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One-hot vector per label, so a linear model separates it exactly
    struct OneHot;

    impl EmbeddingModel for OneHot {
        fn name(&self) -> &str {
            "one_hot"
        }
        fn parameter_count(&self) -> u64 {
            0
        }
        fn dimension(&self) -> usize {
            2
        }
        fn is_fit(&self) -> bool {
            true
        }
        fn sentence_vectors(&self, corpus: &[Vec<String>]) -> Result<SentenceVectors> {
            Ok(SentenceVectors::Dense(
                corpus
                    .iter()
                    .map(|doc| if doc[0] == "x" { vec![1.0, 0.0] } else { vec![0.0, 1.0] })
                    .collect(),
            ))
        }
    }

    fn data() -> (Vec<Vec<String>>, Vec<String>) {
        let mut corpus = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            let (tok, label) = if i % 2 == 0 { ("x", "X") } else { ("y", "Y") };
            corpus.push(vec![tok.to_string(), format!("filler{i}")]);
            labels.push(label.to_string());
        }
        (corpus, labels)
    }

    #[test]
    fn separable_vectors_score_perfectly_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let (corpus, labels) = data();
        let scores = OneHot.classify(&corpus, &labels, dir.path(), 42).unwrap();
        assert_eq!(scores.accuracy, 1.0);
        assert_eq!(scores.balanced_accuracy, 1.0);
        assert!((-1.0..=1.0).contains(&scores.mcc));
        for path in [
            metrics_path(dir.path(), "one_hot"),
            report_path(dir.path(), "one_hot"),
            confusion_path(dir.path(), "one_hot"),
        ] {
            assert!(path.exists(), "{} missing", path.display());
        }
    }

    #[test]
    fn same_seed_same_scores() {
        let dir = tempfile::tempdir().unwrap();
        let (corpus, labels) = data();
        let a = classify(&OneHot, &corpus, &labels, dir.path(), 3, ClassifierSetup::default()).unwrap();
        let b = classify(&OneHot, &corpus, &labels, dir.path(), 3, ClassifierSetup::default()).unwrap();
        assert_eq!(a, b);
        let vectors = OneHot.sentence_vectors(&corpus).unwrap();
        let c = classify_vectors("one_hot", vectors, &labels, dir.path(), 3, ClassifierSetup::default()).unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn text_mode_rejects_numeric_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let (corpus, labels) = data();
        let err = classify(&OneHot, &corpus, &labels, dir.path(), 0, text_setup()).unwrap_err();
        assert!(matches!(err, Error::InputMismatch { expected: "text", actual: "vector" }));
    }
}
