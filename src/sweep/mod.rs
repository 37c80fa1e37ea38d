//! Evaluates every configured strategy on one corpus and ranks them.

pub mod leaderboard;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{field, info, info_span};

pub use leaderboard::{Evaluation, Leaderboard};

use crate::{
    classify,
    config::SweepConfig,
    error::{Error, Result},
    models::{
        self,
        naive_bayes::NaiveBayesModel,
        transformer::{EncoderProvider, TransformerModel},
        word2vec::Word2VecModel,
        EmbeddingModel, Hyperparameters,
    },
};

pub struct Sweep {
    config: SweepConfig,
    provider: Arc<dyn EncoderProvider>,
}

impl Sweep {
    pub fn new(config: SweepConfig, provider: Arc<dyn EncoderProvider>) -> Self {
        Self { config, provider }
    }

    #[inline]
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Word2vec artifacts; losses go to the sibling `Models_Loss`
    pub fn models_dir(&self) -> PathBuf {
        self.config.output.join("Models")
    }

    pub fn embeddings_path(&self, name: &str) -> PathBuf {
        self.config.output.join("Embeddings").join(format!("{name}.txt"))
    }

    pub fn leaderboard_path(&self) -> PathBuf {
        self.config.output.join("Leaderboard.csv")
    }

    /// Cross product of the hyperparameter axes, alpha outermost
    pub fn combinations(&self) -> Vec<Hyperparameters> {
        let mut combinations = Vec::new();
        for alpha in self.config.alpha.values() {
            for window in self.config.window.values() {
                for negative in self.config.negative.values() {
                    combinations.push(Hyperparameters::new(alpha, window, negative));
                }
            }
        }
        combinations
    }

    /// Evaluate, in order: Naive Bayes, each transformer, the standard
    /// word2vec model, then every swept word2vec combination. The ranked
    /// leaderboard is written to `Leaderboard.csv` and returned.
    /// A config with repeated transformer names is rejected up front.
    pub fn run(&self, corpus: &[Vec<String>], labels: &[String]) -> Result<Leaderboard> {
        if corpus.len() != labels.len() {
            return Err(Error::LengthMismatch {
                corpus: corpus.len(),
                labels: labels.len(),
            });
        }
        self.config.validate()?;
        info!(documents = corpus.len(), output = %self.config.output.display(), "sweep started");
        let mut board = Leaderboard::new();

        if self.config.naive_bayes {
            self.evaluate(&mut NaiveBayesModel::new(), None, corpus, labels, &mut board)?;
        }

        for spec in &self.config.transformers {
            let mut model = TransformerModel::new(spec.clone(), Arc::clone(&self.provider));
            self.evaluate(&mut model, None, corpus, labels, &mut board)?;
        }

        let standard = Hyperparameters::default();
        let standard_name = Word2VecModel::model_name(&standard);
        let mut model = Word2VecModel::with_config(self.config.word2vec);
        self.evaluate(&mut model, Some(&standard), corpus, labels, &mut board)?;

        for params in self.combinations() {
            if Word2VecModel::model_name(&params) == standard_name {
                info!(model = %standard_name, "same as the standard model, skipped");
                continue;
            }
            let mut model = Word2VecModel::with_config(self.config.word2vec);
            self.evaluate(&mut model, Some(&params), corpus, labels, &mut board)?;
        }

        board.write_csv(&self.leaderboard_path())?;
        if let Some((best, e)) = board.ranked().first() {
            info!(models = board.len(), best = %best, accuracy = e.accuracy, "sweep finished");
        }
        Ok(board)
    }

    /// Fit (when `params` is given), save embeddings, classify and record the scores.
    /// Sentence vectors are computed once and shared by both outputs.
    fn evaluate<M>(
        &self,
        model: &mut M,
        params: Option<&Hyperparameters>,
        corpus: &[Vec<String>],
        labels: &[String],
        board: &mut Leaderboard,
    ) -> Result<()>
    where
        M: EmbeddingModel + ?Sized,
    {
        let span = info_span!("evaluate", model = field::Empty);
        let _guard = span.enter();
        if let Some(params) = params {
            model.fit(corpus, &self.models_dir(), self.config.seed, params)?;
        }
        span.record("model", model.name());

        let vectors = model.sentence_vectors(corpus)?;
        models::save_vectors(&vectors, &self.embeddings_path(model.name()))?;
        let output: &Path = &self.config.output;
        let scores = classify::classify_vectors(
            model.name(),
            vectors,
            labels,
            output,
            self.config.seed,
            model.classifier_setup(),
        )?;
        board.insert(model.name(), Evaluation::new(scores, model.parameter_count()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        config::{Axis, TransformerSpec},
        models::{transformer::SentenceEncoder, word2vec::Word2VecConfig},
    };

    /// Two-dimensional "encoder": counts of the two topic words
    struct TopicEncoder;

    impl SentenceEncoder for TopicEncoder {
        fn encode(&self, text: &str) -> Result<Vec<f32>> {
            let count = |w: &str| text.split(' ').filter(|t| *t == w).count() as f32;
            Ok(vec![count("goal"), count("vote")])
        }

        fn hidden_size(&self) -> usize {
            2
        }

        fn parameter_count(&self) -> u64 {
            7
        }
    }

    struct TopicProvider;

    impl EncoderProvider for TopicProvider {
        fn load(&self, _root: &str, _name: &str, _max_length: usize) -> Result<Box<dyn SentenceEncoder>> {
            Ok(Box::new(TopicEncoder))
        }
    }

    /// Counts every `encode` call across the encoders it hands out
    struct CountingProvider {
        calls: Arc<AtomicUsize>,
    }

    struct CountingEncoder {
        calls: Arc<AtomicUsize>,
    }

    impl SentenceEncoder for CountingEncoder {
        fn encode(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            TopicEncoder.encode(text)
        }

        fn hidden_size(&self) -> usize {
            2
        }

        fn parameter_count(&self) -> u64 {
            7
        }
    }

    impl EncoderProvider for CountingProvider {
        fn load(&self, _root: &str, _name: &str, _max_length: usize) -> Result<Box<dyn SentenceEncoder>> {
            Ok(Box::new(CountingEncoder {
                calls: Arc::clone(&self.calls),
            }))
        }
    }

    fn corpus() -> (Vec<Vec<String>>, Vec<String>) {
        let mut corpus = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            let (words, label) = if i % 2 == 0 {
                ("goal match team goal", "sport")
            } else {
                ("vote law senate vote", "politics")
            };
            corpus.push(words.split(' ').map(str::to_string).collect());
            labels.push(label.to_string());
        }
        (corpus, labels)
    }

    fn config(output: &Path) -> SweepConfig {
        SweepConfig {
            output: output.to_path_buf(),
            alpha: Axis::Many(vec![0.01, 0.02]),
            word2vec: Word2VecConfig {
                vector_size: 8,
                min_count: 1,
                epochs: 1,
                ..Word2VecConfig::default()
            },
            transformers: vec![TransformerSpec::new("topics", "topic-encoder")],
            ..SweepConfig::default()
        }
    }

    #[test]
    fn evaluates_every_strategy_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let (corpus, labels) = corpus();
        let sweep = Sweep::new(config(dir.path()), Arc::new(TopicProvider));
        let board = sweep.run(&corpus, &labels).unwrap();

        let names: Vec<&str> = board.names().collect();
        assert_eq!(
            names,
            vec![
                "Naive Bayes",
                "topic-encoder",
                "word2vec_alpha-0.025_window-5_negative-5",
                "word2vec_alpha-0.01_window-5_negative-5",
                "word2vec_alpha-0.02_window-5_negative-5",
            ]
        );
        assert_eq!(board.get("topic-encoder").unwrap().accuracy, 1.0);
        assert_eq!(board.get("topic-encoder").unwrap().parameters, 7);
        for (_, e) in board.ranked() {
            assert!((0.0..=1.0).contains(&e.accuracy));
            assert!((0.0..=1.0).contains(&e.balanced_accuracy));
            assert!((-1.0..=1.0).contains(&e.mcc));
        }

        let csv = std::fs::read_to_string(sweep.leaderboard_path()).unwrap();
        assert_eq!(csv.lines().count(), 6);
        assert!(csv.starts_with("Model,Accuracy,Balanced Accuracy,Matthews Correlation Coefficient\n"));
        assert!(sweep.embeddings_path("topic-encoder").exists());
        assert!(!sweep.embeddings_path("Naive Bayes").exists());
        assert!(sweep.models_dir().join("word2vec_alpha-0.01_window-5_negative-5.model").exists());
        assert!(dir.path().join("Models_Loss").is_dir());
    }

    #[test]
    fn standard_combination_is_not_repeated() {
        let dir = tempfile::tempdir().unwrap();
        let (corpus, labels) = corpus();
        let mut config = config(dir.path());
        config.alpha = Axis::Many(vec![0.025, 0.05]);
        config.naive_bayes = false;
        config.transformers.clear();
        let board = Sweep::new(config, Arc::new(TopicProvider)).run(&corpus, &labels).unwrap();
        assert_eq!(board.len(), 2);
        assert!(board.get("word2vec_alpha-0.05_window-5_negative-5").is_some());
    }

    #[test]
    fn rejects_misaligned_labels() {
        let dir = tempfile::tempdir().unwrap();
        let (corpus, labels) = corpus();
        let sweep = Sweep::new(config(dir.path()), Arc::new(TopicProvider));
        let err = sweep.run(&corpus, &labels[1..]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { corpus: 20, labels: 19 }));
    }

    #[test]
    fn combinations_nest_alpha_window_negative() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.window = Axis::Many(vec![2, 3]);
        config.negative = Axis::Many(vec![1, 4]);
        let sweep = Sweep::new(config, Arc::new(TopicProvider));
        let combos = sweep.combinations();
        assert_eq!(combos.len(), 8);
        assert_eq!(combos[0], Hyperparameters::new(0.01, 2, 1));
        assert_eq!(combos[1], Hyperparameters::new(0.01, 2, 4));
        assert_eq!(combos[2], Hyperparameters::new(0.01, 3, 1));
        assert_eq!(combos[7], Hyperparameters::new(0.02, 3, 4));
    }

    #[test]
    fn corpus_is_encoded_once_per_model() {
        let dir = tempfile::tempdir().unwrap();
        let (corpus, labels) = corpus();
        let mut config = config(dir.path());
        config.naive_bayes = false;
        config.alpha = Axis::One(0.025);
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: Arc::clone(&calls),
        };
        let sweep = Sweep::new(config, Arc::new(provider));
        let board = sweep.run(&corpus, &labels).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), corpus.len());
        assert_eq!(board.get("topic-encoder").unwrap().accuracy, 1.0);
        let (ids, vectors) = crate::interchange::read_vectors(&sweep.embeddings_path("topic-encoder")).unwrap();
        assert_eq!(ids.len(), corpus.len());
        assert_eq!(vectors[0], vec![2.0, 0.0]);
    }

    #[test]
    fn repeated_transformer_name_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let (corpus, labels) = corpus();
        let mut config = config(dir.path());
        config.transformers.push(TransformerSpec::new("elsewhere", "topic-encoder"));
        let err = Sweep::new(config, Arc::new(TopicProvider)).run(&corpus, &labels).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(!dir.path().join("Leaderboard.csv").exists());
    }
}
