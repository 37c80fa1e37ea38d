//! Pretrained transformer strategy.
//!
//! The encoder itself is behind [`SentenceEncoder`], produced by an
//! [`EncoderProvider`]. [`candle::CandleProvider`] reads BERT-family models
//! from local directories; tests plug in their own providers.

pub mod candle;

use std::{path::Path, sync::Arc};

use tracing::{debug, error, info};

use crate::{
    config::TransformerSpec,
    error::Result,
    models::{EmbeddingModel, SentenceVectors},
};

pub const DEFAULT_MAX_LENGTH: usize = 512;
pub const DEFAULT_DIMENSION: usize = 384;

/// Smallest token count used when averaging, so an all-zero mask cannot divide by zero
const MIN_MASK_SUM: f32 = 1e-9;

/// A loaded encoder turning one text into one pooled vector
pub trait SentenceEncoder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<f32>>;

    fn hidden_size(&self) -> usize;

    fn parameter_count(&self) -> u64;
}

/// Source of encoders, addressed by `root/name`
pub trait EncoderProvider: Send + Sync {
    fn load(&self, root: &str, name: &str, max_length: usize) -> Result<Box<dyn SentenceEncoder>>;
}

/// Mean of the token states whose mask is set.
///
/// # Arguments
/// * `hidden` - `mask.len() x hidden_size` token states, row-major
/// * `hidden_size` - width of one token state
/// * `mask` - attention mask, 1 for real tokens and 0 for padding
pub fn masked_mean_pool(hidden: &[f32], hidden_size: usize, mask: &[u32]) -> Vec<f32> {
    let mut pooled = vec![0.0f32; hidden_size];
    let mut count = 0.0f32;
    for (state, &m) in hidden.chunks(hidden_size).zip(mask) {
        let m = m as f32;
        count += m;
        pooled.iter_mut().zip(state).for_each(|(p, h)| *p += h * m);
    }
    let count = count.max(MIN_MASK_SUM);
    pooled.iter_mut().for_each(|p| *p /= count);
    pooled
}

/// Pretrained encoder as an embedding strategy.
///
/// The encoder is loaded when the model is constructed. A load failure is
/// logged and leaves the model unfit; it then yields zero vectors of the
/// configured dimension.
pub struct TransformerModel {
    spec: TransformerSpec,
    provider: Arc<dyn EncoderProvider>,
    encoder: Option<Box<dyn SentenceEncoder>>,
}

impl TransformerModel {
    pub fn new(spec: TransformerSpec, provider: Arc<dyn EncoderProvider>) -> Self {
        let mut model = Self {
            spec,
            provider,
            encoder: None,
        };
        model.reload();
        model
    }

    fn max_length(&self) -> usize {
        self.spec.max_length.unwrap_or(DEFAULT_MAX_LENGTH)
    }

    fn reload(&mut self) {
        let (root, name) = (&self.spec.root, &self.spec.name);
        self.encoder = match self.provider.load(root, name, self.max_length()) {
            Ok(encoder) => {
                info!(model = %name, root = %root, hidden = encoder.hidden_size(), "encoder loaded");
                Some(encoder)
            }
            Err(e) => {
                error!(model = %name, root = %root, error = %e, "failed to load encoder");
                None
            }
        };
    }

    #[inline]
    pub fn spec(&self) -> &TransformerSpec {
        &self.spec
    }
}

impl std::fmt::Debug for TransformerModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerModel")
            .field("spec", &self.spec)
            .field("loaded", &self.encoder.is_some())
            .finish()
    }
}

impl EmbeddingModel for TransformerModel {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn parameter_count(&self) -> u64 {
        self.spec
            .parameters
            .or_else(|| self.encoder.as_ref().map(|e| e.parameter_count()))
            .unwrap_or(0)
    }

    fn dimension(&self) -> usize {
        match &self.encoder {
            Some(encoder) => encoder.hidden_size(),
            None => self.spec.dimension.unwrap_or(DEFAULT_DIMENSION),
        }
    }

    fn is_fit(&self) -> bool {
        self.encoder.is_some()
    }

    /// Pretrained; `path` is not used, the encoder is reloaded from its source
    fn load(&mut self, _path: &Path) {
        self.reload();
    }

    fn sentence_vectors(&self, corpus: &[Vec<String>]) -> Result<SentenceVectors> {
        let Some(encoder) = &self.encoder else {
            error!(model = %self.spec.name, "encoder is not loaded, returning zero vectors");
            return Ok(SentenceVectors::zeros(corpus.len(), self.dimension()));
        };
        let mut vectors = Vec::with_capacity(corpus.len());
        for (i, doc) in corpus.iter().enumerate() {
            vectors.push(encoder.encode(&doc.join(" "))?);
            if (i + 1) % 100 == 0 {
                debug!(model = %self.spec.name, done = i + 1, total = corpus.len(), "encoding");
            }
        }
        Ok(SentenceVectors::Dense(vectors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Encodes text length and word count, truncated to `max_length` words
    struct CountingEncoder {
        max_length: usize,
    }

    impl SentenceEncoder for CountingEncoder {
        fn encode(&self, text: &str) -> Result<Vec<f32>> {
            let words = text.split_whitespace().take(self.max_length).count();
            Ok(vec![words as f32, text.len() as f32, 1.0])
        }

        fn hidden_size(&self) -> usize {
            3
        }

        fn parameter_count(&self) -> u64 {
            1234
        }
    }

    #[derive(Default)]
    struct FakeProvider {
        fail: bool,
        loads: AtomicUsize,
    }

    impl EncoderProvider for FakeProvider {
        fn load(&self, _root: &str, _name: &str, max_length: usize) -> Result<Box<dyn SentenceEncoder>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Backend {
                    message: "missing model directory".into(),
                    source: None,
                });
            }
            Ok(Box::new(CountingEncoder { max_length }))
        }
    }

    fn spec() -> TransformerSpec {
        TransformerSpec {
            root: "org".into(),
            name: "tiny".into(),
            parameters: None,
            max_length: Some(2),
            dimension: None,
        }
    }

    #[test]
    fn pooling_ignores_padding() {
        let hidden = [1.0, 2.0, 3.0, 4.0, 100.0, 100.0];
        assert_eq!(masked_mean_pool(&hidden, 2, &[1, 1, 0]), vec![2.0, 3.0]);
        assert_eq!(masked_mean_pool(&hidden, 2, &[0, 0, 0]), vec![0.0, 0.0]);
    }

    #[test]
    fn encodes_joined_documents() {
        let provider = Arc::new(FakeProvider::default());
        let model = TransformerModel::new(spec(), provider.clone());
        assert!(model.is_fit());
        assert_eq!(model.name(), "tiny");
        assert_eq!(model.dimension(), 3);
        assert_eq!(model.parameter_count(), 1234);

        let corpus = vec![vec!["ab".to_string(), "cd".to_string(), "ef".to_string()]];
        let vectors = model.sentence_vectors(&corpus).unwrap();
        assert_eq!(vectors, SentenceVectors::Dense(vec![vec![2.0, 8.0, 1.0]]));
        assert_eq!(provider.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn configured_parameter_count_wins() {
        let mut spec = spec();
        spec.parameters = Some(33_400_000);
        let model = TransformerModel::new(spec, Arc::new(FakeProvider::default()));
        assert_eq!(model.parameter_count(), 33_400_000);
    }

    #[test]
    fn failed_load_yields_zero_vectors() {
        let provider = Arc::new(FakeProvider {
            fail: true,
            ..FakeProvider::default()
        });
        let mut model = TransformerModel::new(spec(), provider.clone());
        assert!(!model.is_fit());
        assert_eq!(model.parameter_count(), 0);
        let corpus = vec![vec!["a".to_string()], vec![]];
        let vectors = model.sentence_vectors(&corpus).unwrap();
        assert_eq!(vectors, SentenceVectors::Dense(vec![vec![0.0; DEFAULT_DIMENSION]; 2]));

        model.load(Path::new("ignored"));
        assert_eq!(provider.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn one_row_per_document_of_hidden_width() {
        let model = TransformerModel::new(spec(), Arc::new(FakeProvider::default()));
        let corpus: Vec<Vec<String>> = [vec!["a", "b"], vec!["c"], vec!["a", "a", "b"]]
            .iter()
            .map(|doc| doc.iter().map(|t| t.to_string()).collect())
            .collect();
        let vectors = model.sentence_vectors(&corpus).unwrap();
        assert_eq!(
            vectors,
            SentenceVectors::Dense(vec![vec![2.0, 3.0, 1.0], vec![1.0, 1.0, 1.0], vec![2.0, 5.0, 1.0]])
        );
        let SentenceVectors::Dense(rows) = vectors else { unreachable!() };
        assert!(rows.iter().all(|row| row.len() == model.dimension()));
    }
}
