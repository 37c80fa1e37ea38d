use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    ops::Range,
    path::Path,
};

use ahash::AHashMap;
use indexmap::IndexMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    interchange,
    models::word2vec::{Architecture, Word2VecConfig},
    utils::fs::ensure_parent,
    vectorizer::token::TokenFrequency,
};

/// Hyperparameters of one training run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainParams {
    /// initial learning rate
    pub alpha: f64,
    /// maximum distance between target and context word
    pub window: usize,
    /// noise words drawn per positive example
    pub negative: usize,
    pub config: Word2VecConfig,
}

/// Fitted word2vec model: vocabulary plus input (`syn0`) and output
/// (`syn1neg`) weights, both `vocab x vector_size`, row-major.
///
/// Word vectors are the `syn0` rows. The vocabulary is ordered by
/// descending corpus frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word2Vec {
    #[serde(with = "indexmap::map::serde_seq")]
    vocab: IndexMap<String, u64>,
    vector_size: usize,
    syn0: Vec<f32>,
    syn1neg: Vec<f32>,
    training_loss: f64,
}

impl Word2Vec {
    /// Train with negative sampling.
    ///
    /// Documents are grouped into batches of about `batch_words` tokens.
    /// Inside a batch every document is trained in parallel against the
    /// weights from the start of the batch; the per-document updates are
    /// then added in document order. The result depends only on the
    /// inputs and `seed`, never on the thread count.
    pub fn train(corpus: &[Vec<String>], params: &TrainParams, seed: u64) -> Self {
        let cfg = &params.config;
        let dim = cfg.vector_size.max(1);
        let vocab = build_vocab(corpus, cfg.min_count);
        let n_words = vocab.len();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let syn0 = (0..n_words * dim)
            .map(|_| (rng.gen::<f32>() - 0.5) / dim as f32)
            .collect();
        let mut model = Self {
            vocab,
            vector_size: dim,
            syn0,
            syn1neg: vec![0.0; n_words * dim],
            training_loss: 0.0,
        };
        if n_words == 0 {
            return model;
        }

        let counts: Vec<u64> = model.vocab.values().copied().collect();
        let keep_prob = downsample_probabilities(&counts, cfg.sample);
        let table = NegativeTable::new(&counts, cfg.ns_exponent);
        let docs: Vec<Vec<u32>> = corpus
            .iter()
            .map(|doc| {
                doc.iter()
                    .filter_map(|w| model.vocab.get_index_of(w.as_str()).map(|i| i as u32))
                    .collect()
            })
            .collect();
        let batches = make_batches(&docs, cfg.batch_words);
        let total_words: u64 = docs.iter().map(|d| d.len() as u64).sum();
        let total = (total_words * cfg.epochs as u64).max(1) as f64;
        let mut processed = 0u64;

        for epoch in 0..cfg.epochs {
            for batch in &batches {
                let progress = processed as f64 / total;
                let alpha = (params.alpha - (params.alpha - cfg.min_alpha) * progress).max(cfg.min_alpha) as f32;
                let updates: Vec<DocUpdate> = {
                    let trainer = DocTrainer {
                        syn0: &model.syn0,
                        syn1neg: &model.syn1neg,
                        dim,
                        window: params.window.max(1),
                        negative: params.negative,
                        architecture: cfg.architecture,
                        keep_prob: &keep_prob,
                        table: &table,
                    };
                    batch
                        .clone()
                        .into_par_iter()
                        .map(|d| {
                            let mut rng = ChaCha8Rng::seed_from_u64(seed);
                            rng.set_stream((epoch * docs.len() + d) as u64);
                            trainer.train(&docs[d], alpha, &mut rng)
                        })
                        .collect()
                };
                for update in updates {
                    apply(&mut model.syn0, &update.syn0, dim);
                    apply(&mut model.syn1neg, &update.syn1neg, dim);
                    model.training_loss += update.loss;
                }
                processed += docs[batch.clone()].iter().map(|d| d.len() as u64).sum::<u64>();
            }
        }
        model
    }

    /// Vector of `word`, if it is in the vocabulary
    pub fn vector(&self, word: &str) -> Option<&[f32]> {
        let i = self.vocab.get_index_of(word)?;
        Some(&self.syn0[i * self.vector_size..(i + 1) * self.vector_size])
    }

    #[inline]
    pub fn contains(&self, word: &str) -> bool {
        self.vocab.contains_key(word)
    }

    /// Corpus frequency of `word`
    pub fn count(&self, word: &str) -> Option<u64> {
        self.vocab.get(word).copied()
    }

    /// Mean vector of the known words; a zero vector if none is known
    pub fn mean_vector<T: AsRef<str>>(&self, words: &[T]) -> Vec<f32> {
        let mut mean = vec![0.0f32; self.vector_size];
        let mut known = 0usize;
        for v in words.iter().filter_map(|w| self.vector(w.as_ref())) {
            mean.iter_mut().zip(v).for_each(|(m, x)| *m += x);
            known += 1;
        }
        if known > 0 {
            let inv = 1.0 / known as f32;
            mean.iter_mut().for_each(|m| *m *= inv);
        }
        mean
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.vocab.keys().map(String::as_str)
    }

    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    #[inline]
    pub fn vector_size(&self) -> usize {
        self.vector_size
    }

    /// Summed negative-sampling loss over all epochs
    #[inline]
    pub fn training_loss(&self) -> f64 {
        self.training_loss
    }

    /// Serialize into any byte sink (CBOR)
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        serde_cbor::to_writer(writer, self)?;
        Ok(())
    }

    /// Restore from a byte source written by `write_to`
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_cbor::from_reader(reader)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush().map_err(|e| Error::io(path, e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        Self::read_from(BufReader::new(file))
    }

    /// Write every word vector in the word-vector text format
    pub fn save_word_vectors(&self, path: &Path) -> Result<()> {
        let words: Vec<&str> = self.words().collect();
        let rows: Vec<&[f32]> = self.syn0.chunks(self.vector_size).collect();
        interchange::write_vectors(path, &words, &rows)
    }
}

/// Vocabulary sorted by descending count, first occurrence first on ties
fn build_vocab(corpus: &[Vec<String>], min_count: u64) -> IndexMap<String, u64> {
    let mut freq = TokenFrequency::new();
    for doc in corpus {
        freq.add_tokens(doc);
    }
    freq.sorted_frequency_vector()
        .into_iter()
        .filter(|(_, count)| *count >= min_count)
        .collect()
}

/// Probability of keeping each occurrence of a word.
/// `sample < 1` is a fraction of the corpus size, otherwise an absolute count.
fn downsample_probabilities(counts: &[u64], sample: f64) -> Vec<f64> {
    if sample <= 0.0 {
        return vec![1.0; counts.len()];
    }
    let total: u64 = counts.iter().sum();
    let threshold = if sample < 1.0 { sample * total as f64 } else { sample };
    counts
        .iter()
        .map(|&c| {
            let c = c as f64;
            (((c / threshold).sqrt() + 1.0) * (threshold / c)).min(1.0)
        })
        .collect()
}

/// Consecutive document ranges of roughly `batch_words` tokens each
fn make_batches(docs: &[Vec<u32>], batch_words: usize) -> Vec<Range<usize>> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut words = 0;
    for (i, doc) in docs.iter().enumerate() {
        words += doc.len();
        if words >= batch_words.max(1) {
            batches.push(start..i + 1);
            start = i + 1;
            words = 0;
        }
    }
    if start < docs.len() {
        batches.push(start..docs.len());
    }
    batches
}

/// Unigram^exponent noise distribution
struct NegativeTable {
    cumulative: Vec<f64>,
}

impl NegativeTable {
    fn new(counts: &[u64], exponent: f64) -> Self {
        let mut sum = 0.0;
        let cumulative = counts
            .iter()
            .map(|&c| {
                sum += (c as f64).powf(exponent);
                sum
            })
            .collect();
        Self { cumulative }
    }

    fn sample(&self, rng: &mut ChaCha8Rng) -> u32 {
        let total = self.cumulative.last().copied().unwrap_or(0.0);
        let x = rng.gen::<f64>() * total;
        let idx = self.cumulative.partition_point(|&c| c <= x);
        idx.min(self.cumulative.len().saturating_sub(1)) as u32
    }
}

/// Row updates produced by one document
struct DocUpdate {
    syn0: AHashMap<u32, Vec<f32>>,
    syn1neg: AHashMap<u32, Vec<f32>>,
    loss: f64,
}

fn apply(weights: &mut [f32], delta: &AHashMap<u32, Vec<f32>>, dim: usize) {
    for (&idx, d) in delta {
        let start = idx as usize * dim;
        weights[start..start + dim]
            .iter_mut()
            .zip(d)
            .for_each(|(w, v)| *w += v);
    }
}

/// Read-only weights with the document's own pending updates on top
struct Overlay<'a> {
    base: &'a [f32],
    dim: usize,
    delta: AHashMap<u32, Vec<f32>>,
}

impl<'a> Overlay<'a> {
    fn new(base: &'a [f32], dim: usize) -> Self {
        Self {
            base,
            dim,
            delta: AHashMap::new(),
        }
    }

    /// `acc += row(idx)`
    fn accumulate(&self, idx: u32, acc: &mut [f32]) {
        let start = idx as usize * self.dim;
        acc.iter_mut()
            .zip(&self.base[start..start + self.dim])
            .for_each(|(a, b)| *a += b);
        if let Some(d) = self.delta.get(&idx) {
            acc.iter_mut().zip(d).for_each(|(a, v)| *a += v);
        }
    }

    fn row(&self, idx: u32, out: &mut [f32]) {
        out.fill(0.0);
        self.accumulate(idx, out);
    }

    /// `row(idx) += g * v`
    fn add(&mut self, idx: u32, g: f32, v: &[f32]) {
        let dim = self.dim;
        let d = self.delta.entry(idx).or_insert_with(|| vec![0.0; dim]);
        d.iter_mut().zip(v).for_each(|(a, x)| *a += g * x);
    }
}

struct DocTrainer<'a> {
    syn0: &'a [f32],
    syn1neg: &'a [f32],
    dim: usize,
    window: usize,
    negative: usize,
    architecture: Architecture,
    keep_prob: &'a [f64],
    table: &'a NegativeTable,
}

impl DocTrainer<'_> {
    fn train(&self, doc: &[u32], alpha: f32, rng: &mut ChaCha8Rng) -> DocUpdate {
        let sentence: Vec<u32> = doc
            .iter()
            .copied()
            .filter(|&w| {
                let p = self.keep_prob[w as usize];
                p >= 1.0 || rng.gen::<f64>() < p
            })
            .collect();

        let mut syn0 = Overlay::new(self.syn0, self.dim);
        let mut syn1 = Overlay::new(self.syn1neg, self.dim);
        let mut l1 = vec![0.0f32; self.dim];
        let mut neu1e = vec![0.0f32; self.dim];
        let mut buf = vec![0.0f32; self.dim];
        let mut loss = 0.0;

        for (pos, &word) in sentence.iter().enumerate() {
            // reduced window, as in the reference word2vec
            let reach = self.window - rng.gen_range(0..self.window);
            let start = pos.saturating_sub(reach);
            let end = (pos + reach + 1).min(sentence.len());

            match self.architecture {
                Architecture::Cbow => {
                    let context: Vec<u32> = (start..end)
                        .filter(|&j| j != pos)
                        .map(|j| sentence[j])
                        .collect();
                    if context.is_empty() {
                        continue;
                    }
                    l1.fill(0.0);
                    for &c in &context {
                        syn0.accumulate(c, &mut l1);
                    }
                    let inv = 1.0 / context.len() as f32;
                    l1.iter_mut().for_each(|v| *v *= inv);
                    neu1e.fill(0.0);
                    loss += self.negative_sampling(word, &l1, &mut neu1e, &mut syn1, &mut buf, alpha, rng);
                    neu1e.iter_mut().for_each(|v| *v *= inv);
                    for &c in &context {
                        syn0.add(c, 1.0, &neu1e);
                    }
                }
                Architecture::SkipGram => {
                    for j in (start..end).filter(|&j| j != pos) {
                        let context_word = sentence[j];
                        syn0.row(context_word, &mut l1);
                        neu1e.fill(0.0);
                        loss += self.negative_sampling(word, &l1, &mut neu1e, &mut syn1, &mut buf, alpha, rng);
                        syn0.add(context_word, 1.0, &neu1e);
                    }
                }
            }
        }

        DocUpdate {
            syn0: syn0.delta,
            syn1neg: syn1.delta,
            loss,
        }
    }

    /// One positive and `negative` noise updates for `word` given hidden layer `l1`.
    /// Accumulates the hidden-layer error into `neu1e` and returns the loss.
    #[allow(clippy::too_many_arguments)]
    fn negative_sampling(
        &self,
        word: u32,
        l1: &[f32],
        neu1e: &mut [f32],
        syn1: &mut Overlay<'_>,
        buf: &mut [f32],
        alpha: f32,
        rng: &mut ChaCha8Rng,
    ) -> f64 {
        let mut loss = 0.0;
        for d in 0..=self.negative {
            let (target, label) = if d == 0 {
                (word, 1.0f32)
            } else {
                let noise = self.table.sample(rng);
                if noise == word {
                    continue;
                }
                (noise, 0.0f32)
            };
            syn1.row(target, buf);
            let f: f32 = l1.iter().zip(buf.iter()).map(|(a, b)| a * b).sum();
            let sig = sigmoid(f);
            // -ln(sigmoid(f)) for the positive, -ln(sigmoid(-f)) for noise
            let sample_loss = if label > 0.5 { softplus(-f) } else { softplus(f) };
            loss += f64::from(sample_loss);
            let g = (label - sig) * alpha;
            neu1e.iter_mut().zip(buf.iter()).for_each(|(e, b)| *e += g * b);
            syn1.add(target, g, l1);
        }
        loss
    }
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// `ln(1 + e^x)` without overflow
#[inline]
fn softplus(x: f32) -> f32 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}
