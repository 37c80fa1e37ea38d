use indexmap::IndexMap;
use num::{Float, FromPrimitive};

use crate::{
    utils::sparse::SparseVec,
    vectorizer::{doc_freq::DocFrequency, token::TokenFrequency},
};

/// TF-IDF calculation engine.
/// Plug a different weighting scheme into `TFIDFVectorizer<N, E>` by
/// implementing this trait. Engines are shared across the rayon pool.
pub trait TFIDFEngine<N>: Send + Sync
where
    N: Float,
{
    /// Build the IDF vector
    /// # Arguments
    /// * `doc_freq` - document frequencies of the fitted texts
    /// * `vocabulary` - terms in feature order
    /// # Returns
    /// * `Vec<N>` - one weight per feature
    fn idf_vec(doc_freq: &DocFrequency, vocabulary: &[Box<str>]) -> Vec<N>;

    /// Build the (unweighted) TF vector of one document.
    /// Tokens outside the vocabulary are ignored.
    fn tf_vec(freq: &TokenFrequency, vocabulary: &IndexMap<Box<str>, u32>) -> SparseVec<N>;
}

/// Default engine: raw counts and smoothed IDF.
/// `idf(t) = ln((1 + n) / (1 + df(t))) + 1`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTFIDFEngine;

impl<N> TFIDFEngine<N> for DefaultTFIDFEngine
where
    N: Float + FromPrimitive,
{
    fn idf_vec(doc_freq: &DocFrequency, vocabulary: &[Box<str>]) -> Vec<N> {
        let doc_num = doc_freq.get_doc_num() as f64;
        vocabulary
            .iter()
            .map(|term| {
                let df = doc_freq.get_term_count(term) as f64;
                let idf = ((1.0 + doc_num) / (1.0 + df)).ln() + 1.0;
                N::from_f64(idf).unwrap_or_else(N::one)
            })
            .collect()
    }

    fn tf_vec(freq: &TokenFrequency, vocabulary: &IndexMap<Box<str>, u32>) -> SparseVec<N> {
        let pairs = freq
            .iter()
            .filter_map(|(token, count)| {
                let idx = *vocabulary.get(token)?;
                Some((idx, N::from_u64(count)?))
            })
            .collect();
        SparseVec::from_pairs(pairs)
    }
}
