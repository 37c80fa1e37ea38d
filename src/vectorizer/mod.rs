pub mod doc_freq;
pub mod tfidf;
pub mod token;

use std::marker::PhantomData;

use indexmap::IndexMap;
use num::{Float, FromPrimitive};
use rayon::prelude::*;

use crate::{
    utils::sparse::SparseVec,
    vectorizer::{
        doc_freq::DocFrequency,
        tfidf::{DefaultTFIDFEngine, TFIDFEngine},
        token::TokenFrequency,
    },
};

/// TF-IDF vectorizer for raw text.
/// The vocabulary and IDF weights come from the texts passed to `fit`;
/// `transform` maps any text onto that fixed feature space and
/// L2-normalises each row.
///
/// `TFIDFVectorizer<N, E>`:
/// - `N`: value type (f32, f64)
/// - `E`: weighting engine (default `DefaultTFIDFEngine`)
#[derive(Debug, Clone)]
pub struct TFIDFVectorizer<N = f64, E = DefaultTFIDFEngine>
where
    N: Float + Send + Sync,
    E: TFIDFEngine<N>,
{
    /// term -> feature index, sorted by term
    pub vocabulary: IndexMap<Box<str>, u32>,
    /// IDF weight per feature
    pub idf: Vec<N>,
    _marker: PhantomData<E>,
}

impl<N, E> Default for TFIDFVectorizer<N, E>
where
    N: Float + FromPrimitive + Send + Sync,
    E: TFIDFEngine<N>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> TFIDFVectorizer<N, E>
where
    N: Float + FromPrimitive + Send + Sync,
    E: TFIDFEngine<N>,
{
    pub fn new() -> Self {
        Self {
            vocabulary: IndexMap::new(),
            idf: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Learn vocabulary and IDF from `texts`. Previous state is discarded.
    pub fn fit<T>(&mut self, texts: &[T])
    where
        T: AsRef<str> + Sync,
    {
        let doc_freq = DocFrequency::new();
        texts.par_iter().for_each(|text| {
            let freq = term_frequency(text.as_ref());
            doc_freq.add_set(&freq.token_set_ref_str());
        });

        let terms = doc_freq.sorted_terms();
        self.idf = E::idf_vec(&doc_freq, &terms);
        self.vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t, i as u32))
            .collect();
    }

    /// Map texts onto the fitted feature space
    pub fn transform<T>(&self, texts: &[T]) -> Vec<SparseVec<N>>
    where
        T: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.transform_one(text.as_ref()))
            .collect()
    }

    pub fn fit_transform<T>(&mut self, texts: &[T]) -> Vec<SparseVec<N>>
    where
        T: AsRef<str> + Sync,
    {
        self.fit(texts);
        self.transform(texts)
    }

    fn transform_one(&self, text: &str) -> SparseVec<N> {
        let freq = term_frequency(text);
        let tf = E::tf_vec(&freq, &self.vocabulary);
        let pairs = tf
            .iter()
            .map(|(idx, v)| (idx, v * self.idf[idx as usize]))
            .collect();
        let mut row = SparseVec::from_pairs(pairs);
        row.l2_normalize();
        row
    }

    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Split text into lowercase terms: maximal runs of word characters
/// (alphanumeric or `_`), keeping runs of at least two characters.
pub fn analyze(text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let flush = |current: &mut String, terms: &mut Vec<String>| {
        if current.chars().count() >= 2 {
            terms.push(std::mem::take(current));
        } else {
            current.clear();
        }
    };
    for c in text.chars() {
        if c.is_alphanumeric() || c == '_' {
            current.extend(c.to_lowercase());
        } else {
            flush(&mut current, &mut terms);
        }
    }
    flush(&mut current, &mut terms);
    terms
}

fn term_frequency(text: &str) -> TokenFrequency {
    let mut freq = TokenFrequency::new();
    freq.add_tokens(&analyze(text));
    freq
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_drops_short_runs_and_lowercases() {
        assert_eq!(analyze("A cat, The DOG_x 42 b"), vec!["cat", "the", "dog_x", "42"]);
        assert!(analyze("").is_empty());
    }

    #[test]
    fn fit_builds_sorted_vocabulary() {
        let mut v: TFIDFVectorizer = TFIDFVectorizer::new();
        v.fit(&["zeta alpha", "alpha beta"]);
        let vocab: Vec<&str> = v.vocabulary.keys().map(|k| &**k).collect();
        assert_eq!(vocab, vec!["alpha", "beta", "zeta"]);
        assert_eq!(v.idf.len(), 3);
    }

    #[test]
    fn transform_rows_are_unit_length_and_ignore_unseen() {
        let mut v: TFIDFVectorizer = TFIDFVectorizer::new();
        let rows = v.fit_transform(&["red green", "green blue blue"]);
        for row in &rows {
            assert!((row.norm() - 1.0).abs() < 1e-9);
        }
        let unseen = v.transform(&["purple orange"]);
        assert_eq!(unseen[0].iter().count(), 0);
        // rarer term weighs more than a shared term with the same count
        let weight = |term: &str| {
            let idx = v.vocabulary[term];
            rows[0].iter().find(|&(i, _)| i == idx).map_or(0.0, |(_, w)| w)
        };
        assert!(weight("red") > weight("green"));
    }
}
