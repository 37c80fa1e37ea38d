use std::sync::atomic::{AtomicU64, Ordering};

use ahash::RandomState;
use dashmap::DashMap;

/// Document frequency table of the texts a vectorizer is fit on.
/// Texts are added concurrently from the rayon pool.
#[derive(Debug)]
pub struct DocFrequency {
    doc_num: AtomicU64,
    /// documents containing each term
    term_counts: DashMap<Box<str>, u64, RandomState>,
}

impl DocFrequency {
    pub fn new() -> Self {
        Self {
            doc_num: AtomicU64::new(0),
            term_counts: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Add the distinct terms of one document
    pub fn add_set<T>(&self, terms: &[T])
    where
        T: AsRef<str>,
    {
        self.doc_num.fetch_add(1, Ordering::Relaxed);
        for term in terms {
            self.term_counts
                .entry(term.as_ref().into())
                .and_modify(|count| *count += 1)
                .or_insert(1);
        }
    }

    #[inline]
    pub fn get_doc_num(&self) -> u64 {
        self.doc_num.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn get_term_count(&self, term: &str) -> u64 {
        self.term_counts.get(term).map_or(0, |count| *count)
    }

    /// All terms, sorted. Sorted order defines the feature dimensions.
    pub fn sorted_terms(&self) -> Vec<Box<str>> {
        let mut terms: Vec<Box<str>> = self.term_counts.iter().map(|entry| entry.key().clone()).collect();
        terms.sort_unstable();
        terms
    }
}
