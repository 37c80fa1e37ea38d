use indexmap::IndexMap;

/// Token counts of one text or a whole corpus.
/// Insertion order is kept, so ties in frequency resolve to first-seen order.
///
/// # Examples
/// ```
/// use embedding_eval::TokenFrequency;
/// let mut freq = TokenFrequency::new();
/// freq.add_tokens(&["rust", "vector", "rust"]);
/// assert_eq!(freq.sorted_frequency_vector()[0], ("rust".to_string(), 2));
/// assert_eq!(freq.token_num(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TokenFrequency {
    counts: IndexMap<String, u64>,
}

impl TokenFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add_token(&mut self, token: &str) -> &mut Self {
        match self.counts.get_mut(token) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(token.to_string(), 1);
            }
        }
        self
    }

    pub fn add_tokens<T>(&mut self, tokens: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for token in tokens {
            self.add_token(token.as_ref());
        }
        self
    }

    /// Number of distinct tokens
    #[inline]
    pub fn token_num(&self) -> usize {
        self.counts.len()
    }

    /// `(token, count)` in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(t, &c)| (t.as_str(), c))
    }

    /// Distinct tokens in first-seen order
    pub fn token_set_ref_str(&self) -> Vec<&str> {
        self.counts.keys().map(String::as_str).collect()
    }

    /// Tokens by descending count; equal counts keep first-seen order
    pub fn sorted_frequency_vector(&self) -> Vec<(String, u64)> {
        let mut ranked: Vec<(String, u64)> = self.counts.iter().map(|(t, &c)| (t.clone(), c)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_distinct_tokens_in_first_seen_order() {
        let mut freq = TokenFrequency::new();
        freq.add_tokens(&["a", "b", "a"]).add_token("c");
        assert_eq!(freq.token_num(), 3);
        assert_eq!(freq.token_set_ref_str(), vec!["a", "b", "c"]);
        assert_eq!(freq.iter().collect::<Vec<_>>(), vec![("a", 2), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn sorted_frequency_ties_keep_first_seen_order() {
        let mut freq = TokenFrequency::new();
        freq.add_tokens(&["y", "x", "z", "x", "z"]);
        assert_eq!(
            freq.sorted_frequency_vector(),
            vec![("x".to_string(), 2), ("z".to_string(), 2), ("y".to_string(), 1)]
        );
    }
}
