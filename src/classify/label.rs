use std::collections::{BTreeSet, HashMap};

/// Bijective map between label strings and `0..k`.
/// Codes follow the sorted order of the distinct labels.
#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelEncoder {
    pub fn fit<T: AsRef<str>>(labels: &[T]) -> Self {
        let classes: Vec<String> = labels
            .iter()
            .map(|l| l.as_ref())
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self { classes, index }
    }

    /// Fit and encode in one pass. Every label is known, so the result is aligned with the input.
    pub fn fit_transform<T: AsRef<str>>(labels: &[T]) -> (Self, Vec<usize>) {
        let encoder = Self::fit(labels);
        let codes = labels
            .iter()
            .map(|l| encoder.index[l.as_ref()])
            .collect();
        (encoder, codes)
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    /// Decode every code. Codes outside the fitted range are skipped.
    pub fn inverse_transform(&self, codes: &[usize]) -> Vec<&str> {
        codes.iter().filter_map(|&c| self.decode(c)).collect()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn codes_follow_sorted_labels() {
        let (enc, codes) = LabelEncoder::fit_transform(&["cs.LG", "cs.AI", "cs.LG", "cs.CV"]);
        assert_eq!(enc.classes(), &["cs.AI", "cs.CV", "cs.LG"]);
        assert_eq!(codes, vec![2, 0, 2, 1]);
        assert_eq!(enc.inverse_transform(&codes), vec!["cs.LG", "cs.AI", "cs.LG", "cs.CV"]);
        assert_eq!(enc.encode("nope"), None);
        assert_eq!(enc.decode(7), None);
    }

    proptest! {
        #[test]
        fn encode_decode_round_trip(labels in prop::collection::vec("[a-d]{1,3}", 1..40)) {
            let (enc, codes) = LabelEncoder::fit_transform(&labels);
            for (label, &code) in labels.iter().zip(&codes) {
                let decoded = enc.decode(code).unwrap();
                prop_assert_eq!(decoded, label.as_str());
                prop_assert_eq!(enc.encode(decoded), Some(code));
            }
            prop_assert!(codes.iter().all(|&c| c < enc.len()));
        }
    }
}
