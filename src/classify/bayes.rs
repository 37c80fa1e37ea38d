use crate::classify::{features::Features, linear::argmax, Classifier};

/// Multinomial naive Bayes over non-negative features (counts or TF-IDF).
#[derive(Debug, Clone)]
pub struct MultinomialNb {
    /// additive (Laplace/Lidstone) smoothing
    pub alpha: f64,
    class_log_prior: Vec<f64>,
    /// `n_classes x dim`, row-major
    feature_log_prob: Vec<f64>,
    dim: usize,
}

impl Default for MultinomialNb {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl MultinomialNb {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            class_log_prior: Vec::new(),
            feature_log_prob: Vec::new(),
            dim: 0,
        }
    }

    fn joint_log_likelihood(&self, x: &Features, i: usize) -> Vec<f64> {
        let row = x.row(i);
        self.class_log_prior
            .iter()
            .enumerate()
            .map(|(k, prior)| prior + row.dot(&self.feature_log_prob[k * self.dim..(k + 1) * self.dim]))
            .collect()
    }
}

impl Classifier for MultinomialNb {
    fn name(&self) -> &str {
        "Multinomial Naive Bayes"
    }

    fn fit(&mut self, x: &Features, y: &[usize], n_classes: usize) {
        let dim = x.dim();
        let mut class_count = vec![0u64; n_classes];
        let mut feature_count = vec![0.0; n_classes * dim];
        for (row, &k) in x.rows().zip(y) {
            class_count[k] += 1;
            row.add_scaled(1.0, &mut feature_count[k * dim..(k + 1) * dim]);
        }

        let total = class_count.iter().sum::<u64>() as f64;
        self.class_log_prior = class_count
            .iter()
            .map(|&c| if c == 0 { f64::NEG_INFINITY } else { (c as f64 / total).ln() })
            .collect();

        self.feature_log_prob = Vec::with_capacity(n_classes * dim);
        for k in 0..n_classes {
            let counts = &feature_count[k * dim..(k + 1) * dim];
            let denom = (counts.iter().sum::<f64>() + self.alpha * dim as f64).ln();
            self.feature_log_prob
                .extend(counts.iter().map(|c| (c + self.alpha).ln() - denom));
        }
        self.dim = dim;
    }

    fn predict(&self, x: &Features) -> Vec<usize> {
        (0..x.len())
            .map(|i| argmax(&self.joint_log_likelihood(x, i)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::sparse::SparseVec;

    fn rows(pairs: &[&[(u32, f64)]]) -> Features {
        Features::sparse(
            pairs.iter().map(|p| SparseVec::from_pairs(p.to_vec())).collect(),
            4,
        )
    }

    #[test]
    fn picks_class_with_matching_vocabulary() {
        let train = rows(&[
            &[(0, 3.0), (1, 1.0)],
            &[(0, 2.0), (1, 2.0)],
            &[(2, 3.0), (3, 1.0)],
            &[(2, 1.0), (3, 2.0)],
        ]);
        let mut nb = MultinomialNb::default();
        nb.fit(&train, &[0, 0, 1, 1], 2);
        assert_eq!(nb.predict(&train), vec![0, 0, 1, 1]);
        assert_eq!(nb.predict(&rows(&[&[(3, 1.0)], &[(1, 1.0)]])), vec![1, 0]);
    }

    #[test]
    fn unseen_class_is_never_predicted() {
        let train = rows(&[&[(0, 1.0)], &[(1, 1.0)]]);
        let mut nb = MultinomialNb::default();
        nb.fit(&train, &[0, 2], 3);
        let pred = nb.predict(&rows(&[&[(0, 1.0)], &[(1, 1.0)], &[]]));
        assert!(pred.iter().all(|&k| k != 1));
        assert_eq!(&pred[..2], &[0, 2]);
    }
}
