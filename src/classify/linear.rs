use rayon::prelude::*;
use tracing::debug;

use crate::classify::{features::Features, Classifier};

/// Rows per gradient chunk. Fixed so partial sums are merged in the same order on every run.
const CHUNK_ROWS: usize = 256;

/// Multinomial logistic regression (softmax) with an intercept and L2 penalty.
///
/// Minimises `mean(cross_entropy) + ||W||^2 / (2 * c * n)` by full-batch
/// gradient descent from zero weights. The step size is `1 / L` for the
/// Lipschitz bound `L = (max ||x||^2 + 1) / 2 + lambda`, so the loss never
/// increases.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    /// inverse regularisation strength
    pub c: f64,
    pub max_iter: usize,
    /// stop once every gradient entry is below this
    pub tol: f64,
    weights: Vec<f64>,
    bias: Vec<f64>,
    n_classes: usize,
    dim: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(1.0, 500, 1e-6)
    }
}

impl LogisticRegression {
    pub fn new(c: f64, max_iter: usize, tol: f64) -> Self {
        Self {
            c,
            max_iter,
            tol,
            weights: Vec::new(),
            bias: Vec::new(),
            n_classes: 0,
            dim: 0,
        }
    }

    fn logits(&self, x: &Features, i: usize) -> Vec<f64> {
        let row = x.row(i);
        (0..self.n_classes)
            .map(|k| row.dot(&self.weights[k * self.dim..(k + 1) * self.dim]) + self.bias[k])
            .collect()
    }

    /// Gradient of the summed (not yet averaged) loss over `rows`
    fn partial_gradient(&self, x: &Features, y: &[usize], rows: std::ops::Range<usize>) -> (Vec<f64>, Vec<f64>) {
        let mut gw = vec![0.0; self.n_classes * self.dim];
        let mut gb = vec![0.0; self.n_classes];
        for i in rows {
            let probs = softmax(self.logits(x, i));
            let row = x.row(i);
            for (k, p) in probs.into_iter().enumerate() {
                let g = p - if y[i] == k { 1.0 } else { 0.0 };
                row.add_scaled(g, &mut gw[k * self.dim..(k + 1) * self.dim]);
                gb[k] += g;
            }
        }
        (gw, gb)
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        "Logistic Regression"
    }

    fn fit(&mut self, x: &Features, y: &[usize], n_classes: usize) {
        let n = x.len();
        self.n_classes = n_classes;
        self.dim = x.dim();
        self.weights = vec![0.0; n_classes * self.dim];
        self.bias = vec![0.0; n_classes];
        if n == 0 || n_classes < 2 {
            return;
        }

        let lambda = 1.0 / (self.c * n as f64);
        let max_norm_sq = x.rows().map(|r| r.norm_sq()).fold(0.0, f64::max);
        let step = 1.0 / (0.5 * (max_norm_sq + 1.0) + lambda);

        let chunks: Vec<std::ops::Range<usize>> = (0..n)
            .step_by(CHUNK_ROWS)
            .map(|start| start..(start + CHUNK_ROWS).min(n))
            .collect();

        for iter in 0..self.max_iter {
            let partials: Vec<(Vec<f64>, Vec<f64>)> = chunks
                .par_iter()
                .map(|rows| self.partial_gradient(x, y, rows.clone()))
                .collect();

            let mut gw = vec![0.0; self.weights.len()];
            let mut gb = vec![0.0; n_classes];
            for (pw, pb) in partials {
                gw.iter_mut().zip(pw).for_each(|(a, b)| *a += b);
                gb.iter_mut().zip(pb).for_each(|(a, b)| *a += b);
            }
            let inv_n = 1.0 / n as f64;
            for (g, w) in gw.iter_mut().zip(&self.weights) {
                *g = *g * inv_n + lambda * w;
            }
            gb.iter_mut().for_each(|g| *g *= inv_n);

            let max_grad = gw.iter().chain(&gb).fold(0.0f64, |m, g| m.max(g.abs()));
            if max_grad < self.tol {
                debug!(iterations = iter, "logistic regression converged");
                break;
            }
            self.weights.iter_mut().zip(&gw).for_each(|(w, g)| *w -= step * g);
            self.bias.iter_mut().zip(&gb).for_each(|(b, g)| *b -= step * g);
        }
    }

    fn predict(&self, x: &Features) -> Vec<usize> {
        (0..x.len())
            .map(|i| {
                if self.n_classes == 0 {
                    0
                } else {
                    argmax(&self.logits(x, i))
                }
            })
            .collect()
    }
}

fn softmax(mut logits: Vec<f64>) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in logits.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    logits.iter_mut().for_each(|v| *v /= sum);
    logits
}

/// Index of the largest value; the first one wins ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_linearly_separable_points() {
        let x = Features::dense(vec![
            vec![2.0, 0.1],
            vec![1.8, -0.2],
            vec![2.2, 0.0],
            vec![-0.1, 2.0],
            vec![0.2, 1.9],
            vec![0.0, 2.1],
            vec![-2.0, -2.0],
            vec![-1.9, -2.1],
        ]);
        let y = vec![0, 0, 0, 1, 1, 1, 2, 2];
        let mut clf = LogisticRegression::default();
        clf.fit(&x, &y, 3);
        assert_eq!(clf.predict(&x), y);

        let unseen = Features::dense(vec![vec![3.0, 0.0], vec![0.0, 3.0], vec![-3.0, -3.0]]);
        assert_eq!(clf.predict(&unseen), vec![0, 1, 2]);
    }

    #[test]
    fn single_class_predicts_that_class() {
        let x = Features::dense(vec![vec![1.0], vec![2.0]]);
        let mut clf = LogisticRegression::default();
        clf.fit(&x, &[0, 0], 1);
        assert_eq!(clf.predict(&x), vec![0, 0]);
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), 1);
        assert_eq!(argmax(&[0.0, 0.0]), 0);
    }
}
