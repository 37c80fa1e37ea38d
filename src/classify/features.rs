use crate::utils::sparse::SparseVec;

/// Feature matrix handed to a `Classifier`.
/// Dense rows come from embedding models, sparse rows from TF-IDF.
#[derive(Debug, Clone)]
pub enum Features {
    Dense { rows: Vec<Vec<f32>>, dim: usize },
    Sparse { rows: Vec<SparseVec<f64>>, dim: usize },
}

/// Borrowed view of one feature row
#[derive(Debug, Clone, Copy)]
pub enum Row<'a> {
    Dense(&'a [f32]),
    Sparse(&'a SparseVec<f64>),
}

impl Features {
    /// Dense matrix; the dimension is the widest row.
    pub fn dense(rows: Vec<Vec<f32>>) -> Self {
        let dim = rows.iter().map(Vec::len).max().unwrap_or(0);
        Features::Dense { rows, dim }
    }

    pub fn sparse(rows: Vec<SparseVec<f64>>, dim: usize) -> Self {
        Features::Sparse { rows, dim }
    }

    pub fn len(&self) -> usize {
        match self {
            Features::Dense { rows, .. } => rows.len(),
            Features::Sparse { rows, .. } => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dim(&self) -> usize {
        match self {
            Features::Dense { dim, .. } | Features::Sparse { dim, .. } => *dim,
        }
    }

    pub fn row(&self, i: usize) -> Row<'_> {
        match self {
            Features::Dense { rows, .. } => Row::Dense(&rows[i]),
            Features::Sparse { rows, .. } => Row::Sparse(&rows[i]),
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.len()).map(move |i| self.row(i))
    }

    /// Copy the rows at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Features {
        match self {
            Features::Dense { rows, dim } => Features::Dense {
                rows: indices.iter().map(|&i| rows[i].clone()).collect(),
                dim: *dim,
            },
            Features::Sparse { rows, dim } => Features::Sparse {
                rows: indices.iter().map(|&i| rows[i].clone()).collect(),
                dim: *dim,
            },
        }
    }
}

impl Row<'_> {
    /// Dot product with a dense weight slice
    #[inline]
    pub fn dot(&self, w: &[f64]) -> f64 {
        match self {
            Row::Dense(x) => x.iter().zip(w).map(|(&a, &b)| a as f64 * b).sum(),
            Row::Sparse(x) => x
                .iter()
                .filter_map(|(i, v)| w.get(i as usize).map(|wi| v * wi))
                .sum(),
        }
    }

    /// `out += a * self`
    #[inline]
    pub fn add_scaled(&self, a: f64, out: &mut [f64]) {
        match self {
            Row::Dense(x) => {
                for (o, &v) in out.iter_mut().zip(x.iter()) {
                    *o += a * v as f64;
                }
            }
            Row::Sparse(x) => {
                for (i, v) in x.iter() {
                    if let Some(o) = out.get_mut(i as usize) {
                        *o += a * v;
                    }
                }
            }
        }
    }

    #[inline]
    pub fn norm_sq(&self) -> f64 {
        match self {
            Row::Dense(x) => x.iter().map(|&v| (v as f64) * (v as f64)).sum(),
            Row::Sparse(x) => x.iter().map(|(_, v)| v * v).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_and_sparse_rows_agree() {
        let dense = Features::dense(vec![vec![1.0, 0.0, 2.0]]);
        let sparse = Features::sparse(vec![SparseVec::from_pairs(vec![(0, 1.0), (2, 2.0)])], 3);
        let w = [0.5, 9.0, 0.25];
        assert_eq!(dense.row(0).dot(&w), 1.0);
        assert_eq!(sparse.row(0).dot(&w), 1.0);
        assert_eq!(dense.row(0).norm_sq(), sparse.row(0).norm_sq());

        let mut a = vec![0.0; 3];
        let mut b = vec![0.0; 3];
        dense.row(0).add_scaled(2.0, &mut a);
        sparse.row(0).add_scaled(2.0, &mut b);
        assert_eq!(a, b);
        assert_eq!(a, vec![2.0, 0.0, 4.0]);
    }

    #[test]
    fn select_keeps_requested_order() {
        let f = Features::dense(vec![vec![0.0], vec![1.0], vec![2.0]]);
        let s = f.select(&[2, 0]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.dim(), 1);
        assert_eq!(s.row(0).dot(&[1.0]), 2.0);
        assert_eq!(s.row(1).dot(&[1.0]), 0.0);
    }
}
