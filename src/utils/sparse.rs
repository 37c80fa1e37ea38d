use num::Float;

use crate::utils::sort::radix_sort_u32_soa;

/// Sparse vector stored as two parallel arrays (SoA).
/// `inds` is strictly ascending and no stored value is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVec<N> {
    inds: Vec<u32>,
    vals: Vec<N>,
}

impl<N> SparseVec<N>
where
    N: Float,
{
    /// Build from unordered `(index, value)` pairs.
    /// Duplicated indices are summed, then zero values are dropped.
    pub fn from_pairs(pairs: Vec<(u32, N)>) -> Self {
        let (mut inds, mut vals): (Vec<u32>, Vec<N>) = pairs.into_iter().unzip();
        radix_sort_u32_soa(&mut inds, &mut vals);

        let mut out = Self {
            inds: Vec::with_capacity(inds.len()),
            vals: Vec::with_capacity(vals.len()),
        };
        for (i, v) in inds.into_iter().zip(vals) {
            match out.inds.last() {
                Some(&last) if last == i => {
                    if let Some(acc) = out.vals.last_mut() {
                        *acc = *acc + v;
                    }
                }
                _ => {
                    out.inds.push(i);
                    out.vals.push(v);
                }
            }
        }
        out.drop_zeros();
        out
    }

    fn drop_zeros(&mut self) {
        let mut keep = 0;
        for j in 0..self.inds.len() {
            if !self.vals[j].is_zero() {
                self.inds[keep] = self.inds[j];
                self.vals[keep] = self.vals[j];
                keep += 1;
            }
        }
        self.inds.truncate(keep);
        self.vals.truncate(keep);
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, N)> + '_ {
        self.inds.iter().copied().zip(self.vals.iter().copied())
    }

    pub fn norm(&self) -> N {
        self.vals.iter().fold(N::zero(), |acc, &v| acc + v * v).sqrt()
    }

    /// Scale to unit L2 norm. A zero vector is left untouched.
    pub fn l2_normalize(&mut self) {
        let norm = self.norm();
        if norm > N::zero() {
            for v in self.vals.iter_mut() {
                *v = *v / norm;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pairs_sorts_merges_and_drops_zero() {
        let v = SparseVec::from_pairs(vec![(4, 1.0f64), (1, 2.0), (4, 0.5), (2, 0.0), (3, 1.0), (3, -1.0)]);
        assert_eq!(v.iter().collect::<Vec<_>>(), vec![(1, 2.0), (4, 1.5)]);
    }

    #[test]
    fn l2_normalize_unit_norm() {
        let mut v = SparseVec::from_pairs(vec![(0, 3.0f64), (2, 4.0)]);
        v.l2_normalize();
        assert!((v.norm() - 1.0).abs() < 1e-12);
        assert_eq!(v.iter().collect::<Vec<_>>(), vec![(0, 0.6), (2, 0.8)]);

        let mut empty: SparseVec<f64> = SparseVec::from_pairs(Vec::new());
        empty.l2_normalize();
        assert_eq!(empty.iter().count(), 0);
    }
}
