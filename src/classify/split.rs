use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};

/// Row indices of a train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with `seed` and cut off `ceil(test_size * n)` test rows.
/// No stratification. The same `(n, test_size, seed)` always gives the same split.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(Error::EmptySplit { documents: n });
    }
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    order.shuffle(&mut rng);
    let train = order.split_off(n_test);
    Ok(TrainTestSplit { train, test: order })
}

/// Gather `values` at `indices`
pub fn take<T: Clone>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| values[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_and_disjoint_cover() {
        let split = train_test_split(11, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 3);
        assert_eq!(split.train.len(), 8);
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..11).collect::<Vec<_>>());
    }

    #[test]
    fn deterministic_for_seed() {
        assert_eq!(train_test_split(50, 0.2, 7).unwrap(), train_test_split(50, 0.2, 7).unwrap());
        assert_ne!(train_test_split(50, 0.2, 7).unwrap(), train_test_split(50, 0.2, 8).unwrap());
    }

    #[test]
    fn too_few_documents() {
        assert!(matches!(train_test_split(1, 0.2, 0), Err(Error::EmptySplit { documents: 1 })));
        assert!(matches!(train_test_split(0, 0.2, 0), Err(Error::EmptySplit { documents: 0 })));
        assert!(train_test_split(2, 0.2, 0).is_ok());
    }
}
