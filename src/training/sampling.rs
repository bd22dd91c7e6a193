//! Row sampling: per-round batches, bootstrap resamples and hold-out splits.
//!
//! All randomness comes from [`Xoshiro256PlusPlus`]. A fixed seed makes every
//! draw reproducible; without one the generator is seeded from `rand::random`.

use rand::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Create the crate's RNG from an optional seed.
pub fn seeded_rng(seed: Option<u64>) -> Xoshiro256PlusPlus {
    Xoshiro256PlusPlus::seed_from_u64(seed.unwrap_or_else(rand::random))
}

// ============================================================================
// BatchSampler
// ============================================================================

/// Draws the rows used by each training round.
///
/// Rows are drawn without replacement. With `batch_size: None` (the default)
/// every round sees the whole training set in a fresh order, which is
/// full-batch gradient descent. A smaller batch size gives minibatches.
#[derive(Debug, Clone)]
pub struct BatchSampler {
    batch_size: Option<usize>,
    rng: Xoshiro256PlusPlus,
}

impl BatchSampler {
    pub fn new(batch_size: Option<usize>, seed: Option<u64>) -> Self {
        Self {
            batch_size,
            rng: seeded_rng(seed),
        }
    }

    /// Rows drawn per round out of `n_rows`.
    #[inline]
    pub fn batch_len(&self, n_rows: usize) -> usize {
        self.batch_size.map_or(n_rows, |b| b.min(n_rows))
    }

    /// Draw the next batch of row indices.
    pub fn sample(&mut self, n_rows: usize) -> Vec<usize> {
        let size = self.batch_len(n_rows);

        // Partial Fisher-Yates: the first `size` slots are a uniform sample.
        let mut indices: Vec<usize> = (0..n_rows).collect();
        for i in 0..size.min(n_rows.saturating_sub(1)) {
            let j = self.rng.gen_range(i..n_rows);
            indices.swap(i, j);
        }
        indices.truncate(size);
        indices
    }
}

// ============================================================================
// Resampling helpers
// ============================================================================

/// Draw `n_rows` indices uniformly with replacement.
pub fn bootstrap_indices<R: Rng + ?Sized>(n_rows: usize, rng: &mut R) -> Vec<usize> {
    if n_rows == 0 {
        return Vec::new();
    }
    (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
}

/// Shuffle `0..n_rows` and split off `test_fraction` of it as a hold-out set.
///
/// Returns `(train, test)` index lists, each sorted ascending. The fraction is
/// clamped to `[0, 1]` and the test size is rounded to the nearest row.
pub fn train_test_split(n_rows: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let fraction = test_fraction.clamp(0.0, 1.0);
    let n_test = ((n_rows as f64) * fraction).round() as usize;

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n_rows).collect();
    indices.shuffle(&mut rng);

    let mut train = indices.split_off(n_test);
    let mut test = indices;
    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_batch_is_permutation() {
        let mut sampler = BatchSampler::new(None, Some(7));
        let mut rows = sampler.sample(10);
        assert_eq!(rows.len(), 10);
        rows.sort_unstable();
        assert_eq!(rows, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn minibatch_has_distinct_rows() {
        let mut sampler = BatchSampler::new(Some(4), Some(7));
        let mut rows = sampler.sample(10);
        assert_eq!(rows.len(), 4);
        rows.sort_unstable();
        rows.dedup();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|&r| r < 10));
    }

    #[test]
    fn batch_size_larger_than_rows_is_clamped() {
        let mut sampler = BatchSampler::new(Some(100), Some(1));
        assert_eq!(sampler.sample(5).len(), 5);
        assert_eq!(sampler.batch_len(5), 5);
    }

    #[test]
    fn same_seed_same_batches() {
        let mut a = BatchSampler::new(Some(3), Some(42));
        let mut b = BatchSampler::new(Some(3), Some(42));
        for _ in 0..5 {
            assert_eq!(a.sample(20), b.sample(20));
        }
    }

    #[test]
    fn bootstrap_stays_in_range() {
        let mut rng = seeded_rng(Some(3));
        let rows = bootstrap_indices(50, &mut rng);
        assert_eq!(rows.len(), 50);
        assert!(rows.iter().all(|&r| r < 50));
        assert!(bootstrap_indices(0, &mut rng).is_empty());
    }

    #[test]
    fn split_partitions_rows() {
        let (train, test) = train_test_split(10, 0.3, 9);
        assert_eq!(train.len(), 7);
        assert_eq!(test.len(), 3);
        let mut all: Vec<_> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }
}
