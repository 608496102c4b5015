use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of a shuffled train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffles `0..n` with a seeded RNG and takes the first `ceil(n * test_size)`
/// indices as the test set.
///
/// At least one row is kept for training whenever `n > 0`.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> SplitIndices {
    let mut n_test = (n as f64 * test_size).ceil() as usize;
    if n_test >= n {
        n_test = n.saturating_sub(1);
    }

    let mut permutation: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let train = permutation.split_off(n_test);
    tracing::debug!(n, train = train.len(), test = permutation.len(), seed, "split dataset");

    SplitIndices {
        train,
        test: permutation,
    }
}
