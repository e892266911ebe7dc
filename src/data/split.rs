//! Random train/test partitioning

use super::TensorDataset;
use crate::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;

/// Randomly partition a dataset into train and test subsets.
///
/// `train_size` is the fraction of samples that lands in the train half,
/// rounded to the nearest whole sample; values outside `[0.1, 0.99]` are
/// rejected. The two halves are independent copies whose index sets
/// partition the input exactly. Shuffling uses the caller's `rng`, so a
/// seeded generator makes the split reproducible.
pub fn train_test<R: Rng + ?Sized>(
    dataset: &TensorDataset,
    train_size: f64,
    rng: &mut R,
) -> Result<(TensorDataset, TensorDataset)> {
    if train_size < 0.1 || train_size > 0.99 {
        return Err(Error::InvalidParameter(format!(
            "train_size must be a value between 0.1 and 0.99, got {train_size}"
        )));
    }

    let n = dataset.len();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    let train_len = (n as f64 * train_size).round() as usize;
    let (train_indices, test_indices) = indices.split_at(train_len.min(n));
    Ok((dataset.select(train_indices), dataset.select(test_indices)))
}
