//! Train/test and cross-validation partitioning.

use crate::dataset::{Dataset, InMemoryDataset};
use crate::error::{Error, Result};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

fn sample_indices(n: usize, shuffle: bool, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    if shuffle {
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
    }
    indices
}

/// Splits `dataset` into a training part holding `floor(ratio * n)` samples and
/// a test part holding the rest. Both parts keep the column and target setup.
///
/// Fails with [`Error::InvalidParameter`] if either part would be empty.
pub fn train_test_split(
    dataset: &InMemoryDataset,
    ratio: f64,
    shuffle: bool,
    seed: u64,
) -> Result<(InMemoryDataset, InMemoryDataset)> {
    let n = dataset.len();
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(Error::InvalidParameter(format!(
            "split ratio must be in (0, 1), got {ratio}"
        )));
    }
    let train_size = (ratio * n as f64).floor() as usize;
    if train_size == 0 || train_size == n {
        return Err(Error::InvalidParameter(format!(
            "split ratio {ratio} leaves an empty part for {n} samples"
        )));
    }

    let indices = sample_indices(n, shuffle, seed);
    let (train, test) = indices.split_at(train_size);
    Ok((dataset.select_rows(train), dataset.select_rows(test)))
}

/// Partitions `0..n` into `folds` disjoint folds of `n / folds` indices each.
///
/// When `n` is not a multiple of `folds` the leftover indices form one extra,
/// smaller fold at the end, unless `drop_remainder` is set. Requires
/// `folds >= 2` and `n > folds`.
pub fn cross_val_indices(
    n: usize,
    folds: usize,
    shuffle: bool,
    seed: u64,
    drop_remainder: bool,
) -> Result<Vec<Vec<usize>>> {
    if folds < 2 {
        return Err(Error::InvalidParameter(format!(
            "at least 2 folds are required, got {folds}"
        )));
    }
    if n <= folds {
        return Err(Error::InvalidParameter(format!(
            "{folds} folds need more than {folds} samples, got {n}"
        )));
    }

    let indices = sample_indices(n, shuffle, seed);
    let fold_size = n / folds;
    let (full, remainder) = indices.split_at(folds * fold_size);

    let mut splits: Vec<Vec<usize>> = full.chunks(fold_size).map(<[usize]>::to_vec).collect();
    if !drop_remainder && !remainder.is_empty() {
        splits.push(remainder.to_vec());
    }
    Ok(splits)
}

/// [`cross_val_indices`] materialised as datasets.
pub fn cross_val_split(
    dataset: &InMemoryDataset,
    folds: usize,
    shuffle: bool,
    seed: u64,
    drop_remainder: bool,
) -> Result<Vec<InMemoryDataset>> {
    let splits = cross_val_indices(dataset.len(), folds, shuffle, seed, drop_remainder)?;
    Ok(splits
        .iter()
        .map(|indices| dataset.select_rows(indices))
        .collect())
}
