//! Dataset abstractions consumed by the solvers.
//!
//! This module provides the [`Dataset`] trait for uniform access to training data
//! and two iterators over it:
//!
//! - [`BatchIter`]: training mode, yields `(X, y)` pairs.
//! - [`FeatureBatchIter`]: prediction mode, yields `X` only (target columns stripped).
//!
//! # Core Concepts
//!
//! - **Dataset**: A table of samples split into feature columns `X` of shape
//!   `(n_samples, n_features)` and optional target columns `y` of shape `(n_samples, n_targets)`.
//! - **Pass**: One sweep over the whole dataset. Each call to [`Dataset::batches`]
//!   starts a new pass; the pass index lets a dataset reshuffle between epochs.
//! - **Batch**: A subset of at most `batch_size` samples.
//!
//! # Example
//!
//! ```rust
//! use smarty::dataset::{Dataset, InMemoryDataset};
//!
//! let ds = InMemoryDataset::from_rows(vec![vec![1.0, 2.0], vec![2.0, 4.0], vec![3.0, 6.0]])
//!     .unwrap()
//!     .with_target_indices(&[1])
//!     .unwrap()
//!     .with_batch_size(2);
//!
//! assert_eq!(ds.steps_per_epoch(), 2);
//! for batch in ds.batches(0) {
//!     let (x, y) = batch.unwrap();
//!     assert_eq!(x.ncols(), 1);
//!     assert_eq!(y.ncols(), 1);
//! }
//! ```

use crate::error::{Error, Result};
use ndarray::Array2;

pub mod loader;
pub mod memory;
pub mod split;

pub use self::loader::{load_csv, read_csv, CsvOptions};
pub use self::memory::InMemoryDataset;
pub use self::split::{cross_val_indices, cross_val_split, train_test_split};

/// A batch of samples as returned by [`Dataset::get_batch`].
#[derive(Debug, Clone)]
pub struct Batch {
    /// Feature matrix, `(batch_len, n_features)`.
    pub x: Array2<f64>,
    /// Target matrix, `(batch_len, n_targets)`, or `None` if the dataset has no targets.
    pub y: Option<Array2<f64>>,
}

/// Abstract interface for a tabular dataset.
///
/// Implementors only need to describe their shape and load a batch for a list
/// of sample indices; batching and pass semantics are provided.
pub trait Dataset {
    /// Total number of samples.
    fn len(&self) -> usize;

    /// Checks whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of samples per batch. The last batch of a pass may be smaller.
    fn batch_size(&self) -> usize;

    /// Number of batches one pass yields.
    fn steps_per_epoch(&self) -> usize {
        self.len().div_ceil(self.batch_size().max(1))
    }

    fn feature_column_count(&self) -> usize;

    /// Number of target columns, `0` if none are configured.
    fn target_column_count(&self) -> usize;

    /// The full feature matrix.
    fn feature_columns(&self) -> Array2<f64>;

    /// The full target matrix, `None` when no target columns are configured.
    fn target_columns(&self) -> Option<Array2<f64>>;

    /// Sample order used by training pass `pass`.
    ///
    /// Defaults to the natural order; shuffling datasets override this.
    /// Must be a permutation of `0..len()`.
    fn sample_order(&self, _pass: usize) -> Vec<usize> {
        (0..self.len()).collect()
    }

    /// Loads the samples at `indices` (in that order).
    fn get_batch(&self, indices: &[usize]) -> Result<Batch>;

    /// Starts training pass `pass`, yielding exactly [`steps_per_epoch`](Self::steps_per_epoch)
    /// `(X, y)` batches that together cover every sample once.
    fn batches(&self, pass: usize) -> BatchIter<'_, Self>
    where
        Self: Sized,
    {
        BatchIter {
            dataset: self,
            order: self.sample_order(pass),
            batch_size: self.batch_size().max(1),
            current: 0,
        }
    }

    /// Starts a prediction pass: natural sample order, target columns stripped.
    fn feature_batches(&self) -> FeatureBatchIter<'_, Self>
    where
        Self: Sized,
    {
        FeatureBatchIter {
            dataset: self,
            batch_size: self.batch_size().max(1),
            current: 0,
        }
    }
}

/// Training-mode iterator created by [`Dataset::batches`].
///
/// Yields an error (and keeps going) for batches the dataset fails to load,
/// and [`Error::MissingTarget`] when the dataset has no targets.
pub struct BatchIter<'a, D: ?Sized> {
    dataset: &'a D,
    order: Vec<usize>,
    batch_size: usize,
    current: usize,
}

impl<'a, D: Dataset + ?Sized> Iterator for BatchIter<'a, D> {
    type Item = Result<(Array2<f64>, Array2<f64>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.order.len() {
            return None;
        }
        let end = (self.current + self.batch_size).min(self.order.len());
        let indices = &self.order[self.current..end];
        self.current = end;

        let batch = match self.dataset.get_batch(indices) {
            Ok(batch) => batch,
            Err(e) => return Some(Err(e)),
        };
        Some(batch.y.map(|y| (batch.x, y)).ok_or(Error::MissingTarget))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.order.len() - self.current).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

/// Prediction-mode iterator created by [`Dataset::feature_batches`].
pub struct FeatureBatchIter<'a, D: ?Sized> {
    dataset: &'a D,
    batch_size: usize,
    current: usize,
}

impl<'a, D: Dataset + ?Sized> Iterator for FeatureBatchIter<'a, D> {
    type Item = Result<Array2<f64>>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.dataset.len();
        if self.current >= total {
            return None;
        }
        let end = (self.current + self.batch_size).min(total);
        let indices: Vec<usize> = (self.current..end).collect();
        self.current = end;

        Some(self.dataset.get_batch(&indices).map(|batch| batch.x))
    }
}
