use crate::dataset::{Batch, Dataset};
use crate::error::{Error, Result};
use ndarray::{Array2, Axis};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Batch size used when none is configured.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// A dataset fully held in memory as a dense `f64` table with named columns.
///
/// Any subset of columns can be marked as targets; the remaining columns are
/// features, in their original order.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    columns: Vec<String>,
    data: Array2<f64>,
    target: Vec<usize>,
    batch_size: usize,
    shuffle_seed: Option<u64>,
}

impl InMemoryDataset {
    /// Wraps a `(n_samples, n_columns)` table. Columns are named `"0"`, `"1"`, ...
    pub fn new(data: Array2<f64>) -> Result<Self> {
        if data.nrows() == 0 {
            return Err(Error::EmptyDataset);
        }
        let columns = (0..data.ncols()).map(|i| i.to_string()).collect();
        Ok(Self {
            columns,
            data,
            target: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            shuffle_seed: None,
        })
    }

    /// Builds a dataset from row vectors, which must all have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(Vec::len).ok_or(Error::EmptyDataset)?;
        if let Some(bad) = rows.iter().find(|row| row.len() != n_cols) {
            return Err(Error::dimension(
                format!("{n_cols} values per row"),
                format!("a row with {} values", bad.len()),
            ));
        }
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let data = Array2::from_shape_vec((n_rows, n_cols), flat)
            .map_err(|e| Error::InvalidParameter(e.to_string()))?;
        Self::new(data)
    }

    /// Renames the columns.
    pub fn with_columns<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != self.data.ncols() {
            return Err(Error::dimension(
                format!("{} column names", self.data.ncols()),
                format!("{} column names", names.len()),
            ));
        }
        self.columns = names;
        Ok(self)
    }

    /// Marks the named columns as targets.
    pub fn with_target<S: AsRef<str>>(self, names: &[S]) -> Result<Self> {
        let indices = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.columns
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| Error::UnknownColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        self.with_target_indices(&indices)
    }

    /// Marks the columns at `indices` as targets.
    pub fn with_target_indices(mut self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.data.ncols()) {
            return Err(Error::UnknownColumn(bad.to_string()));
        }
        let mut target = indices.to_vec();
        target.sort_unstable();
        target.dedup();
        self.target = target;
        Ok(self)
    }

    /// Clears the target selection, turning every column into a feature.
    pub fn without_target(mut self) -> Self {
        self.target.clear();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Reshuffles the sample order on every training pass, deterministically from `seed`.
    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn target_names(&self) -> Vec<&str> {
        self.target.iter().map(|&i| self.columns[i].as_str()).collect()
    }

    pub fn feature_names(&self) -> Vec<&str> {
        self.feature_indices()
            .into_iter()
            .map(|i| self.columns[i].as_str())
            .collect()
    }

    /// The raw table, targets included.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Copies the given rows into a new dataset with the same columns, targets,
    /// batch size and shuffling.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            data: self.data.select(Axis(0), indices),
            target: self.target.clone(),
            batch_size: self.batch_size,
            shuffle_seed: self.shuffle_seed,
        }
    }

    /// Concatenates the rows of `parts`, which must share their columns and
    /// targets. Batch size and shuffling come from the first part.
    pub fn stack(parts: &[InMemoryDataset]) -> Result<Self> {
        let first = parts.first().ok_or(Error::EmptyDataset)?;
        if let Some(bad) = parts
            .iter()
            .find(|p| p.columns != first.columns || p.target != first.target)
        {
            return Err(Error::dimension(
                format!("columns {:?}", first.columns),
                format!("{:?}", bad.columns),
            ));
        }
        let views: Vec<_> = parts.iter().map(|p| p.data.view()).collect();
        let data = ndarray::concatenate(Axis(0), &views)
            .map_err(|e| Error::InvalidParameter(e.to_string()))?;
        Ok(Self {
            data,
            ..first.clone()
        })
    }

    fn feature_indices(&self) -> Vec<usize> {
        (0..self.data.ncols())
            .filter(|i| !self.target.contains(i))
            .collect()
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.data.nrows()
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn feature_column_count(&self) -> usize {
        self.data.ncols() - self.target.len()
    }

    fn target_column_count(&self) -> usize {
        self.target.len()
    }

    fn feature_columns(&self) -> Array2<f64> {
        self.data.select(Axis(1), &self.feature_indices())
    }

    fn target_columns(&self) -> Option<Array2<f64>> {
        if self.target.is_empty() {
            return None;
        }
        Some(self.data.select(Axis(1), &self.target))
    }

    fn sample_order(&self, pass: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        if let Some(seed) = self.shuffle_seed {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(pass as u64));
            order.shuffle(&mut rng);
        }
        order
    }

    fn get_batch(&self, indices: &[usize]) -> Result<Batch> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(Error::InvalidParameter(format!(
                "sample index {bad} out of bounds for {} samples",
                self.len()
            )));
        }
        let rows = self.data.select(Axis(0), indices);
        let x = rows.select(Axis(1), &self.feature_indices());
        let y = (!self.target.is_empty()).then(|| rows.select(Axis(1), &self.target));
        Ok(Batch { x, y })
    }
}
