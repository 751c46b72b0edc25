//! Cross-validation.

use crate::dataset::InMemoryDataset;
use crate::error::{Error, Result};
use crate::model::{Evaluation, Model};
use crate::trainer::FitConfig;
use tracing::info;

/// K-fold cross-validation over prepared folds.
///
/// For every fold, a [`Model::clean_copy`] of `model` is fitted on all other
/// folds stacked together and evaluated on the held-out one with its training
/// loss. `make_config` supplies a fresh [`FitConfig`] per fold so callbacks
/// start from a clean state. `model` itself is left untouched.
///
/// ```rust
/// use smarty::dataset::{cross_val_split, InMemoryDataset};
/// use smarty::model::LinearRegression;
/// use smarty::model_selection::cross_validate;
/// use smarty::trainer::FitConfig;
///
/// let rows = (0..12).map(|i| vec![i as f64, 3.0 * i as f64]).collect();
/// let ds = InMemoryDataset::from_rows(rows).unwrap().with_target_indices(&[1]).unwrap();
/// let folds = cross_val_split(&ds, 3, true, 42, false).unwrap();
///
/// let model = LinearRegression::builder().solver("norm_eq").build().unwrap();
/// let scores = cross_validate(&model, &folds, || {
///     FitConfig::builder().verbose(false).build()
/// })
/// .unwrap();
/// assert_eq!(scores.len(), 3);
/// ```
pub fn cross_validate<F>(
    model: &Model,
    folds: &[InMemoryDataset],
    mut make_config: F,
) -> Result<Vec<Evaluation>>
where
    F: FnMut() -> FitConfig,
{
    if folds.len() < 2 {
        return Err(Error::InvalidParameter(format!(
            "cross-validation needs at least 2 folds, got {}",
            folds.len()
        )));
    }

    folds
        .iter()
        .enumerate()
        .map(|(held_out, test)| -> Result<Evaluation> {
            let train_parts: Vec<InMemoryDataset> = folds
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != held_out)
                .map(|(_, fold)| fold.clone())
                .collect();
            let train = InMemoryDataset::stack(&train_parts)?;

            let mut candidate = model.clean_copy();
            candidate.fit(&train, &mut make_config())?;
            let evaluation = candidate.evaluate(test, None)?;
            info!(fold = held_out + 1, folds = folds.len(), ?evaluation, "fold evaluated");
            Ok(evaluation)
        })
        .collect()
}
