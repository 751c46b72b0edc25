//! Loss and metric functions.
//!
//! A [`Loss`] scores a prediction matrix against a target matrix of the same
//! shape and carries a display name, used as the key of evaluation reports and
//! for resolving losses of persisted models through [`by_name`].

use ndarray::{ArrayView2, Zip};
use std::fmt;
use std::sync::Arc;

/// A scalar scoring function `(y_true, y_pred) -> f64`.
///
/// Both matrices have shape `(n_samples, n_targets)`; callers guarantee equal
/// shapes.
pub trait Loss: Send + Sync {
    /// Display name used in reports.
    fn name(&self) -> &'static str;

    fn score(&self, y_true: ArrayView2<'_, f64>, y_pred: ArrayView2<'_, f64>) -> f64;

    /// Whether larger scores are better (accuracy) rather than smaller (errors).
    fn higher_is_better(&self) -> bool {
        false
    }
}

impl fmt::Debug for dyn Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn mean_of<F>(y_true: ArrayView2<'_, f64>, y_pred: ArrayView2<'_, f64>, f: F) -> f64
where
    F: Fn(f64, f64) -> f64,
{
    let n = y_true.len();
    if n == 0 {
        return f64::NAN;
    }
    let total = Zip::from(&y_true)
        .and(&y_pred)
        .fold(0.0, |acc, &t, &p| acc + f(t, p));
    total / n as f64
}

/// Mean Squared Error: `(1/n) * Σ(y_i - ŷ_i)²`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanSquaredError;

impl Loss for MeanSquaredError {
    fn name(&self) -> &'static str {
        "mean_squared_error"
    }

    fn score(&self, y_true: ArrayView2<'_, f64>, y_pred: ArrayView2<'_, f64>) -> f64 {
        mean_of(y_true, y_pred, |t, p| (t - p) * (t - p))
    }
}

/// Mean Absolute Error: `(1/n) * Σ|y_i - ŷ_i|`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAbsoluteError;

impl Loss for MeanAbsoluteError {
    fn name(&self) -> &'static str {
        "mean_absolute_error"
    }

    fn score(&self, y_true: ArrayView2<'_, f64>, y_pred: ArrayView2<'_, f64>) -> f64 {
        mean_of(y_true, y_pred, |t, p| (t - p).abs())
    }
}

/// Fraction of predicted labels equal to the true labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accuracy;

impl Loss for Accuracy {
    fn name(&self) -> &'static str {
        "accuracy"
    }

    fn score(&self, y_true: ArrayView2<'_, f64>, y_pred: ArrayView2<'_, f64>) -> f64 {
        mean_of(y_true, y_pred, |t, p| if t == p { 1.0 } else { 0.0 })
    }

    fn higher_is_better(&self) -> bool {
        true
    }
}

/// Resolves a built-in loss by its display name.
pub fn by_name(name: &str) -> Option<Arc<dyn Loss>> {
    match name {
        "mean_squared_error" => Some(Arc::new(MeanSquaredError)),
        "mean_absolute_error" => Some(Arc::new(MeanAbsoluteError)),
        "accuracy" => Some(Arc::new(Accuracy)),
        _ => None,
    }
}
