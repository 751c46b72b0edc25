//! Linear models: regression, logistic classification and the perceptron.
//!
//! All three share one [`Model`] type. They differ only in their
//! [`ModelKind`], which fixes the default loss and the output head the
//! gradient-descent solver trains through.

pub mod linear;
pub mod params;

pub use linear::{Evaluation, LinearRegression, LogisticClassifier, Model, ModelBuilder, Perceptron};
pub use params::{ModelParams, Params, SolverParams};

use crate::error::{Error, Result};
use crate::loss::{Accuracy, Loss, MeanSquaredError};
use crate::solver::OutputHead;
use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Learned parameters of a linear model.
///
/// Owned by the [`Model`] and lent to the solver by `&mut` during `fit`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    /// `(n_features, n_targets)`, `None` until the first fit.
    pub coefficients: Option<Array2<f64>>,
    /// One intercept per target.
    pub bias: Option<Array1<f64>>,
    /// Mean training loss of each completed gradient-descent epoch.
    pub cost_history: Vec<f64>,
}

impl ModelState {
    /// Zero-initializes the parameters and clears the history.
    pub fn reset(&mut self, n_features: usize, n_targets: usize) {
        self.coefficients = Some(Array2::zeros((n_features, n_targets)));
        self.bias = Some(Array1::zeros(n_targets));
        self.cost_history.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.coefficients.is_some() && self.bias.is_some()
    }

    pub fn n_features(&self) -> Option<usize> {
        self.coefficients.as_ref().map(|w| w.nrows())
    }

    /// Coefficients and bias are set together and agree on the number of targets.
    pub fn check_shapes(&self) -> Result<()> {
        match (&self.coefficients, &self.bias) {
            (Some(w), Some(b)) if w.ncols() != b.len() => Err(Error::dimension(
                format!("{} bias terms", w.ncols()),
                b.len(),
            )),
            (Some(_), None) | (None, Some(_)) => Err(Error::InvalidParameter(
                "coefficients and bias must be set together".into(),
            )),
            _ => Ok(()),
        }
    }

    /// `X · W + b`
    pub(crate) fn linear_output(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let (Some(w), Some(b)) = (&self.coefficients, &self.bias) else {
            return Err(Error::NotFitted);
        };
        self.check_shapes()?;
        if x.ncols() != w.nrows() {
            return Err(Error::dimension(
                format!("{} features", w.nrows()),
                format!("{} features", x.ncols()),
            ));
        }
        Ok(x.dot(w) + b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LinearRegression,
    LogisticClassifier,
    Perceptron,
}

impl ModelKind {
    pub fn default_loss(&self) -> Arc<dyn Loss> {
        match self {
            ModelKind::LinearRegression => Arc::new(MeanSquaredError),
            ModelKind::LogisticClassifier | ModelKind::Perceptron => Arc::new(Accuracy),
        }
    }

    pub fn output_head(&self, threshold: f64) -> OutputHead {
        match self {
            ModelKind::LinearRegression => OutputHead::Identity,
            ModelKind::LogisticClassifier => OutputHead::Logistic,
            ModelKind::Perceptron => OutputHead::Step { threshold },
        }
    }

    /// Whether `solver` can train this kind of model.
    ///
    /// Classifiers need gradient descent through their own output head. Linear
    /// regression takes either solver, with the identity head under gradient descent.
    pub fn check_solver(&self, solver: &SolverParams) -> Result<()> {
        let head = match solver {
            SolverParams::NormalEquation if self.is_binary_classifier() => {
                return Err(Error::UnknownSolver(solver.kind().to_string()));
            }
            SolverParams::NormalEquation => return Ok(()),
            SolverParams::GradientDescent { head } => head,
        };
        match (self, head) {
            (ModelKind::LinearRegression, OutputHead::Identity)
            | (ModelKind::LogisticClassifier, OutputHead::Logistic)
            | (ModelKind::Perceptron, OutputHead::Step { .. }) => Ok(()),
            _ => Err(Error::InvalidParameter(format!(
                "{self} cannot train through a {head:?} output"
            ))),
        }
    }

    /// Classifiers train on a single column of 0/1 labels.
    pub fn is_binary_classifier(&self) -> bool {
        !matches!(self, ModelKind::LinearRegression)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::LinearRegression => "LinearRegression",
            ModelKind::LogisticClassifier => "LogisticClassifier",
            ModelKind::Perceptron => "Perceptron",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_reset_zero_initializes() {
        let mut state = ModelState {
            cost_history: vec![1.0, 0.5],
            ..Default::default()
        };
        assert!(!state.is_initialized());

        state.reset(3, 2);
        assert!(state.is_initialized());
        assert_eq!(state.coefficients, Some(Array2::zeros((3, 2))));
        assert_eq!(state.bias, Some(Array1::zeros(2)));
        assert!(state.cost_history.is_empty());
        assert_eq!(state.n_features(), Some(3));
    }

    #[test]
    fn test_linear_output() {
        let state = ModelState {
            coefficients: Some(array![[2.0], [-1.0]]),
            bias: Some(array![0.5]),
            cost_history: Vec::new(),
        };
        let z = state.linear_output(array![[1.0, 1.0], [3.0, 2.0]].view()).unwrap();
        assert_eq!(z, array![[1.5], [4.5]]);
    }

    #[test]
    fn test_linear_output_rejects_mismatched_bias() {
        let state = ModelState {
            coefficients: Some(array![[2.0], [-1.0]]),
            bias: Some(array![1.0, 2.0, 3.0]),
            cost_history: Vec::new(),
        };
        let err = state.linear_output(array![[1.0, 1.0]].view()).unwrap_err();
        assert!(matches!(err, Error::Dimension { .. }));

        let half = ModelState {
            bias: None,
            ..state
        };
        assert!(matches!(half.check_shapes(), Err(Error::InvalidParameter(_))));
        assert!(ModelState::default().check_shapes().is_ok());
    }

    #[test]
    fn test_check_solver() {
        let gd = |head| SolverParams::GradientDescent { head };

        assert!(ModelKind::LinearRegression.check_solver(&SolverParams::NormalEquation).is_ok());
        assert!(ModelKind::LinearRegression.check_solver(&gd(OutputHead::Identity)).is_ok());
        assert!(ModelKind::LogisticClassifier.check_solver(&gd(OutputHead::Logistic)).is_ok());
        assert!(ModelKind::Perceptron
            .check_solver(&gd(OutputHead::Step { threshold: 0.4 }))
            .is_ok());

        assert!(matches!(
            ModelKind::LogisticClassifier.check_solver(&SolverParams::NormalEquation),
            Err(Error::UnknownSolver(name)) if name == "norm_eq"
        ));
        assert!(matches!(
            ModelKind::Perceptron.check_solver(&gd(OutputHead::Identity)),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            ModelKind::LinearRegression.check_solver(&gd(OutputHead::Logistic)),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_kind_defaults() {
        assert_eq!(ModelKind::LinearRegression.default_loss().name(), "mean_squared_error");
        assert_eq!(ModelKind::Perceptron.default_loss().name(), "accuracy");
        assert_eq!(
            ModelKind::Perceptron.output_head(0.3),
            OutputHead::Step { threshold: 0.3 }
        );
        assert!(ModelKind::LogisticClassifier.is_binary_classifier());
        assert!(!ModelKind::LinearRegression.is_binary_classifier());
    }
}
