//! Pluggable fitting strategies.
//!
//! A [`Solver`] holds only its own hyperparameters. The learned parameters live
//! in the model's [`ModelState`], which the model lends to the solver by
//! mutable borrow for the duration of a `fit`.

pub mod gradient_descent;
pub(crate) mod linalg;
pub mod normal_equation;

pub use gradient_descent::{GradientDescent, OutputHead};
pub use normal_equation::NormalEquation;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::loss::Loss;
use crate::model::{ModelState, SolverParams};
use crate::trainer::FitConfig;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Solver selector, parsed from the names `"mbgd"` and `"norm_eq"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverKind {
    #[serde(rename = "mbgd")]
    GradientDescent,
    #[serde(rename = "norm_eq")]
    NormalEquation,
}

impl SolverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverKind::GradientDescent => "mbgd",
            SolverKind::NormalEquation => "norm_eq",
        }
    }
}

impl FromStr for SolverKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mbgd" => Ok(SolverKind::GradientDescent),
            "norm_eq" => Ok(SolverKind::NormalEquation),
            other => Err(Error::UnknownSolver(other.to_string())),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Solver {
    GradientDescent(GradientDescent),
    NormalEquation(NormalEquation),
}

impl Solver {
    /// Builds the solver named by `kind`. `head` is only used by gradient descent;
    /// the normal equation always fits a plain linear output.
    pub fn new(kind: SolverKind, head: OutputHead) -> Self {
        match kind {
            SolverKind::GradientDescent => Solver::GradientDescent(GradientDescent::new(head)),
            SolverKind::NormalEquation => Solver::NormalEquation(NormalEquation::new()),
        }
    }

    pub fn kind(&self) -> SolverKind {
        match self {
            Solver::GradientDescent(_) => SolverKind::GradientDescent,
            Solver::NormalEquation(_) => SolverKind::NormalEquation,
        }
    }

    pub fn fit<D: Dataset>(
        &self,
        state: &mut ModelState,
        dataset: &D,
        loss: &dyn Loss,
        learning_rate: f64,
        config: &mut FitConfig,
    ) -> Result<()> {
        match self {
            Solver::GradientDescent(gd) => gd.fit(state, dataset, loss, learning_rate, config),
            Solver::NormalEquation(ne) => ne.fit(state, dataset, loss, config),
        }
    }

    pub fn predict(&self, state: &ModelState, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        match self {
            Solver::GradientDescent(gd) => gd.predict(state, x),
            Solver::NormalEquation(ne) => ne.predict(state, x),
        }
    }

    pub fn get_params(&self) -> SolverParams {
        match self {
            Solver::GradientDescent(gd) => SolverParams::GradientDescent { head: gd.head() },
            Solver::NormalEquation(_) => SolverParams::NormalEquation,
        }
    }

    /// Replaces the solver hyperparameters. The solver kind cannot change.
    pub fn set_params(&mut self, params: SolverParams) -> Result<()> {
        match (self, params) {
            (Solver::GradientDescent(gd), SolverParams::GradientDescent { head }) => {
                gd.set_head(head);
                Ok(())
            }
            (Solver::NormalEquation(_), SolverParams::NormalEquation) => Ok(()),
            (solver, params) => Err(Error::InvalidParameter(format!(
                "cannot apply {} parameters to a {} solver",
                params.kind(),
                solver.kind()
            ))),
        }
    }

    pub fn from_params(params: SolverParams) -> Self {
        match params {
            SolverParams::GradientDescent { head } => {
                Solver::GradientDescent(GradientDescent::new(head))
            }
            SolverParams::NormalEquation => Solver::NormalEquation(NormalEquation::new()),
        }
    }
}
