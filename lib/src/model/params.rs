//! Parameter get/set records.
//!
//! [`Model::get_params`](super::Model::get_params) returns a [`Params`] that
//! [`Model::set_params`](super::Model::set_params) accepts back unchanged.

use super::{ModelKind, ModelState};
use crate::loss::Loss;
use crate::solver::{OutputHead, SolverKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything the model itself owns.
#[derive(Debug, Clone)]
pub struct ModelParams {
    pub kind: ModelKind,
    pub loss: Arc<dyn Loss>,
    pub learning_rate: f64,
    pub state: ModelState,
    pub fitted: bool,
}

impl PartialEq for ModelParams {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.loss.name() == other.loss.name()
            && self.learning_rate == other.learning_rate
            && self.state == other.state
            && self.fitted == other.fitted
    }
}

/// Hyperparameters of the solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SolverParams {
    GradientDescent { head: OutputHead },
    NormalEquation,
}

impl SolverParams {
    pub fn kind(&self) -> SolverKind {
        match self {
            SolverParams::GradientDescent { .. } => SolverKind::GradientDescent,
            SolverParams::NormalEquation => SolverKind::NormalEquation,
        }
    }

    /// Perceptron threshold, if the solver has one.
    pub fn threshold(&self) -> Option<f64> {
        match self {
            SolverParams::GradientDescent { head } => head.threshold(),
            SolverParams::NormalEquation => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    pub model: ModelParams,
    pub solver: SolverParams,
}
