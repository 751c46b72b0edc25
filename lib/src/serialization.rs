//! Persistence of trained models.
//!
//! A model is stored as a [`SavedModel`] record encoded with `bincode`. The
//! loss function is stored by name and resolved through [`loss::by_name`] on
//! load, so only the built-in losses survive a round trip.

use crate::error::{Error, Result};
use crate::loss;
use crate::model::{Model, ModelKind, ModelState, SolverParams};
use crate::solver::Solver;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Byte encoding for plain parameter records.
pub trait SerializableParams: Sized {
    fn to_bytes(&self) -> Result<Vec<u8>>;

    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

impl<T> SerializableParams for T
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Everything needed to rebuild a [`Model`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModel {
    pub kind: ModelKind,
    pub solver: SolverParams,
    pub learning_rate: f64,
    pub loss: String,
    pub state: ModelState,
    pub fitted: bool,
}

impl From<&Model> for SavedModel {
    fn from(model: &Model) -> Self {
        Self {
            kind: model.kind(),
            solver: model.solver().get_params(),
            learning_rate: model.learning_rate(),
            loss: model.loss().name().to_string(),
            state: model.state().clone(),
            fitted: model.is_fitted(),
        }
    }
}

impl TryFrom<SavedModel> for Model {
    type Error = Error;

    fn try_from(saved: SavedModel) -> Result<Self> {
        let loss = loss::by_name(&saved.loss)
            .ok_or_else(|| Error::InvalidParameter(format!("unknown loss `{}`", saved.loss)))?;
        if saved.fitted && !saved.state.is_initialized() {
            return Err(Error::InvalidParameter(
                "saved model is marked fitted but has no coefficients".into(),
            ));
        }
        saved.state.check_shapes()?;
        saved.kind.check_solver(&saved.solver)?;
        Ok(Model::from_parts(
            saved.kind,
            loss,
            Solver::from_params(saved.solver),
            saved.learning_rate,
            saved.state,
            saved.fitted,
        ))
    }
}

impl Model {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        SavedModel::from(self).to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        SavedModel::from_bytes(bytes)?.try_into()
    }

    /// Writes the model, fitted or not, to `path`.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}
