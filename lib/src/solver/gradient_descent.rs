//! Mini-batch gradient descent.
//!
//! Every step moves the parameters against the gradient of the squared error
//! of the head's activation:
//!
//! ```text
//! z      = X_b · W + b
//! error  = activate(z) - y_b
//! W     -= (η / m) · X_bᵀ · error
//! b     -= (η / m) · Σ error
//! ```
//!
//! `m` is the size of the whole dataset, not of the batch, so one epoch of
//! mini-batches moves the parameters as far as one full-batch step would.

use crate::callback::EpochContext;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::loss::Loss;
use crate::model::ModelState;
use crate::trainer::FitConfig;
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Turns the linear score `z` into model output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutputHead {
    /// Regression: output `z` itself.
    Identity,
    /// Logistic classification: trains on `σ(z)`, outputs `round(σ(z))`.
    Logistic,
    /// Perceptron: `1` if `z > threshold`, else `0`, both in training and output.
    Step { threshold: f64 },
}

fn sigmoid(v: f64) -> f64 {
    if v >= 0.0 {
        1.0 / (1.0 + (-v).exp())
    } else {
        let e = v.exp();
        e / (1.0 + e)
    }
}

impl OutputHead {
    /// Value compared against the targets when computing the gradient.
    pub fn activate(&self, z: &Array2<f64>) -> Array2<f64> {
        match *self {
            OutputHead::Identity => z.clone(),
            OutputHead::Logistic => z.mapv(sigmoid),
            OutputHead::Step { threshold } => z.mapv(|v| if v > threshold { 1.0 } else { 0.0 }),
        }
    }

    /// Final prediction. Classifier heads produce exactly `0.0` or `1.0`.
    pub fn output(&self, z: Array2<f64>) -> Array2<f64> {
        match *self {
            OutputHead::Identity => z,
            OutputHead::Logistic => z.mapv_into(|v| sigmoid(v).round()),
            OutputHead::Step { threshold } => {
                z.mapv_into(|v| if v > threshold { 1.0 } else { 0.0 })
            }
        }
    }

    pub fn threshold(&self) -> Option<f64> {
        match *self {
            OutputHead::Step { threshold } => Some(threshold),
            _ => None,
        }
    }
}

/// Mini-batch gradient descent solver. Holds only its output head.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientDescent {
    head: OutputHead,
}

impl GradientDescent {
    pub fn new(head: OutputHead) -> Self {
        Self { head }
    }

    pub fn head(&self) -> OutputHead {
        self.head
    }

    pub(crate) fn set_head(&mut self, head: OutputHead) {
        self.head = head;
    }

    /// Trains `state` from zero-initialized parameters for up to `config.epochs` epochs.
    ///
    /// `state.cost_history` receives the mean batch loss of every completed
    /// epoch. Training ends early when a callback asks to stop.
    pub fn fit<D: Dataset>(
        &self,
        state: &mut ModelState,
        dataset: &D,
        loss: &dyn Loss,
        learning_rate: f64,
        config: &mut FitConfig,
    ) -> Result<()> {
        let m = dataset.len();
        if m == 0 {
            return Err(Error::EmptyDataset);
        }
        let n_targets = dataset.target_column_count();
        if n_targets == 0 {
            return Err(Error::MissingTarget);
        }
        state.reset(dataset.feature_column_count(), n_targets);

        let epochs = config.epochs;
        let steps = dataset.steps_per_epoch();
        config.callbacks.train_begin();

        for epoch in 0..epochs {
            config.progress.epoch_begin(epoch + 1, epochs);

            let mut epoch_losses = Vec::with_capacity(steps);
            for (step, batch) in dataset.batches(epoch).enumerate() {
                let (x, y) = batch?;
                let y_pred = self.gradient_step(state, x.view(), y.view(), learning_rate, m)?;
                let batch_loss = loss.score(y.view(), y_pred.view());
                config.progress.step(step + 1, steps, batch_loss);
                epoch_losses.push(batch_loss);
            }

            let epoch_loss = epoch_losses.iter().sum::<f64>() / epoch_losses.len() as f64;
            state.cost_history.push(epoch_loss);
            config.progress.epoch_end(epoch + 1, epochs, epoch_loss);

            let ctx = EpochContext {
                epoch: epoch + 1,
                epochs,
                epoch_losses: &epoch_losses,
                cost_history: &state.cost_history,
                state: &*state,
                learning_rate,
                higher_is_better: loss.higher_is_better(),
            };
            if !config.callbacks.evaluate(&ctx) {
                break;
            }
        }
        Ok(())
    }

    /// One update on a batch. Returns the head output computed before the update.
    fn gradient_step(
        &self,
        state: &mut ModelState,
        x: ArrayView2<'_, f64>,
        y: ArrayView2<'_, f64>,
        learning_rate: f64,
        m: usize,
    ) -> Result<Array2<f64>> {
        let z = state.linear_output(x)?;
        if y.dim() != z.dim() {
            return Err(Error::dimension(
                format!("targets of shape {:?}", z.dim()),
                format!("{:?}", y.dim()),
            ));
        }
        // logistic error is taken on σ(z), not on the raw score
        let error = self.head.activate(&z) - &y;
        let step = learning_rate / m as f64;

        let (Some(coefficients), Some(bias)) = (state.coefficients.as_mut(), state.bias.as_mut())
        else {
            return Err(Error::NotFitted);
        };
        coefficients.scaled_add(-step, &x.t().dot(&error));
        bias.scaled_add(-step, &error.sum_axis(Axis(0)));

        Ok(self.head.output(z))
    }

    pub fn predict(&self, state: &ModelState, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        Ok(self.head.output(state.linear_output(x)?))
    }
}
