//! Training progress reporting.
//!
//! Solvers call these hooks with epoch/step indices (1-based), totals and the
//! current loss. Reporting is best effort: nothing a reporter does can affect
//! training.

use tracing::{debug, info};

/// Receives progress events from a training run.
pub trait ProgressReporter: Send {
    fn epoch_begin(&mut self, _epoch: usize, _epochs: usize) {}

    fn step(&mut self, _step: usize, _steps: usize, _loss: f64) {}

    /// `loss` is the mean batch loss of the finished epoch.
    fn epoch_end(&mut self, _epoch: usize, _epochs: usize, _loss: f64) {}
}

/// Emits `tracing` events: `info` per epoch, `debug` per step.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn epoch_begin(&mut self, epoch: usize, epochs: usize) {
        debug!(epoch, epochs, "epoch started");
    }

    fn step(&mut self, step: usize, steps: usize, loss: f64) {
        debug!(step, steps, loss, "step");
    }

    fn epoch_end(&mut self, epoch: usize, epochs: usize, loss: f64) {
        info!("Epoch {}/{}: loss = {}", epoch, epochs, loss);
    }
}

/// Reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {}
