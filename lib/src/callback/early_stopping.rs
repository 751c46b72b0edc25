//! Early stopping on a loss plateau or a loss target.

use super::{Callback, CallbackAction, EpochContext};
use serde::{Deserialize, Serialize};

/// Direction in which the monitored loss improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Monitor {
    /// Follow the model's loss function (`higher_is_better`).
    #[default]
    Auto,
    Min,
    Max,
}

/// Stops training when the epoch loss has not improved by more than
/// `min_delta` for `patience` consecutive epochs, or once it reaches `target`.
///
/// Deserializes from partial JSON, missing keys take their defaults:
///
/// ```rust
/// use smarty::callback::EarlyStopping;
///
/// let es: EarlyStopping = serde_json::from_str(r#"{"patience": 3}"#).unwrap();
/// assert_eq!(es.patience(), 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EarlyStopping {
    patience: usize,
    min_delta: f64,
    monitor: Monitor,
    target: Option<f64>,
    #[serde(skip)]
    best: Option<f64>,
    #[serde(skip)]
    epochs_without_improvement: usize,
}

impl Default for EarlyStopping {
    fn default() -> Self {
        Self::new(5, 0.0)
    }
}

impl EarlyStopping {
    pub fn new(patience: usize, min_delta: f64) -> Self {
        Self {
            patience,
            min_delta,
            monitor: Monitor::Auto,
            target: None,
            best: None,
            epochs_without_improvement: 0,
        }
    }

    pub fn with_monitor(mut self, monitor: Monitor) -> Self {
        self.monitor = monitor;
        self
    }

    /// Also stop as soon as the epoch loss reaches `target`.
    pub fn with_target(mut self, target: f64) -> Self {
        self.target = Some(target);
        self
    }

    pub fn patience(&self) -> usize {
        self.patience
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }

    pub fn reset(&mut self) {
        self.best = None;
        self.epochs_without_improvement = 0;
    }

    fn maximize(&self, ctx: &EpochContext<'_>) -> bool {
        match self.monitor {
            Monitor::Auto => ctx.higher_is_better,
            Monitor::Min => false,
            Monitor::Max => true,
        }
    }

    fn check_improvement(&mut self, loss: f64, maximize: bool) {
        let improved = match self.best {
            None => !loss.is_nan(),
            Some(best) if maximize => loss > best + self.min_delta,
            Some(best) => loss < best - self.min_delta,
        };
        if improved {
            self.best = Some(loss);
            self.epochs_without_improvement = 0;
        } else {
            self.epochs_without_improvement += 1;
        }
    }
}

impl Callback for EarlyStopping {
    fn on_train_begin(&mut self) {
        self.reset();
    }

    fn on_epoch_end(&mut self, ctx: &EpochContext<'_>) -> CallbackAction {
        let Some(loss) = ctx.loss() else {
            return CallbackAction::Continue;
        };
        let maximize = self.maximize(ctx);

        if let Some(target) = self.target {
            let reached = if maximize { loss >= target } else { loss <= target };
            if reached {
                tracing::info!(loss, target, "early stopping: target loss reached");
                return CallbackAction::Stop;
            }
        }

        self.check_improvement(loss, maximize);
        if self.epochs_without_improvement >= self.patience {
            tracing::info!(
                "early stopping: no improvement for {} epochs (best loss: {:?})",
                self.patience,
                self.best
            );
            CallbackAction::Stop
        } else {
            CallbackAction::Continue
        }
    }

    fn name(&self) -> &'static str {
        "EarlyStopping"
    }
}
