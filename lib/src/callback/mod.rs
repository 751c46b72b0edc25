//! Per-epoch training callbacks.
//!
//! The gradient-descent solver consults a [`CallbackHandler`] once after every
//! completed epoch. Any callback returning [`CallbackAction::Stop`] ends
//! training immediately; the epoch that triggered the stop stays in the cost
//! history.
//!
//! # Example
//!
//! ```rust
//! use smarty::callback::{Callback, CallbackAction, EpochContext};
//!
//! struct StopAfter(usize);
//!
//! impl Callback for StopAfter {
//!     fn on_epoch_end(&mut self, ctx: &EpochContext<'_>) -> CallbackAction {
//!         if ctx.epoch >= self.0 {
//!             CallbackAction::Stop
//!         } else {
//!             CallbackAction::Continue
//!         }
//!     }
//! }
//! ```

mod early_stopping;

pub use early_stopping::{EarlyStopping, Monitor};

use crate::model::ModelState;

/// What a callback wants the training loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Continue,
    Stop,
}

/// Snapshot handed to callbacks after an epoch.
#[derive(Debug, Clone, Copy)]
pub struct EpochContext<'a> {
    /// 1-based index of the epoch that just finished.
    pub epoch: usize,
    /// Requested number of epochs.
    pub epochs: usize,
    /// Loss of every batch of the finished epoch, in iteration order.
    pub epoch_losses: &'a [f64],
    /// Mean loss per completed epoch, the finished one last.
    pub cost_history: &'a [f64],
    /// Learned parameters after the epoch.
    pub state: &'a ModelState,
    pub learning_rate: f64,
    /// Whether the training loss improves upwards (e.g. accuracy).
    pub higher_is_better: bool,
}

impl EpochContext<'_> {
    /// Mean loss of the finished epoch.
    pub fn loss(&self) -> Option<f64> {
        self.cost_history.last().copied()
    }
}

/// A hook consulted after every epoch.
pub trait Callback: Send {
    /// Called once before the first epoch of every `fit`.
    fn on_train_begin(&mut self) {}

    fn on_epoch_end(&mut self, ctx: &EpochContext<'_>) -> CallbackAction;

    fn name(&self) -> &'static str {
        "Callback"
    }
}

/// Dispatches epoch events to the registered callbacks.
///
/// With no callbacks registered training always continues.
#[derive(Default)]
pub struct CallbackHandler {
    callbacks: Vec<Box<dyn Callback>>,
}

impl CallbackHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<C: Callback + 'static>(&mut self, callback: C) {
        self.callbacks.push(Box::new(callback));
    }

    pub fn add_boxed(&mut self, callback: Box<dyn Callback>) {
        self.callbacks.push(callback);
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn train_begin(&mut self) {
        for cb in &mut self.callbacks {
            cb.on_train_begin();
        }
    }

    /// Returns `true` if training should continue.
    ///
    /// Every callback sees the epoch even if an earlier one already asked to stop.
    pub fn evaluate(&mut self, ctx: &EpochContext<'_>) -> bool {
        let mut keep_going = true;
        for cb in &mut self.callbacks {
            if cb.on_epoch_end(ctx) == CallbackAction::Stop {
                tracing::info!(callback = cb.name(), epoch = ctx.epoch, "training stopped");
                keep_going = false;
            }
        }
        keep_going
    }
}

impl std::fmt::Debug for CallbackHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.callbacks.iter().map(|cb| cb.name()))
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    pub(crate) fn context<'a>(
        epoch: usize,
        history: &'a [f64],
        state: &'a ModelState,
    ) -> EpochContext<'a> {
        EpochContext {
            epoch,
            epochs: 100,
            epoch_losses: &[],
            cost_history: history,
            state,
            learning_rate: 0.01,
            higher_is_better: false,
        }
    }

    struct StopAt(usize);

    impl Callback for StopAt {
        fn on_epoch_end(&mut self, ctx: &EpochContext<'_>) -> CallbackAction {
            if ctx.epoch >= self.0 {
                CallbackAction::Stop
            } else {
                CallbackAction::Continue
            }
        }
    }

    struct Counter(Arc<AtomicUsize>);

    impl Callback for Counter {
        fn on_epoch_end(&mut self, _ctx: &EpochContext<'_>) -> CallbackAction {
            self.0.fetch_add(1, Ordering::SeqCst);
            CallbackAction::Continue
        }
    }

    #[test]
    fn test_empty_handler_always_continues() {
        let mut handler = CallbackHandler::new();
        let state = ModelState::default();
        assert!(handler.is_empty());
        for epoch in 1..=5 {
            assert!(handler.evaluate(&context(epoch, &[1.0], &state)));
        }
    }

    #[test]
    fn test_any_stop_stops() {
        let mut handler = CallbackHandler::new();
        handler.add(StopAt(100));
        handler.add(StopAt(3));
        let state = ModelState::default();

        assert_eq!(handler.len(), 2);
        assert!(handler.evaluate(&context(2, &[1.0, 0.9], &state)));
        assert!(!handler.evaluate(&context(3, &[1.0, 0.9, 0.8], &state)));
    }

    #[test]
    fn test_all_callbacks_see_every_epoch() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut handler = CallbackHandler::new();
        handler.add(StopAt(1));
        handler.add(Counter(Arc::clone(&seen)));
        let state = ModelState::default();

        assert!(!handler.evaluate(&context(1, &[1.0], &state)));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_context_loss_is_last_history_entry() {
        let state = ModelState::default();
        assert_eq!(context(2, &[3.0, 2.0], &state).loss(), Some(2.0));
        assert_eq!(context(0, &[], &state).loss(), None);
    }
}
