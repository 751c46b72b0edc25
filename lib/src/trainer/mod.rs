//! Per-call training configuration.
use crate::callback::{Callback, CallbackHandler, EarlyStopping};
use crate::error::Result;
use crate::progress::{ProgressReporter, SilentProgress, TracingProgress};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Options for a single `fit` call: epoch count, callbacks and progress reporting.
///
/// Built with [`FitConfig::builder`]. Callbacks keep their state between
/// epochs, so a config is consumed by one `fit` at a time (`&mut`).
pub struct FitConfig {
    pub(crate) epochs: usize,
    pub(crate) verbose: bool,
    pub(crate) callbacks: CallbackHandler,
    pub(crate) progress: Box<dyn ProgressReporter>,
}

impl FitConfig {
    pub fn builder() -> FitConfigBuilder {
        FitConfigBuilder::new()
    }

    /// Builds a config from JSON [`FitSettings`]. Missing keys take their defaults.
    ///
    /// ```rust
    /// use smarty::trainer::FitConfig;
    ///
    /// let config = FitConfig::from_json(r#"{"epochs": 3, "verbose": false}"#).unwrap();
    /// assert_eq!(config.epochs(), 3);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: FitSettings = serde_json::from_str(json)?;
        Ok(settings.into_config())
    }

    /// Reads [`FitSettings`] from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn callbacks(&self) -> &CallbackHandler {
        &self.callbacks
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfigBuilder::new().build()
    }
}

impl fmt::Debug for FitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FitConfig")
            .field("epochs", &self.epochs)
            .field("verbose", &self.verbose)
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for [`FitConfig`].
///
/// Defaults:
/// - `epochs`: 10
/// - `verbose`: true (epoch losses are logged through `tracing`)
/// - no callbacks
pub struct FitConfigBuilder {
    epochs: usize,
    verbose: bool,
    callbacks: CallbackHandler,
    progress: Option<Box<dyn ProgressReporter>>,
}

impl FitConfigBuilder {
    pub fn new() -> Self {
        Self {
            epochs: 10,
            verbose: true,
            callbacks: CallbackHandler::new(),
            progress: None,
        }
    }

    pub fn epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// When `false`, nothing is reported unless a custom reporter is set.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn callback<C: Callback + 'static>(mut self, callback: C) -> Self {
        self.callbacks.add(callback);
        self
    }

    pub fn early_stopping(self, early_stopping: EarlyStopping) -> Self {
        self.callback(early_stopping)
    }

    /// Overrides the reporter chosen by `verbose`.
    pub fn progress<P: ProgressReporter + 'static>(mut self, progress: P) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn build(self) -> FitConfig {
        let progress = self.progress.unwrap_or_else(|| -> Box<dyn ProgressReporter> {
            if self.verbose {
                Box::new(TracingProgress)
            } else {
                Box::new(SilentProgress)
            }
        });
        FitConfig {
            epochs: self.epochs,
            verbose: self.verbose,
            callbacks: self.callbacks,
            progress,
        }
    }
}

impl Default for FitConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable subset of [`FitConfig`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FitSettings {
    pub epochs: usize,
    pub verbose: bool,
    pub early_stopping: Option<EarlyStopping>,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            epochs: 10,
            verbose: true,
            early_stopping: None,
        }
    }
}

impl FitSettings {
    pub fn into_config(self) -> FitConfig {
        let mut builder = FitConfigBuilder::new()
            .epochs(self.epochs)
            .verbose(self.verbose);
        if let Some(es) = self.early_stopping {
            builder = builder.early_stopping(es);
        }
        builder.build()
    }
}
