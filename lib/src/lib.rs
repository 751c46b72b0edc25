//! # smarty
//!
//! Linear models for regression and binary classification, trained by
//! pluggable solvers over batched datasets.
//!
//! ## Core Design Principles
//!
//! - **Model owns its state**: learned coefficients, bias and loss history live
//!   in a [`model::ModelState`] that the model lends to its solver by `&mut`
//!   during `fit`. The solver holds only its own hyperparameters.
//! - **Interchangeable solvers**: mini-batch gradient descent (`"mbgd"`) or the
//!   closed-form normal equation (`"norm_eq"`), chosen by name at construction.
//! - **One training loop, three heads**: linear regression, the logistic
//!   classifier and the perceptron share the same gradient step and differ
//!   only in how the linear score becomes an output.
//! - **Callbacks decide when to stop**: the loop consults a callback handler
//!   after every epoch; [`callback::EarlyStopping`] is built in.
//!
//! ## Quick Start
//!
//! ```rust
//! use smarty::dataset::InMemoryDataset;
//! use smarty::model::LinearRegression;
//! use smarty::trainer::FitConfig;
//!
//! // y = 2x + 1
//! let rows = (0..50).map(|i| {
//!     let x = i as f64 / 50.0;
//!     vec![x, 2.0 * x + 1.0]
//! }).collect();
//! let ds = InMemoryDataset::from_rows(rows)?
//!     .with_columns(["x", "y"])?
//!     .with_target(&["y"])?;
//!
//! let mut model = LinearRegression::builder().solver("norm_eq").build()?;
//! model.fit(&ds, &mut FitConfig::builder().verbose(false).build())?;
//!
//! let scores = model.evaluate(&ds, None)?;
//! assert!(scores["mean_squared_error"] < 1e-12);
//! # Ok::<(), smarty::Error>(())
//! ```
//!
//! ## Module Structure
//!
//! - `dataset`: The `Dataset` trait, in-memory tables, CSV loading and splits
//! - `model`: `Model`, its builder and the parameter get/set records
//! - `solver`: Gradient descent and normal-equation solvers
//! - `loss`: Losses and scores (MSE, MAE, accuracy)
//! - `callback`: Per-epoch callbacks, early stopping
//! - `trainer`: Per-call fit configuration
//! - `model_selection`: Cross-validation
//! - `serialization`: Model persistence

/// Per-epoch training callbacks.
pub mod callback;

/// Data loading utilities and dataset abstractions.
pub mod dataset;

/// Crate-wide error type.
pub mod error;

/// Losses used for training and evaluation.
pub mod loss;

/// Linear models and their parameters.
pub mod model;

/// Cross-validation helpers.
pub mod model_selection;

/// Training progress reporting.
pub mod progress;

/// Model persistence.
pub mod serialization;

/// Fitting strategies.
pub mod solver;

/// Per-call training configuration.
pub mod trainer;

pub use error::{Error, Result};
pub use model::{LinearRegression, LogisticClassifier, Model, Perceptron};
pub use trainer::FitConfig;
