use super::{ModelKind, ModelParams, ModelState, Params};
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::loss::Loss;
use crate::solver::{Solver, SolverKind};
use crate::trainer::FitConfig;
use ndarray::{concatenate, Array1, Array2, ArrayView2, Axis};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Scores keyed by loss name.
pub type Evaluation = BTreeMap<String, f64>;

/// A linear model bound to one solver and one training loss.
///
/// The model owns its [`ModelState`]; `fit` lends it to the solver.
#[derive(Debug, Clone)]
pub struct Model {
    kind: ModelKind,
    loss: Arc<dyn Loss>,
    solver: Solver,
    learning_rate: f64,
    state: ModelState,
    fitted: bool,
}

impl Model {
    /// Trains the model from scratch on every sample of `dataset`.
    ///
    /// # Errors
    /// - [`Error::MissingTarget`] if `dataset` has no target columns
    /// - [`Error::LabelDomain`] if a classifier gets anything but one column of 0/1 labels
    /// - anything the solver raises; the model is left unfitted
    pub fn fit<D: Dataset>(&mut self, dataset: &D, config: &mut FitConfig) -> Result<&mut Self> {
        if dataset.target_column_count() == 0 {
            return Err(Error::MissingTarget);
        }
        if self.kind.is_binary_classifier() {
            check_binary_labels(dataset)?;
        }

        self.fitted = false;
        self.solver.fit(
            &mut self.state,
            dataset,
            self.loss.as_ref(),
            self.learning_rate,
            config,
        )?;
        self.fitted = true;
        info!(
            model = %self.kind,
            solver = %self.solver.kind(),
            epochs = self.state.cost_history.len(),
            "fit finished"
        );
        Ok(self)
    }

    /// Predicts every sample of `dataset` in its natural order.
    ///
    /// Target columns, if any, are ignored. Classifiers return `0.0`/`1.0`.
    pub fn predict<D: Dataset>(&self, dataset: &D) -> Result<Array2<f64>> {
        if !self.fitted {
            return Err(Error::NotFitted);
        }
        let parts = dataset
            .feature_batches()
            .map(|x| x.and_then(|x| self.solver.predict(&self.state, x.view())))
            .collect::<Result<Vec<_>>>()?;
        if parts.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
        concatenate(Axis(0), &views).map_err(|e| Error::dimension("matching prediction widths", e))
    }

    /// Predicts a raw feature matrix.
    pub fn predict_features(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if !self.fitted {
            return Err(Error::NotFitted);
        }
        self.solver.predict(&self.state, x)
    }

    /// Class labels of a binary classifier.
    pub fn predict_classes<D: Dataset>(&self, dataset: &D) -> Result<Array2<u8>> {
        if !self.kind.is_binary_classifier() {
            return Err(Error::InvalidParameter(format!(
                "{} does not predict classes",
                self.kind
            )));
        }
        Ok(self.predict(dataset)?.mapv(|v| u8::from(v > 0.5)))
    }

    /// Scores the predictions for `dataset` against its targets.
    ///
    /// Uses the training loss unless `loss` is given.
    pub fn evaluate<D: Dataset>(&self, dataset: &D, loss: Option<&dyn Loss>) -> Result<Evaluation> {
        if !self.fitted {
            return Err(Error::NotFitted);
        }
        let y = dataset.target_columns().ok_or(Error::MissingTarget)?;
        let y_pred = self.predict(dataset)?;
        if y.dim() != y_pred.dim() {
            return Err(Error::dimension(
                format!("targets of shape {:?}", y_pred.dim()),
                format!("{:?}", y.dim()),
            ));
        }

        let loss = loss.unwrap_or(self.loss.as_ref());
        let score = loss.score(y.view(), y_pred.view());
        info!("Loss: {}", score);

        let mut evaluation = Evaluation::new();
        evaluation.insert(loss.name().to_string(), score);
        Ok(evaluation)
    }

    pub fn get_params(&self) -> Params {
        Params {
            model: ModelParams {
                kind: self.kind,
                loss: Arc::clone(&self.loss),
                learning_rate: self.learning_rate,
                state: self.state.clone(),
                fitted: self.fitted,
            },
            solver: self.solver.get_params(),
        }
    }

    /// Restores parameters taken from a model of the same kind and solver.
    ///
    /// On error nothing is changed.
    pub fn set_params(&mut self, params: Params) -> Result<()> {
        let Params { model, solver } = params;
        if model.kind != self.kind {
            return Err(Error::InvalidParameter(format!(
                "cannot apply {} parameters to a {}",
                model.kind, self.kind
            )));
        }
        if model.fitted && !model.state.is_initialized() {
            return Err(Error::InvalidParameter(
                "fitted parameters without coefficients".into(),
            ));
        }
        model.state.check_shapes()?;
        self.kind.check_solver(&solver)?;
        self.solver.set_params(solver)?;

        self.loss = model.loss;
        self.learning_rate = model.learning_rate;
        self.state = model.state;
        self.fitted = model.fitted;
        Ok(())
    }

    /// Same hyperparameters, no learned state.
    pub fn clean_copy(&self) -> Self {
        Self {
            kind: self.kind,
            loss: Arc::clone(&self.loss),
            solver: self.solver,
            learning_rate: self.learning_rate,
            state: ModelState::default(),
            fitted: false,
        }
    }

    pub(crate) fn from_parts(
        kind: ModelKind,
        loss: Arc<dyn Loss>,
        solver: Solver,
        learning_rate: f64,
        state: ModelState,
        fitted: bool,
    ) -> Self {
        Self {
            kind,
            loss,
            solver,
            learning_rate,
            state,
            fitted,
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn loss(&self) -> &dyn Loss {
        self.loss.as_ref()
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn threshold(&self) -> Option<f64> {
        self.solver.get_params().threshold()
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn coefficients(&self) -> Option<&Array2<f64>> {
        self.state.coefficients.as_ref()
    }

    pub fn bias(&self) -> Option<&Array1<f64>> {
        self.state.bias.as_ref()
    }

    pub fn cost_history(&self) -> &[f64] {
        &self.state.cost_history
    }
}

fn check_binary_labels<D: Dataset>(dataset: &D) -> Result<()> {
    let y = dataset.target_columns().ok_or(Error::MissingTarget)?;
    if y.ncols() != 1 {
        return Err(Error::LabelDomain(format!(
            "expected exactly one target column, got {}",
            y.ncols()
        )));
    }
    if let Some(bad) = y.iter().find(|&&v| v != 0.0 && v != 1.0) {
        return Err(Error::LabelDomain(format!(
            "labels must be 0 or 1, found {bad}"
        )));
    }
    Ok(())
}

/// Fluent builder for [`Model`].
///
/// Defaults:
/// - `solver`: `"mbgd"`
/// - `learning_rate`: 1e-4
/// - `threshold`: 0.0 (perceptron only)
/// - `loss`: mean squared error for regression, accuracy for classifiers
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    kind: ModelKind,
    loss: Option<Arc<dyn Loss>>,
    solver: String,
    learning_rate: f64,
    threshold: f64,
}

impl ModelBuilder {
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            loss: None,
            solver: SolverKind::GradientDescent.as_str().to_string(),
            learning_rate: 1e-4,
            threshold: 0.0,
        }
    }

    pub fn loss<L: Loss + 'static>(mut self, loss: L) -> Self {
        self.loss = Some(Arc::new(loss));
        self
    }

    pub fn shared_loss(mut self, loss: Arc<dyn Loss>) -> Self {
        self.loss = Some(loss);
        self
    }

    /// `"mbgd"` (mini-batch gradient descent) or `"norm_eq"` (normal equation,
    /// linear regression only).
    pub fn solver(mut self, name: impl Into<String>) -> Self {
        self.solver = name.into();
        self
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Perceptron decision threshold on the raw score.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn build(self) -> Result<Model> {
        let solver_kind: SolverKind = self.solver.parse()?;
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }

        let loss = self.loss.unwrap_or_else(|| self.kind.default_loss());
        let solver = Solver::new(solver_kind, self.kind.output_head(self.threshold));
        self.kind.check_solver(&solver.get_params())?;
        Ok(Model::from_parts(
            self.kind,
            loss,
            solver,
            self.learning_rate,
            ModelState::default(),
            false,
        ))
    }
}

/// Ordinary least squares regression, fitted by gradient descent or the normal equation.
pub struct LinearRegression;

impl LinearRegression {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::new(ModelKind::LinearRegression)
    }

    /// A model with every default.
    pub fn new() -> Result<Model> {
        Self::builder().build()
    }
}

/// Binary classifier on `round(σ(X · W + b))`.
pub struct LogisticClassifier;

impl LogisticClassifier {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::new(ModelKind::LogisticClassifier)
    }

    pub fn new() -> Result<Model> {
        Self::builder().build()
    }
}

/// Binary classifier outputting `1` when `X · W + b > threshold`.
pub struct Perceptron;

impl Perceptron {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::new(ModelKind::Perceptron)
    }

    pub fn new() -> Result<Model> {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryDataset;
    use crate::loss::{MeanAbsoluteError, MeanSquaredError};
    use crate::model::SolverParams;
    use crate::solver::OutputHead;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn quiet(epochs: usize) -> FitConfig {
        FitConfig::builder().epochs(epochs).verbose(false).build()
    }

    fn line(n: usize) -> InMemoryDataset {
        let rows = (0..n)
            .map(|i| {
                let x = i as f64 / n as f64;
                vec![x, 2.0 * x + 1.0]
            })
            .collect();
        InMemoryDataset::from_rows(rows)
            .unwrap()
            .with_columns(["x", "y"])
            .unwrap()
            .with_target(&["y"])
            .unwrap()
            .with_batch_size(16)
    }

    fn separable() -> InMemoryDataset {
        let rows = [-3.0, -2.0, -1.0, 1.0, 2.0, 3.0]
            .iter()
            .map(|&x| vec![x, if x > 0.0 { 1.0 } else { 0.0 }])
            .collect();
        InMemoryDataset::from_rows(rows)
            .unwrap()
            .with_target_indices(&[1])
            .unwrap()
            .with_batch_size(4)
    }

    #[test]
    fn test_builder_defaults() {
        let model = LinearRegression::new().unwrap();
        assert_eq!(model.kind(), ModelKind::LinearRegression);
        assert_eq!(model.learning_rate(), 1e-4);
        assert_eq!(model.loss().name(), "mean_squared_error");
        assert_eq!(model.solver().kind(), SolverKind::GradientDescent);
        assert!(!model.is_fitted());
        assert!(model.coefficients().is_none());

        let perceptron = Perceptron::new().unwrap();
        assert_eq!(perceptron.threshold(), Some(0.0));
        assert_eq!(perceptron.loss().name(), "accuracy");
    }

    #[test]
    fn test_builder_rejects_unknown_solver() {
        let err = LinearRegression::builder().solver("adam").build().unwrap_err();
        assert!(matches!(err, Error::UnknownSolver(name) if name == "adam"));
    }

    #[test]
    fn test_classifiers_only_accept_gradient_descent() {
        let err = LogisticClassifier::builder()
            .solver("norm_eq")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::UnknownSolver(_)));
        assert!(Perceptron::builder().solver("mbgd").build().is_ok());
    }

    #[test]
    fn test_builder_rejects_bad_learning_rate() {
        let err = LinearRegression::builder()
            .learning_rate(0.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_linear_regression_converges() {
        let mut model = LinearRegression::builder()
            .learning_rate(0.5)
            .build()
            .unwrap();
        model.fit(&line(100), &mut quiet(500)).unwrap();

        assert!(model.is_fitted());
        assert_abs_diff_eq!(model.coefficients().unwrap()[[0, 0]], 2.0, epsilon = 0.05);
        assert_abs_diff_eq!(model.bias().unwrap()[0], 1.0, epsilon = 0.05);
        assert_eq!(model.cost_history().len(), 500);
    }

    #[test]
    fn test_normal_equation_fits_in_one_call() {
        let mut model = LinearRegression::builder()
            .solver("norm_eq")
            .build()
            .unwrap();
        let ds = line(40);
        model.fit(&ds, &mut quiet(1)).unwrap();

        assert_abs_diff_eq!(model.coefficients().unwrap()[[0, 0]], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(model.bias().unwrap()[0], 1.0, epsilon = 1e-9);
        assert!(model.cost_history().is_empty());

        let scores = model.evaluate(&ds, None).unwrap();
        assert!(scores["mean_squared_error"] < 1e-12);
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LinearRegression::new().unwrap();
        assert!(matches!(model.predict(&line(4)), Err(Error::NotFitted)));
        assert!(matches!(model.evaluate(&line(4), None), Err(Error::NotFitted)));
        assert!(matches!(
            model.predict_features(array![[1.0]].view()),
            Err(Error::NotFitted)
        ));
    }

    #[test]
    fn test_predict_concatenates_batches_in_order() {
        let mut model = LinearRegression::builder()
            .solver("norm_eq")
            .build()
            .unwrap();
        let ds = line(50).with_shuffle(3);
        model.fit(&ds, &mut quiet(1)).unwrap();

        let pred = model.predict(&ds).unwrap();
        assert_eq!(pred.dim(), (50, 1));
        for (i, p) in pred.column(0).iter().enumerate() {
            let x = i as f64 / 50.0;
            assert_abs_diff_eq!(*p, 2.0 * x + 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_predict_rejects_wrong_feature_count() {
        let mut model = LinearRegression::builder()
            .solver("norm_eq")
            .build()
            .unwrap();
        model.fit(&line(10), &mut quiet(1)).unwrap();

        let err = model
            .predict_features(array![[1.0, 2.0]].view())
            .unwrap_err();
        assert!(matches!(err, Error::Dimension { .. }));
    }

    #[test]
    fn test_fit_requires_targets() {
        let mut model = LinearRegression::new().unwrap();
        let ds = line(10).without_target();
        assert!(matches!(
            model.fit(&ds, &mut quiet(1)),
            Err(Error::MissingTarget)
        ));
    }

    #[test]
    fn test_classifier_rejects_bad_labels() {
        let mut model = LogisticClassifier::new().unwrap();

        let not_binary = InMemoryDataset::from_rows(vec![vec![1.0, 0.0], vec![2.0, 2.0]])
            .unwrap()
            .with_target_indices(&[1])
            .unwrap();
        assert!(matches!(
            model.fit(&not_binary, &mut quiet(1)),
            Err(Error::LabelDomain(_))
        ));

        let two_columns =
            InMemoryDataset::from_rows(vec![vec![1.0, 0.0, 1.0], vec![2.0, 1.0, 0.0]])
                .unwrap()
                .with_target_indices(&[1, 2])
                .unwrap();
        assert!(matches!(
            model.fit(&two_columns, &mut quiet(1)),
            Err(Error::LabelDomain(_))
        ));
        assert!(!model.is_fitted());
    }

    #[test]
    fn test_logistic_classifier_separates() {
        let mut model = LogisticClassifier::builder()
            .learning_rate(1.0)
            .build()
            .unwrap();
        let ds = separable();
        model.fit(&ds, &mut quiet(100)).unwrap();

        let classes = model.predict_classes(&ds).unwrap();
        assert_eq!(classes.column(0).to_vec(), vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(model.evaluate(&ds, None).unwrap()["accuracy"], 1.0);
    }

    #[test]
    fn test_perceptron_threshold_shifts_decision() {
        let mut model = Perceptron::builder()
            .learning_rate(1.0)
            .threshold(0.5)
            .build()
            .unwrap();
        let ds = separable();
        model.fit(&ds, &mut quiet(100)).unwrap();

        let pred = model.predict(&ds).unwrap();
        assert_eq!(pred, ds.target_columns().unwrap());
        assert!(pred.iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn test_predict_classes_only_for_classifiers() {
        let mut model = LinearRegression::builder()
            .solver("norm_eq")
            .build()
            .unwrap();
        model.fit(&line(10), &mut quiet(1)).unwrap();
        assert!(matches!(
            model.predict_classes(&line(10)),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_evaluate_before_fit() {
        let model = LinearRegression::new().unwrap();
        let targetless = line(5).without_target();
        assert!(matches!(
            model.evaluate(&targetless, None),
            Err(Error::NotFitted)
        ));
    }

    #[test]
    fn test_evaluate_with_other_loss() {
        let mut model = LinearRegression::builder()
            .solver("norm_eq")
            .build()
            .unwrap();
        let ds = line(20);
        model.fit(&ds, &mut quiet(1)).unwrap();

        let scores = model.evaluate(&ds, Some(&MeanAbsoluteError)).unwrap();
        assert_eq!(scores.len(), 1);
        assert!(scores["mean_absolute_error"] < 1e-9);
    }

    #[test]
    fn test_params_round_trip() {
        let mut model = Perceptron::builder()
            .learning_rate(1.0)
            .threshold(0.25)
            .build()
            .unwrap();
        model.fit(&separable(), &mut quiet(10)).unwrap();
        let params = model.get_params();

        let mut other = Perceptron::new().unwrap();
        other.set_params(params.clone()).unwrap();

        assert_eq!(other.get_params(), params);
        assert_eq!(other.threshold(), Some(0.25));
        assert!(other.is_fitted());
        assert_eq!(
            other.predict(&separable()).unwrap(),
            model.predict(&separable()).unwrap()
        );
    }

    #[test]
    fn test_set_params_rejects_other_kind() {
        let params = LinearRegression::new().unwrap().get_params();
        let mut model = LogisticClassifier::new().unwrap();
        assert!(matches!(
            model.set_params(params),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_set_params_rejects_other_solver() {
        let mut params = LinearRegression::new().unwrap().get_params();
        params.solver = SolverParams::NormalEquation;
        params.model.learning_rate = 0.5;

        let mut model = LinearRegression::new().unwrap();
        assert!(model.set_params(params).is_err());
        assert_eq!(model.learning_rate(), 1e-4);
    }

    #[test]
    fn test_set_params_rejects_mismatched_bias() {
        let mut model = LinearRegression::builder()
            .learning_rate(0.1)
            .build()
            .unwrap();
        model.fit(&line(20), &mut quiet(5)).unwrap();
        let before = model.get_params();

        let mut params = model.get_params();
        params.model.state.bias = Some(array![1.0, 2.0, 3.0]);
        let err = model.set_params(params).unwrap_err();

        assert!(matches!(err, Error::Dimension { .. }));
        assert_eq!(model.get_params(), before);
        assert_eq!(model.predict(&line(3)).unwrap().dim(), (3, 1));
    }

    #[test]
    fn test_set_params_rejects_foreign_head() {
        let mut model = Perceptron::new().unwrap();
        for head in [OutputHead::Identity, OutputHead::Logistic] {
            let mut params = model.get_params();
            params.solver = SolverParams::GradientDescent { head };
            assert!(matches!(
                model.set_params(params),
                Err(Error::InvalidParameter(_))
            ));
        }
        assert_eq!(model.threshold(), Some(0.0));
    }

    #[test]
    fn test_set_params_changes_solver_head() {
        let mut params = Perceptron::new().unwrap().get_params();
        params.solver = SolverParams::GradientDescent {
            head: OutputHead::Step { threshold: 2.0 },
        };
        let mut model = Perceptron::new().unwrap();
        model.set_params(params).unwrap();
        assert_eq!(model.threshold(), Some(2.0));
    }

    #[test]
    fn test_clean_copy_is_unfitted() {
        let mut model = LinearRegression::builder()
            .learning_rate(0.1)
            .loss(MeanAbsoluteError)
            .build()
            .unwrap();
        model.fit(&line(20), &mut quiet(5)).unwrap();

        let copy = model.clean_copy();
        assert!(!copy.is_fitted());
        assert!(copy.coefficients().is_none());
        assert!(copy.cost_history().is_empty());
        assert_eq!(copy.learning_rate(), 0.1);
        assert_eq!(copy.loss().name(), "mean_absolute_error");
        assert_eq!(copy.solver(), model.solver());
    }

    #[test]
    fn test_refit_replaces_history() {
        let mut model = LinearRegression::builder()
            .learning_rate(0.1)
            .build()
            .unwrap();
        let ds = line(20);
        model.fit(&ds, &mut quiet(5)).unwrap();
        model.fit(&ds, &mut quiet(3)).unwrap();
        assert_eq!(model.cost_history().len(), 3);
    }

    #[test]
    fn test_training_loss_is_mse_by_default() {
        let mut model = LinearRegression::builder()
            .learning_rate(0.1)
            .loss(MeanSquaredError)
            .build()
            .unwrap();
        model.fit(&line(20), &mut quiet(2)).unwrap();
        // starts from zero weights, so the first epoch loss is roughly E[y²]
        assert!(model.cost_history()[0] > 1.0);
    }
}
