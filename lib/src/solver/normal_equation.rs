use super::linalg;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::loss::Loss;
use crate::model::ModelState;
use crate::trainer::FitConfig;
use ndarray::{concatenate, s, Array2, ArrayView2, Axis};

/// Closed-form least squares: `θ = (XᵀX)⁻¹ Xᵀ y` on the design matrix `[1 | X]`.
///
/// Fits in a single shot, so `config.epochs` and the callbacks are not used and
/// `cost_history` stays empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalEquation;

impl NormalEquation {
    pub fn new() -> Self {
        Self
    }

    pub fn fit<D: Dataset>(
        &self,
        state: &mut ModelState,
        dataset: &D,
        loss: &dyn Loss,
        config: &mut FitConfig,
    ) -> Result<()> {
        if dataset.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let x = dataset.feature_columns();
        let y = dataset.target_columns().ok_or(Error::MissingTarget)?;
        if y.nrows() != x.nrows() {
            return Err(Error::dimension(
                format!("{} target rows", x.nrows()),
                y.nrows(),
            ));
        }

        let x_aug = augment(x.view())?;
        let theta = linalg::cholesky_solve(&x_aug.t().dot(&x_aug), &x_aug.t().dot(&y))?;

        state.reset(x.ncols(), y.ncols());
        state.bias = Some(theta.row(0).to_owned());
        state.coefficients = Some(theta.slice(s![1.., ..]).to_owned());

        let training_loss = loss.score(y.view(), self.predict(state, x.view())?.view());
        config.progress.epoch_begin(1, 1);
        config.progress.step(1, 1, training_loss);
        config.progress.epoch_end(1, 1, training_loss);
        Ok(())
    }

    pub fn predict(&self, state: &ModelState, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        state.linear_output(x)
    }
}

/// Prepends a column of ones.
fn augment(x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let ones = Array2::<f64>::ones((x.nrows(), 1));
    concatenate(Axis(1), &[ones.view(), x.view()])
        .map_err(|e| Error::dimension("stackable feature rows", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::InMemoryDataset;
    use crate::loss::MeanSquaredError;
    use crate::solver::gradient_descent::{GradientDescent, OutputHead};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn quiet() -> FitConfig {
        FitConfig::builder().verbose(false).build()
    }

    #[test]
    fn test_exact_solution_two_features() {
        // y = 3 + 1*x1 - 2*x2
        let rows = vec![
            vec![0.0, 0.0, 3.0],
            vec![1.0, 0.0, 4.0],
            vec![0.0, 1.0, 1.0],
            vec![2.0, 3.0, -1.0],
            vec![4.0, 1.0, 5.0],
        ];
        let ds = InMemoryDataset::from_rows(rows)
            .unwrap()
            .with_target_indices(&[2])
            .unwrap();
        let mut state = ModelState::default();

        NormalEquation::new()
            .fit(&mut state, &ds, &MeanSquaredError, &mut quiet())
            .unwrap();

        let w = state.coefficients.as_ref().unwrap();
        assert_eq!(w.dim(), (2, 1));
        assert_abs_diff_eq!(w[[0, 0]], 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(w[[1, 0]], -2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(state.bias.as_ref().unwrap()[0], 3.0, epsilon = 1e-9);
        assert!(state.cost_history.is_empty());
    }

    #[test]
    fn test_multiple_targets() {
        // t1 = 2x + 1, t2 = -x
        let rows = (0..6)
            .map(|i| {
                let x = i as f64;
                vec![x, 2.0 * x + 1.0, -x]
            })
            .collect();
        let ds = InMemoryDataset::from_rows(rows)
            .unwrap()
            .with_target_indices(&[1, 2])
            .unwrap();
        let mut state = ModelState::default();

        NormalEquation::new()
            .fit(&mut state, &ds, &MeanSquaredError, &mut quiet())
            .unwrap();

        let pred = NormalEquation::new()
            .predict(&state, array![[10.0]].view())
            .unwrap();
        assert_abs_diff_eq!(pred[[0, 0]], 21.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pred[[0, 1]], -10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_matches_converged_gradient_descent() {
        let rows = (0..50)
            .map(|i| {
                let x = i as f64 / 50.0;
                // small deterministic wobble so the fit is not exact
                let noise = if i % 2 == 0 { 0.05 } else { -0.05 };
                vec![x, 0.5 * x - 1.0 + noise]
            })
            .collect();
        let ds = InMemoryDataset::from_rows(rows)
            .unwrap()
            .with_target_indices(&[1])
            .unwrap()
            .with_batch_size(50);

        let mut closed = ModelState::default();
        NormalEquation::new()
            .fit(&mut closed, &ds, &MeanSquaredError, &mut quiet())
            .unwrap();

        let mut iterative = ModelState::default();
        let mut config = FitConfig::builder().epochs(5000).verbose(false).build();
        GradientDescent::new(OutputHead::Identity)
            .fit(&mut iterative, &ds, &MeanSquaredError, 1.0, &mut config)
            .unwrap();

        assert_abs_diff_eq!(
            closed.coefficients.unwrap()[[0, 0]],
            iterative.coefficients.unwrap()[[0, 0]],
            epsilon = 1e-4
        );
        assert_abs_diff_eq!(
            closed.bias.unwrap()[0],
            iterative.bias.unwrap()[0],
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_collinear_features_are_singular() {
        let rows = vec![
            vec![1.0, 2.0, 1.0],
            vec![2.0, 4.0, 2.0],
            vec![3.0, 6.0, 3.0],
        ];
        let ds = InMemoryDataset::from_rows(rows)
            .unwrap()
            .with_target_indices(&[2])
            .unwrap();

        let err = NormalEquation::new()
            .fit(&mut ModelState::default(), &ds, &MeanSquaredError, &mut quiet())
            .unwrap_err();
        assert!(matches!(err, Error::SingularMatrix));
    }

    #[test]
    fn test_augment_prepends_ones() {
        let x = array![[2.0, 3.0], [4.0, 5.0]];
        assert_eq!(
            augment(x.view()).unwrap(),
            array![[1.0, 2.0, 3.0], [1.0, 4.0, 5.0]]
        );
    }

    #[test]
    fn test_requires_targets() {
        let ds = InMemoryDataset::from_rows(vec![vec![1.0], vec![2.0]]).unwrap();
        let err = NormalEquation::new()
            .fit(&mut ModelState::default(), &ds, &MeanSquaredError, &mut quiet())
            .unwrap_err();
        assert!(matches!(err, Error::MissingTarget));
    }
}
