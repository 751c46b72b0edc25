//! Fits y = 3x - 2 with both solvers and compares them on a held-out split.
//!
//! Run with `cargo run --example regression`.

use smarty::callback::EarlyStopping;
use smarty::dataset::{train_test_split, InMemoryDataset};
use smarty::model::LinearRegression;
use smarty::trainer::FitConfig;

fn main() -> smarty::Result<()> {
    let rows = (0..200)
        .map(|i| {
            let x = i as f64 / 20.0 - 5.0;
            let wobble = ((i * 7) % 5) as f64 * 0.02 - 0.04;
            vec![x, 3.0 * x - 2.0 + wobble]
        })
        .collect();
    let ds = InMemoryDataset::from_rows(rows)?
        .with_columns(["x", "y"])?
        .with_target(&["y"])?
        .with_batch_size(16)
        .with_shuffle(7);
    let (train, test) = train_test_split(&ds, 0.8, true, 42)?;

    let mut sgd = LinearRegression::builder().learning_rate(0.05).build()?;
    let mut config = FitConfig::builder()
        .epochs(500)
        .verbose(false)
        .early_stopping(EarlyStopping::new(10, 1e-8))
        .build();
    sgd.fit(&train, &mut config)?;

    let mut exact = LinearRegression::builder().solver("norm_eq").build()?;
    exact.fit(&train, &mut FitConfig::builder().verbose(false).build())?;

    for (name, model) in [("mbgd", &sgd), ("norm_eq", &exact)] {
        let scores = model.evaluate(&test, None)?;
        println!(
            "{name}: coef = {:?}, bias = {:?}, epochs = {}, test mse = {:.6}",
            model.coefficients().map(|w| w.column(0).to_vec()),
            model.bias().map(|b| b.to_vec()),
            model.cost_history().len(),
            scores["mean_squared_error"],
        );
    }
    Ok(())
}
