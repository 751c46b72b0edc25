use crate::error::{Error, Result};
use ndarray::Array2;

/// Pivots smaller than this fraction of the largest diagonal entry count as zero.
const SINGULAR_TOLERANCE: f64 = 1e-10;

/// Solves `A · X = B` for symmetric positive definite `A` (such as `XᵀX`)
/// via the Cholesky factorization `A = L · Lᵀ`.
///
/// Only the lower triangle of `A` is read. Returns [`Error::SingularMatrix`]
/// when `A` is not (numerically) positive definite.
pub(crate) fn cholesky_solve(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(Error::dimension("a square matrix", format!("{:?}", a.dim())));
    }
    if b.nrows() != n {
        return Err(Error::dimension(format!("{n} rows"), format!("{} rows", b.nrows())));
    }

    let l = cholesky(a)?;

    // L · Z = B, then Lᵀ · X = Z
    let mut x = b.clone();
    for col in 0..x.ncols() {
        for i in 0..n {
            let sum: f64 = (0..i).map(|k| l[[i, k]] * x[[k, col]]).sum();
            x[[i, col]] = (x[[i, col]] - sum) / l[[i, i]];
        }
        for i in (0..n).rev() {
            let sum: f64 = (i + 1..n).map(|k| l[[k, i]] * x[[k, col]]).sum();
            x[[i, col]] = (x[[i, col]] - sum) / l[[i, i]];
        }
    }
    Ok(x)
}

/// Lower-triangular `L` with `A = L · Lᵀ`.
fn cholesky(a: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    let scale = (0..n).fold(0.0_f64, |acc, i| acc.max(a[[i, i]].abs()));
    if !scale.is_finite() || scale == 0.0 {
        return Err(Error::SingularMatrix);
    }
    let tolerance = scale * SINGULAR_TOLERANCE;

    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let diag = a[[j, j]] - (0..j).map(|k| l[[j, k]].powi(2)).sum::<f64>();
        if !(diag > tolerance) {
            return Err(Error::SingularMatrix);
        }
        let pivot = diag.sqrt();
        l[[j, j]] = pivot;
        for i in j + 1..n {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            l[[i, j]] = (a[[i, j]] - sum) / pivot;
        }
    }
    Ok(l)
}
