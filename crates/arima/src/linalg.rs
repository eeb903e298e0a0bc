//! Small dense linear algebra on `ndarray` matrices.
//!
//! The decomposition engine only ever solves systems whose size is the sum
//! of a few polynomial orders, so plain partial-pivoting LU and Householder
//! reflections are sufficient.

use ndarray::{Array1, Array2};

use crate::error::ArimaError;

/// Solves `a · x = b` by LU decomposition with partial pivoting.
///
/// # Errors
///
/// [`ArimaError::SingularMatrix`] when a pivot vanishes.
pub fn lu_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, ArimaError> {
    let n = b.len();
    let mut m = a.clone();
    let mut x = b.clone();

    for c in 0..n {
        let pivot = (c..n)
            .max_by(|&i, &j| m[[i, c]].abs().total_cmp(&m[[j, c]].abs()))
            .unwrap_or(c);
        let p = m[[pivot, c]];
        if !p.is_finite() || p.abs() < 1e-300 {
            return Err(ArimaError::SingularMatrix(n));
        }
        if pivot != c {
            for k in 0..n {
                m.swap([c, k], [pivot, k]);
            }
            x.swap(c, pivot);
        }
        for r in c + 1..n {
            let f = m[[r, c]] / m[[c, c]];
            if f == 0.0 {
                continue;
            }
            for k in c..n {
                m[[r, k]] -= f * m[[c, k]];
            }
            x[r] -= f * x[c];
        }
    }

    for r in (0..n).rev() {
        let mut s = x[r];
        for k in r + 1..n {
            s -= m[[r, k]] * x[k];
        }
        x[r] = s / m[[r, r]];
    }
    Ok(x)
}

/// Cholesky factor `L` (lower triangular, `P = L Lᵀ`) of a positive
/// semi-definite matrix.
///
/// Columns whose pivot is below `1e-13 · max diag` are left at zero, which
/// handles the rank-deficient covariances of ARIMA state vectors.
pub fn cholesky_psd(p: &Array2<f64>) -> Array2<f64> {
    let n = p.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    let max_diag = (0..n).fold(0.0_f64, |m, i| m.max(p[[i, i]]));
    let tolerance = 1e-13 * max_diag;
    for j in 0..n {
        let mut d = p[[j, j]];
        for k in 0..j {
            d -= l[[j, k]] * l[[j, k]];
        }
        if d <= tolerance {
            continue;
        }
        let pivot = d.sqrt();
        l[[j, j]] = pivot;
        for i in j + 1..n {
            let mut s = p[[i, j]];
            for k in 0..j {
                s -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = s / pivot;
        }
    }
    l
}

/// Householder LQ triangularization.
///
/// Returns the `rows × rows` lower-triangular `L` with `U Uᵀ = L Lᵀ`; used by
/// the square-root Kalman filter to propagate covariance factors.
pub fn lq_lower(u: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = u.dim();
    let mut a = u.clone();
    let mut v = vec![0.0; cols];

    for k in 0..rows.min(cols) {
        let norm = (k..cols).map(|j| a[[k, j]] * a[[k, j]]).sum::<f64>().sqrt();
        if norm == 0.0 {
            continue;
        }
        let alpha = if a[[k, k]] >= 0.0 { -norm } else { norm };
        v.iter_mut().for_each(|x| *x = 0.0);
        v[k] = a[[k, k]] - alpha;
        for j in k + 1..cols {
            v[j] = a[[k, j]];
        }
        let vv: f64 = v[k..].iter().map(|x| x * x).sum();
        if vv == 0.0 {
            continue;
        }
        for i in k..rows {
            let dot: f64 = (k..cols).map(|j| a[[i, j]] * v[j]).sum();
            let f = 2.0 * dot / vv;
            for j in k..cols {
                a[[i, j]] -= f * v[j];
            }
        }
    }

    Array2::from_shape_fn((rows, rows), |(i, j)| {
        if j < cols && j <= i { a[[i, j]] } else { 0.0 }
    })
}
