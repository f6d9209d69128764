//! Linear algebra operations for factor model fitting.

use ndarray::{Array1, Array2};

use crate::MathError;

/// Relative pivot tolerance below which a system is treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Result of ordinary least squares regression.
#[derive(Debug, Clone)]
pub struct OlsResult {
    /// Estimated coefficients, one per design column.
    pub coefficients: Array1<f64>,
    /// In-sample residuals.
    pub residuals: Array1<f64>,
    /// R-squared.
    pub r_squared: f64,
    /// Adjusted R-squared (`None` without residual degrees of freedom).
    pub adj_r_squared: Option<f64>,
    /// Coefficient standard errors (`None` without residual degrees of freedom).
    pub std_errors: Option<Array1<f64>>,
    /// Number of observations used.
    pub n_obs: usize,
}

impl OlsResult {
    /// Residual degrees of freedom.
    #[must_use]
    pub fn df_resid(&self) -> usize {
        self.n_obs.saturating_sub(self.coefficients.len())
    }
}

/// Perform ordinary least squares regression.
///
/// Solves: argmin_beta sum((y_i - X_i * beta)^2)
///
/// The normal equations are solved by Gaussian elimination with partial
/// pivoting. Include a column of ones in `x` to fit an intercept.
///
/// # Arguments
/// * `y` - Response vector (n,)
/// * `x` - Design matrix (n x p)
///
/// # Errors
/// Returns error if dimensions mismatch, `n < p`, or the design is rank deficient.
pub fn ordinary_least_squares(y: &Array1<f64>, x: &Array2<f64>) -> Result<OlsResult, MathError> {
    let n = y.len();
    let p = x.ncols();

    if x.nrows() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: x.nrows() });
    }
    if n == 0 || p == 0 {
        return Err(MathError::EmptyData);
    }
    if n < p {
        return Err(MathError::InsufficientObservations { required: p, actual: n });
    }
    if y.iter().chain(x.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::NumericalInstability("non-finite regression input".to_string()));
    }

    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);

    let coefficients = solve_linear_system(&xtx, &xty)?;

    let fitted = x.dot(&coefficients);
    let residuals = y - &fitted;

    let y_mean = y.mean().unwrap_or(0.0);
    let ss_tot: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();
    let ss_res: f64 = residuals.iter().map(|r| r.powi(2)).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    let df_resid = n - p;
    let (adj_r_squared, std_errors) = if df_resid > 0 {
        let adj = 1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / df_resid as f64;
        let sigma_sq = ss_res / df_resid as f64;
        let xtx_inv = invert_matrix(&xtx)?;
        let se = xtx_inv.diag().mapv(|v| (sigma_sq * v).max(0.0).sqrt());
        (Some(adj), Some(se))
    } else {
        (None, None)
    };

    Ok(OlsResult { coefficients, residuals, r_squared, adj_r_squared, std_errors, n_obs: n })
}

/// Solve a linear system Ax = b using Gaussian elimination with partial pivoting.
///
/// # Errors
/// Returns `MathError::Singular` if a pivot falls below the relative tolerance.
pub fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, MathError> {
    let n = a.nrows();
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    if a.ncols() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: a.ncols() });
    }
    if b.len() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: b.len() });
    }

    let tolerance = pivot_tolerance(a);

    // Augmented matrix [A | b]
    let mut aug = Array2::zeros((n, n + 1));
    aug.slice_mut(ndarray::s![.., ..n]).assign(a);
    aug.column_mut(n).assign(b);

    for col in 0..n {
        let pivot_row = find_pivot(&aug, col, tolerance)?;
        if pivot_row != col {
            swap_rows(&mut aug, col, pivot_row);
        }

        for row in (col + 1)..n {
            let factor = aug[[row, col]] / aug[[col, col]];
            for j in col..=n {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    // Back substitution
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = aug[[i, n]];
        for j in (i + 1)..n {
            sum -= aug[[i, j]] * x[j];
        }
        x[i] = sum / aug[[i, i]];
    }

    Ok(x)
}

/// Invert a square matrix using Gauss-Jordan elimination with partial pivoting.
///
/// # Errors
/// Returns `MathError::Singular` if the matrix is not invertible.
pub fn invert_matrix(a: &Array2<f64>) -> Result<Array2<f64>, MathError> {
    let n = a.nrows();
    if n == 0 {
        return Err(MathError::EmptyData);
    }
    if a.ncols() != n {
        return Err(MathError::DimensionMismatch { expected: n, actual: a.ncols() });
    }

    let tolerance = pivot_tolerance(a);

    // Augmented matrix [A | I]
    let mut aug = Array2::zeros((n, 2 * n));
    aug.slice_mut(ndarray::s![.., ..n]).assign(a);
    for i in 0..n {
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let pivot_row = find_pivot(&aug, col, tolerance)?;
        if pivot_row != col {
            swap_rows(&mut aug, col, pivot_row);
        }

        let pivot = aug[[col, col]];
        for j in 0..(2 * n) {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[[row, col]];
            if factor == 0.0 {
                continue;
            }
            for j in 0..(2 * n) {
                aug[[row, j]] -= factor * aug[[col, j]];
            }
        }
    }

    Ok(aug.slice(ndarray::s![.., n..]).to_owned())
}

fn pivot_tolerance(a: &Array2<f64>) -> f64 {
    let scale = a.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    PIVOT_TOLERANCE * scale.max(f64::MIN_POSITIVE)
}

fn find_pivot(aug: &Array2<f64>, col: usize, tolerance: f64) -> Result<usize, MathError> {
    let n = aug.nrows();
    let mut max_row = col;
    let mut max_val = aug[[col, col]].abs();
    for row in (col + 1)..n {
        if aug[[row, col]].abs() > max_val {
            max_val = aug[[row, col]].abs();
            max_row = row;
        }
    }

    if max_val <= tolerance {
        return Err(MathError::Singular);
    }
    Ok(max_row)
}

fn swap_rows(aug: &mut Array2<f64>, a: usize, b: usize) {
    for j in 0..aug.ncols() {
        aug.swap([a, j], [b, j]);
    }
}
