//! Power-analysis parameters from per-sample gradients.
//!
//! For an M-estimator with inverse Hessian `H`, the classical estimator's
//! per-coordinate variance and the PPI correlation are
//!
//! ```text
//! σ² = diag(H · Var(g) · H)
//! ρ² = diag(H · Cov(g, ĝ) · H)² / (σ² ⊙ diag(H · Var(ĝ) · H))
//! ```
//!
//! where `g` are gradients at the gold labels and `ĝ` at the predictions.
//! `Var(g)` and `Cov(g, ĝ)` use the labeled rows only (divisor `n`); `Var(ĝ)`
//! pools labeled and unlabeled predictions (divisor `n + N - 1`).

use serde::{Deserialize, Serialize};

use crate::error::{PowerError, Result};
use crate::statistics::{center_columns, cross_covariance, pooled_covariance, sandwich_diagonal};
use crate::types::{CoordVector, GradientMatrix, SquareMatrix};

/// Minimum labeled sample count for a variance estimate.
pub const MIN_LABELED_SAMPLES: usize = 2;

/// Inputs to the pair optimizers, one entry per estimand coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerParams {
    /// Variance of the classical point estimate.
    pub sigma_sq: CoordVector,
    /// PPI correlation, in `[0, 1 - 1/n]`.
    pub rho_sq: CoordVector,
    /// Labeled sample count the parameters were estimated from.
    pub n_labeled: usize,
    /// Unlabeled sample count the parameters were estimated from.
    pub n_unlabeled: usize,
}

impl PowerParams {
    /// Build parameters directly, e.g. from a pilot study.
    ///
    /// `rho_sq` is used as given; callers are responsible for keeping it below 1.
    pub fn from_scalars(sigma_sq: f64, rho_sq: f64) -> Self {
        Self {
            sigma_sq: CoordVector::from_element(1, sigma_sq),
            rho_sq: CoordVector::from_element(1, rho_sq),
            n_labeled: 0,
            n_unlabeled: 0,
        }
    }

    /// Number of estimand coordinates.
    pub fn dim(&self) -> usize {
        self.sigma_sq.len()
    }

    /// Largest rho² the labeled sample size can support.
    pub fn rho_sq_ceiling(&self) -> f64 {
        rho_sq_ceiling(self.n_labeled)
    }
}

fn rho_sq_ceiling(n: usize) -> f64 {
    1.0 - 1.0 / n as f64
}

fn check_columns(matrix: &GradientMatrix, d: usize) -> Result<()> {
    if matrix.ncols() != d {
        return Err(PowerError::DimensionMismatch {
            expected: d,
            actual: matrix.ncols(),
        });
    }
    Ok(())
}

/// Compute sigma² and rho² for power analysis.
///
/// # Arguments
///
/// * `grads` - Gradients at the gold labels (`n x d`)
/// * `grads_hat` - Gradients at the predictions on the labeled rows (`n x d`)
/// * `grads_hat_unlabeled` - Gradients at the predictions on the unlabeled rows (`N x d`)
/// * `inv_hessian` - Inverse Hessian of the loss (`d x d`; identity for the mean)
///
/// # Errors
///
/// - [`PowerError::DimensionMismatch`] if `inv_hessian` is not square or any
///   gradient matrix does not have `d` columns.
/// - [`PowerError::SampleCountMismatch`] if `grads_hat` and `grads` differ in rows.
/// - [`PowerError::InsufficientSamples`] if there are fewer than two labeled rows.
pub fn power_analysis_params(
    grads: &GradientMatrix,
    grads_hat: &GradientMatrix,
    grads_hat_unlabeled: &GradientMatrix,
    inv_hessian: &SquareMatrix,
) -> Result<PowerParams> {
    let d = inv_hessian.nrows();
    if inv_hessian.ncols() != d {
        return Err(PowerError::DimensionMismatch {
            expected: d,
            actual: inv_hessian.ncols(),
        });
    }
    check_columns(grads, d)?;
    check_columns(grads_hat, d)?;
    check_columns(grads_hat_unlabeled, d)?;

    let n = grads.nrows();
    if grads_hat.nrows() != n {
        return Err(PowerError::SampleCountMismatch {
            name: "grads_hat",
            expected: n,
            actual: grads_hat.nrows(),
        });
    }
    if n < MIN_LABELED_SAMPLES {
        return Err(PowerError::InsufficientSamples {
            name: "grads",
            required: MIN_LABELED_SAMPLES,
            actual: n,
        });
    }

    let grads_cent = center_columns(grads);
    let grads_hat_cent = center_columns(grads_hat);

    let cov_grads = cross_covariance(&grads_cent, &grads_hat_cent);
    let var_grads = cross_covariance(&grads_cent, &grads_cent);
    let var_grads_hat = pooled_covariance(grads_hat, grads_hat_unlabeled);

    let sigma_sq = sandwich_diagonal(inv_hessian, &var_grads);
    let cov_diag = sandwich_diagonal(inv_hessian, &cov_grads);
    let var_hat_diag = sandwich_diagonal(inv_hessian, &var_grads_hat);

    let ceiling = rho_sq_ceiling(n);
    let rho_sq = CoordVector::from_fn(d, |i, _| {
        let denom = sigma_sq[i] * var_hat_diag[i];
        if denom > 0.0 {
            (cov_diag[i].powi(2) / denom).min(ceiling)
        } else {
            // Constant labels or predictions carry no correlation to exploit.
            0.0
        }
    });

    tracing::debug!(
        n,
        n_unlabeled = grads_hat_unlabeled.nrows(),
        sigma_sq = ?sigma_sq.as_slice(),
        rho_sq = ?rho_sq.as_slice(),
        "computed power analysis parameters"
    );

    Ok(PowerParams {
        sigma_sq,
        rho_sq,
        n_labeled: n,
        n_unlabeled: grads_hat_unlabeled.nrows(),
    })
}
