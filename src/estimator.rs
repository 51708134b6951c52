//! PPI point estimation of a mean.
//!
//! The power analysis only needs a consistent estimate θ̂ to center the
//! gradients `w·(Y - θ̂)`, so the estimator sits behind the
//! [`PointEstimator`] trait. [`PpiMeanEstimator`] is the stock implementation.

use crate::statistics::{center_columns, pooled_covariance};
use crate::types::{GradientMatrix, WeightVector};

/// A bias-corrected estimator of the mean from labeled and unlabeled data.
///
/// All matrices are `n x 1` (or `N x 1`) columns produced by
/// [`as_column`](crate::input::as_column); weights align row-for-row.
pub trait PointEstimator {
    /// Estimate the population mean.
    fn estimate_mean(
        &self,
        y: &GradientMatrix,
        yhat: &GradientMatrix,
        yhat_unlabeled: &GradientMatrix,
        w: &WeightVector,
        w_unlabeled: &WeightVector,
    ) -> f64;
}

impl<F> PointEstimator for F
where
    F: Fn(&GradientMatrix, &GradientMatrix, &GradientMatrix, &WeightVector, &WeightVector) -> f64,
{
    fn estimate_mean(
        &self,
        y: &GradientMatrix,
        yhat: &GradientMatrix,
        yhat_unlabeled: &GradientMatrix,
        w: &WeightVector,
        w_unlabeled: &WeightVector,
    ) -> f64 {
        self(y, yhat, yhat_unlabeled, w, w_unlabeled)
    }
}

/// How much weight the predictions receive in the PPI mean.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Lambda {
    /// Choose λ to minimize the estimator variance, clipped to `[0, 1]`.
    #[default]
    Tuned,
    /// Use this λ as given. `Fixed(1.0)` is plain PPI, `Fixed(0.0)` the classical mean.
    Fixed(f64),
}

/// Weighted PPI mean `mean(w_u·λ·Ŷ_u) + mean(w·(Y - λ·Ŷ))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PpiMeanEstimator {
    lambda: Lambda,
}

impl PpiMeanEstimator {
    /// Power-tuned estimator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimator with a fixed prediction weight.
    pub fn with_lambda(lambda: f64) -> Self {
        Self {
            lambda: Lambda::Fixed(lambda),
        }
    }

    /// The configured λ policy.
    pub fn lambda(&self) -> Lambda {
        self.lambda
    }
}

impl PointEstimator for PpiMeanEstimator {
    fn estimate_mean(
        &self,
        y: &GradientMatrix,
        yhat: &GradientMatrix,
        yhat_unlabeled: &GradientMatrix,
        w: &WeightVector,
        w_unlabeled: &WeightVector,
    ) -> f64 {
        let lambda = match self.lambda {
            Lambda::Fixed(lambda) => lambda,
            Lambda::Tuned => {
                let theta = ppi_mean(y, yhat, yhat_unlabeled, w, w_unlabeled, 1.0);
                tuned_lambda(
                    &mean_gradients(y, w, theta),
                    &mean_gradients(yhat, w, theta),
                    &mean_gradients(yhat_unlabeled, w_unlabeled, theta),
                )
            }
        };
        ppi_mean(y, yhat, yhat_unlabeled, w, w_unlabeled, lambda)
    }
}

/// Gradients of the squared loss for the mean, `w_i·(x_i - θ)`.
pub fn mean_gradients(values: &GradientMatrix, weights: &WeightVector, theta: f64) -> GradientMatrix {
    GradientMatrix::from_fn(values.nrows(), 1, |i, _| weights[i] * (values[(i, 0)] - theta))
}

fn ppi_mean(
    y: &GradientMatrix,
    yhat: &GradientMatrix,
    yhat_unlabeled: &GradientMatrix,
    w: &WeightVector,
    w_unlabeled: &WeightVector,
    lambda: f64,
) -> f64 {
    let n = y.nrows() as f64;
    let big_n = yhat_unlabeled.nrows() as f64;

    let unlabeled_term = yhat_unlabeled
        .column(0)
        .iter()
        .zip(w_unlabeled.iter())
        .map(|(yh, wu)| wu * lambda * yh)
        .sum::<f64>()
        / big_n;
    let rectifier = y
        .column(0)
        .iter()
        .zip(yhat.column(0).iter())
        .zip(w.iter())
        .map(|((yi, yh), wi)| wi * (yi - lambda * yh))
        .sum::<f64>()
        / n;

    unlabeled_term + rectifier
}

/// Variance-minimizing λ for a one-dimensional mean, clipped to `[0, 1]`.
///
/// ```text
/// λ̂ = (2/n)·Σ ĝcᵢ·gcᵢ / (2·(1 + n/N)·Var(ĝ))
/// ```
fn tuned_lambda(
    grads: &GradientMatrix,
    grads_hat: &GradientMatrix,
    grads_hat_unlabeled: &GradientMatrix,
) -> f64 {
    let n = grads.nrows() as f64;
    let big_n = grads_hat_unlabeled.nrows() as f64;

    let g = center_columns(grads);
    let gh = center_columns(grads_hat);
    let cov = (g.transpose() * &gh + gh.transpose() * &g)[(0, 0)] / n;
    let var_hat = pooled_covariance(grads_hat, grads_hat_unlabeled)[(0, 0)];

    let denom = 2.0 * (1.0 + n / big_n) * var_hat;
    if denom > 0.0 && denom.is_finite() {
        (cov / denom).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
