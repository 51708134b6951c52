//! Mean power analysis entry point and builder.

use std::env;
use std::fmt;
use std::sync::Arc;

use crate::analysis::{optimize, power_analysis_params, PowerParams, MIN_LABELED_SAMPLES};
use crate::config::{Costs, Target};
use crate::error::{PowerError, Result};
use crate::estimator::{mean_gradients, PointEstimator, PpiMeanEstimator};
use crate::input::{as_column, weight_vector, Measurements};
use crate::result::Allocation;
use crate::types::SquareMatrix;

/// Optimal sample sizes for PPI estimation of a mean.
///
/// # Example
///
/// ```ignore
/// use ppi_power::MeanPower;
///
/// // Gold labels cost 10, predictions cost 1, we can spend 10,000.
/// let allocation = MeanPower::new(10.0, 1.0)
///     .budget(10_000.0)
///     .run(&y, &yhat, &yhat_unlabeled)?;
///
/// println!("label {} points, predict on {} more", allocation.n, allocation.n_unlabeled);
/// ```
///
/// Exactly one of [`budget`](Self::budget) and [`se_tol`](Self::se_tol) is
/// needed; if both are set the budget is used.
#[derive(Clone)]
pub struct MeanPower {
    costs: Costs,
    budget: Option<f64>,
    se_tol: Option<f64>,
    weights: Option<Vec<f64>>,
    unlabeled_weights: Option<Vec<f64>>,
    estimator: Arc<dyn PointEstimator + Send + Sync>,
}

impl fmt::Debug for MeanPower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeanPower")
            .field("costs", &self.costs)
            .field("budget", &self.budget)
            .field("se_tol", &self.se_tol)
            .field("weights", &self.weights.as_ref().map(Vec::len))
            .field("unlabeled_weights", &self.unlabeled_weights.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

impl MeanPower {
    /// Create with the per-unit costs of gold labels and predictions.
    ///
    /// Uses the power-tuned [`PpiMeanEstimator`] and uniform weights.
    pub fn new(cost_gold: f64, cost_predict: f64) -> Self {
        Self {
            costs: Costs::new(cost_gold, cost_predict),
            budget: None,
            se_tol: None,
            weights: None,
            unlabeled_weights: None,
            estimator: Arc::new(PpiMeanEstimator::new()),
        }
    }

    /// Merge configuration from environment variables.
    ///
    /// Reads `PPI_BUDGET`, `PPI_SE_TOL`, `PPI_COST_GOLD` and
    /// `PPI_COST_PREDICT`. Unset or unparseable variables leave the current
    /// value untouched.
    pub fn from_env(mut self) -> Self {
        if let Some(budget) = parse_f64_env("PPI_BUDGET") {
            self = self.budget(budget);
        }
        if let Some(se_tol) = parse_f64_env("PPI_SE_TOL") {
            self = self.se_tol(se_tol);
        }
        if let Some(cost) = parse_f64_env("PPI_COST_GOLD") {
            self.costs.gold = cost;
        }
        if let Some(cost) = parse_f64_env("PPI_COST_PREDICT") {
            self.costs.prediction = cost;
        }
        self
    }

    /// Maximize power for this total budget.
    pub fn budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Minimize cost subject to this standard error.
    pub fn se_tol(mut self, se_tol: f64) -> Self {
        self.se_tol = Some(se_tol);
        self
    }

    /// Sample weights for the labeled data (default: all ones).
    pub fn weights(mut self, w: impl Into<Vec<f64>>) -> Self {
        self.weights = Some(w.into());
        self
    }

    /// Sample weights for the unlabeled data (default: all ones).
    pub fn unlabeled_weights(mut self, w: impl Into<Vec<f64>>) -> Self {
        self.unlabeled_weights = Some(w.into());
        self
    }

    /// Replace the point estimator used to center the gradients.
    pub fn estimator<E>(mut self, estimator: E) -> Self
    where
        E: PointEstimator + Send + Sync + 'static,
    {
        self.estimator = Arc::new(estimator);
        self
    }

    /// Get the current cost model.
    pub fn costs(&self) -> &Costs {
        &self.costs
    }

    /// Resolved optimization target.
    ///
    /// # Errors
    ///
    /// See [`Target::resolve`].
    pub fn target(&self) -> Result<Target> {
        Target::resolve(self.budget, self.se_tol)
    }

    /// Estimate sigma² and rho² from pilot data without optimizing.
    ///
    /// # Errors
    ///
    /// Returns the shape, weight and sample-count errors described on
    /// [`run`](Self::run).
    pub fn params<A, B, C>(&self, y: &A, yhat: &B, yhat_unlabeled: &C) -> Result<PowerParams>
    where
        A: Measurements + ?Sized,
        B: Measurements + ?Sized,
        C: Measurements + ?Sized,
    {
        let y = as_column("Y", y)?;
        let yhat = as_column("Yhat", yhat)?;
        let yhat_unlabeled = as_column("Yhat_unlabeled", yhat_unlabeled)?;

        let n = y.nrows();
        let big_n = yhat_unlabeled.nrows();
        if yhat.nrows() != n {
            return Err(PowerError::SampleCountMismatch {
                name: "Yhat",
                expected: n,
                actual: yhat.nrows(),
            });
        }
        if n < MIN_LABELED_SAMPLES {
            return Err(PowerError::InsufficientSamples {
                name: "Y",
                required: MIN_LABELED_SAMPLES,
                actual: n,
            });
        }
        if big_n == 0 {
            return Err(PowerError::InsufficientSamples {
                name: "Yhat_unlabeled",
                required: 1,
                actual: 0,
            });
        }

        let w = weight_vector("w", n, self.weights.as_deref())?;
        let w_unlabeled = weight_vector("w_unlabeled", big_n, self.unlabeled_weights.as_deref())?;

        let theta = self
            .estimator
            .estimate_mean(&y, &yhat, &yhat_unlabeled, &w, &w_unlabeled);
        tracing::debug!(theta, n, big_n, "ppi point estimate");

        let grads = mean_gradients(&y, &w, theta);
        let grads_hat = mean_gradients(&yhat, &w, theta);
        let grads_hat_unlabeled = mean_gradients(&yhat_unlabeled, &w_unlabeled, theta);
        let inv_hessian = SquareMatrix::identity(1, 1);

        power_analysis_params(&grads, &grads_hat, &grads_hat_unlabeled, &inv_hessian)
    }

    /// Compute the optimal pair of sample sizes.
    ///
    /// # Errors
    ///
    /// - [`PowerError::MissingParameter`] if neither budget nor `se_tol` is set.
    /// - [`PowerError::InvalidParameter`] for non-positive costs, budget or tolerance.
    /// - [`PowerError::InvalidShape`] if an input has more than one column.
    /// - [`PowerError::NonFiniteValue`] if an input contains NaN or an infinity.
    /// - [`PowerError::SampleCountMismatch`] if `Y` and `Yhat` differ in length.
    /// - [`PowerError::WeightLength`] / [`PowerError::InvalidWeights`] for bad weights.
    /// - [`PowerError::InsufficientSamples`] for fewer than two labeled or
    ///   zero unlabeled samples.
    pub fn run<A, B, C>(&self, y: &A, yhat: &B, yhat_unlabeled: &C) -> Result<Allocation>
    where
        A: Measurements + ?Sized,
        B: Measurements + ?Sized,
        C: Measurements + ?Sized,
    {
        let target = self.target()?;
        self.costs.validate()?;

        let params = self.params(y, yhat, yhat_unlabeled)?;
        let allocations = optimize(&params, &self.costs, target)?;

        // The mean has a single coordinate.
        let allocation = allocations[0];
        tracing::debug!(
            n = allocation.n,
            n_unlabeled = allocation.n_unlabeled,
            cost = allocation.cost,
            se = allocation.se,
            strategy = ?allocation.strategy,
            "optimal allocation"
        );
        Ok(allocation)
    }
}

/// Optimal pair of sample sizes for estimating a mean with PPI.
///
/// Convenience wrapper around [`MeanPower`]. At least one of `budget` and
/// `se_tol` must be given; if both are, `budget` is used.
///
/// # Errors
///
/// See [`MeanPower::run`].
#[allow(clippy::too_many_arguments)]
pub fn compute_mean_power(
    y: &[f64],
    yhat: &[f64],
    yhat_unlabeled: &[f64],
    cost_gold: f64,
    cost_predict: f64,
    budget: Option<f64>,
    se_tol: Option<f64>,
    w: Option<&[f64]>,
    w_unlabeled: Option<&[f64]>,
) -> Result<Allocation> {
    let mut power = MeanPower::new(cost_gold, cost_predict);
    power.budget = budget;
    power.se_tol = se_tol;
    power.weights = w.map(<[f64]>::to_vec);
    power.unlabeled_weights = w_unlabeled.map(<[f64]>::to_vec);
    power.run(y, yhat, yhat_unlabeled)
}

fn parse_f64_env(name: &str) -> Option<f64> {
    env::var(name).ok().and_then(|v| v.trim().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Strategy;
    use crate::types::{GradientMatrix, WeightVector};

    fn pilot() -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let y: Vec<f64> = (0..40).map(|i| (i % 10) as f64).collect();
        let yhat: Vec<f64> = y
            .iter()
            .enumerate()
            .map(|(i, v)| v + if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        let yhat_unlabeled: Vec<f64> = (0..200).map(|i| ((i * 7) % 10) as f64).collect();
        (y, yhat, yhat_unlabeled)
    }

    #[test]
    fn test_missing_target_fails_first() {
        let err = MeanPower::new(1.0, 0.1)
            .run(&[1.0][..], &[1.0, 2.0][..], &Vec::<f64>::new())
            .unwrap_err();
        assert_eq!(err, PowerError::MissingParameter);
    }

    #[test]
    fn test_length_mismatch() {
        let err = MeanPower::new(1.0, 0.1)
            .budget(100.0)
            .run(&[1.0, 2.0, 3.0][..], &[1.0, 2.0][..], &[1.0][..])
            .unwrap_err();
        assert!(matches!(err, PowerError::SampleCountMismatch { name: "Yhat", .. }));
    }

    #[test]
    fn test_empty_unlabeled_rejected() {
        let err = MeanPower::new(1.0, 0.1)
            .budget(100.0)
            .run(&[1.0, 2.0][..], &[1.0, 2.0][..], &Vec::<f64>::new())
            .unwrap_err();
        assert!(matches!(
            err,
            PowerError::InsufficientSamples {
                name: "Yhat_unlabeled",
                ..
            }
        ));
    }

    #[test]
    fn test_informative_predictions_use_ppi() {
        let (y, yhat, yhat_unlabeled) = pilot();
        let params = MeanPower::new(10.0, 0.1)
            .params(&y, &yhat, &yhat_unlabeled)
            .unwrap();
        assert!(params.rho_sq[0] > 0.5);
        assert!(params.rho_sq[0] <= 1.0 - 1.0 / 40.0);

        let alloc = MeanPower::new(10.0, 0.1)
            .budget(5_000.0)
            .run(&y, &yhat, &yhat_unlabeled)
            .unwrap();
        assert_eq!(alloc.strategy, Strategy::Ppi);
        assert!(alloc.n > 0 && alloc.n_unlabeled > 0);
    }

    #[test]
    fn test_convenience_matches_builder() {
        let (y, yhat, yhat_unlabeled) = pilot();
        let builder = MeanPower::new(10.0, 0.1)
            .se_tol(0.05)
            .run(&y, &yhat, &yhat_unlabeled)
            .unwrap();
        let direct = compute_mean_power(
            &y,
            &yhat,
            &yhat_unlabeled,
            10.0,
            0.1,
            None,
            Some(0.05),
            None,
            None,
        )
        .unwrap();
        assert_eq!(builder, direct);
    }

    #[test]
    fn test_custom_estimator_is_used() {
        let (y, yhat, yhat_unlabeled) = pilot();
        // Centering is irrelevant for unit weights: any θ gives the same parameters.
        let shifted = MeanPower::new(10.0, 0.1)
            .estimator(
                |_: &GradientMatrix,
                 _: &GradientMatrix,
                 _: &GradientMatrix,
                 _: &WeightVector,
                 _: &WeightVector| 123.0,
            )
            .params(&y, &yhat, &yhat_unlabeled)
            .unwrap();
        let stock = MeanPower::new(10.0, 0.1)
            .params(&y, &yhat, &yhat_unlabeled)
            .unwrap();
        assert!((shifted.sigma_sq[0] - stock.sigma_sq[0]).abs() < 1e-9);
        assert!((shifted.rho_sq[0] - stock.rho_sq[0]).abs() < 1e-9);
    }

    #[test]
    fn test_single_label_rejected_before_estimation() {
        let indexing = |y: &GradientMatrix,
                        _: &GradientMatrix,
                        _: &GradientMatrix,
                        _: &WeightVector,
                        _: &WeightVector| {
            assert!(y.nrows() >= 2, "estimator called with {} labels", y.nrows());
            y[(1, 0)]
        };
        for y in [Vec::new(), vec![1.0]] {
            let err = MeanPower::new(1.0, 0.1)
                .budget(100.0)
                .estimator(indexing)
                .run(&y, &y, &[1.0, 2.0][..])
                .unwrap_err();
            assert_eq!(
                err,
                PowerError::InsufficientSamples {
                    name: "Y",
                    required: 2,
                    actual: y.len()
                }
            );
        }
    }

    #[test]
    fn test_nan_label_is_an_error() {
        let (mut y, yhat, yhat_unlabeled) = pilot();
        y[5] = f64::NAN;
        let err = MeanPower::new(10.0, 0.1)
            .budget(1_000.0)
            .run(&y, &yhat, &yhat_unlabeled)
            .unwrap_err();
        assert_eq!(err, PowerError::NonFiniteValue { name: "Y", index: 5 });
    }

    #[test]
    fn test_weight_length_checked() {
        let (y, yhat, yhat_unlabeled) = pilot();
        let err = MeanPower::new(10.0, 0.1)
            .budget(100.0)
            .weights(vec![1.0; 3])
            .run(&y, &yhat, &yhat_unlabeled)
            .unwrap_err();
        assert!(matches!(err, PowerError::WeightLength { name: "w", .. }));
    }
}
