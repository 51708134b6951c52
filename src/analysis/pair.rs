//! Optimal (n, N) sample-size pairs.
//!
//! With `γ = (c_ŷ + c_x) / c_y` the relative cost of a prediction, the
//! cost of buying one classical-equivalent sample through PPI is
//!
//! ```text
//! ppi_cost       = c_y · (1 - ρ² + γρ² + 2·sqrt(γρ²(1 - ρ²)))
//! classical_cost = (c_y + c_x) · σ²
//! ```
//!
//! PPI is used only when `classical_cost > ppi_cost`; otherwise every
//! dollar goes to gold labels. Given the classical-equivalent sample count
//! `n0`, the PPI pair is
//!
//! ```text
//! n = n0 · (1 - ρ² + sqrt(γρ²(1 - ρ²)))
//! N = n · (n0 - n) / (n - (1 - ρ²)·n0)
//! ```
//!
//! which gives the PPI estimator variance `σ²/n · (1 - ρ²·N/(n + N)) = σ²/n0`.
//!
//! N is negative when `ρ²/(1 - ρ²) < γ` and undefined when `ρ² = 0` or
//! `γ = 0`. Unlabeled data cannot help there, so the allocation falls back
//! to gold labels sized for the same budget or tolerance.

use crate::analysis::params::PowerParams;
use crate::config::{Costs, Target};
use crate::error::Result;
use crate::result::{Allocation, Strategy};

/// Per-unit costs of the two estimators for one coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostComparison {
    /// Relative cost of a prediction plus unlabeled unit.
    pub gamma: f64,
    /// Cost of one classical-equivalent sample via PPI.
    pub ppi_cost: f64,
    /// Cost of one classical sample.
    pub classical_cost: f64,
}

impl CostComparison {
    /// Compare the estimators for one coordinate.
    pub fn new(sigma_sq: f64, rho_sq: f64, costs: &Costs) -> Self {
        let gamma = costs.gamma();
        let ppi_cost = costs.gold
            * (1.0 - rho_sq + gamma * rho_sq + 2.0 * (gamma * rho_sq * (1.0 - rho_sq)).sqrt());
        let classical_cost = (costs.gold + costs.unlabeled) * sigma_sq;
        Self {
            gamma,
            ppi_cost,
            classical_cost,
        }
    }

    /// Whether PPI is strictly cheaper than the classical estimator.
    pub fn ppi_advantageous(&self) -> bool {
        self.classical_cost > self.ppi_cost
    }
}

/// Most powerful pair of sample sizes for a given budget.
///
/// Returns one allocation per estimand coordinate.
///
/// # Errors
///
/// Returns [`PowerError::InvalidParameter`](crate::PowerError::InvalidParameter)
/// if the costs or the budget are out of range.
pub fn powerful_pair(params: &PowerParams, costs: &Costs, budget: f64) -> Result<Vec<Allocation>> {
    optimize(params, costs, Target::Budget(budget))
}

/// Cheapest pair of sample sizes achieving a standard error of `se_tol`.
///
/// Returns one allocation per estimand coordinate.
///
/// # Errors
///
/// Returns [`PowerError::InvalidParameter`](crate::PowerError::InvalidParameter)
/// if the costs or the tolerance are out of range.
pub fn cheap_pair(params: &PowerParams, costs: &Costs, se_tol: f64) -> Result<Vec<Allocation>> {
    optimize(params, costs, Target::StandardError(se_tol))
}

/// Dispatch to the budget- or precision-constrained optimizer.
///
/// # Errors
///
/// Returns [`PowerError::InvalidParameter`](crate::PowerError::InvalidParameter)
/// if the costs or the target value are out of range.
pub fn optimize(params: &PowerParams, costs: &Costs, target: Target) -> Result<Vec<Allocation>> {
    costs.validate()?;
    target.validate()?;

    let allocations = params
        .sigma_sq
        .iter()
        .zip(params.rho_sq.iter())
        .map(|(&sigma_sq, &rho_sq)| allocate_coordinate(sigma_sq, rho_sq, costs, target))
        .collect();
    Ok(allocations)
}

fn allocate_coordinate(sigma_sq: f64, rho_sq: f64, costs: &Costs, target: Target) -> Allocation {
    let comparison = CostComparison::new(sigma_sq, rho_sq, costs);

    tracing::debug!(
        gamma = comparison.gamma,
        ppi_cost = comparison.ppi_cost,
        classical_cost = comparison.classical_cost,
        ppi = comparison.ppi_advantageous(),
        "compared estimator costs"
    );

    if comparison.ppi_advantageous() {
        let n0 = match target {
            Target::Budget(budget) => budget / comparison.ppi_cost,
            Target::StandardError(se_tol) => sigma_sq / se_tol.powi(2),
        };
        let pair = optimal_pair(n0, sigma_sq, rho_sq, comparison.gamma, costs.gold);
        if let Some(allocation) = pair {
            return allocation;
        }
    }

    let n = match target {
        Target::Budget(budget) => budget / (costs.gold + costs.unlabeled),
        Target::StandardError(se_tol) => sigma_sq / se_tol.powi(2),
    };
    classical_allocation(n, sigma_sq, costs)
}

/// Gold labels only: `n` samples, no unlabeled data.
///
/// Each gold label also pays for its unlabeled data point.
fn classical_allocation(n: f64, sigma_sq: f64, costs: &Costs) -> Allocation {
    let n = truncate_count(n);
    Allocation {
        n,
        n_unlabeled: 0,
        cost: n as f64 * (costs.gold + costs.unlabeled),
        se: standard_error(sigma_sq, n, 0.0, 0),
        strategy: Strategy::Classical,
    }
}

/// Optimal PPI pair matching the standard error of a classical estimator
/// with `n0` samples.
///
/// # Arguments
///
/// * `n0` - Number of samples for the classical estimator
/// * `sigma_sq` - Variance of the classical point estimate
/// * `rho_sq` - PPI correlation
/// * `gamma` - Relative cost of a prediction plus unlabeled unit
/// * `cost_gold` - Cost per gold-standard label
///
/// Both counts are truncated toward zero. Returns `None` when the formula
/// has no finite, non-negative `N`: predictions cost more than the variance
/// they remove, or the denominator `n - (1 - ρ²)·n0` vanishes at `ρ² = 0`
/// or `γ = 0`.
pub fn optimal_pair(
    n0: f64,
    sigma_sq: f64,
    rho_sq: f64,
    gamma: f64,
    cost_gold: f64,
) -> Option<Allocation> {
    let n = n0 * (1.0 - rho_sq + (gamma * rho_sq * (1.0 - rho_sq)).sqrt());
    let raw_unlabeled = n * (n0 - n) / (n - (1.0 - rho_sq) * n0);

    if !raw_unlabeled.is_finite() {
        tracing::warn!(
            n0,
            rho_sq,
            gamma,
            "unlabeled sample size is singular; allocating gold labels only"
        );
        return None;
    }
    if raw_unlabeled < 0.0 {
        tracing::debug!(
            raw_unlabeled,
            "negative unlabeled sample size; allocating gold labels only"
        );
        return None;
    }

    let n = truncate_count(n);
    let n_unlabeled = truncate_count(raw_unlabeled);
    let cost = n as f64 * cost_gold + (n + n_unlabeled) as f64 * gamma * cost_gold;
    let se = standard_error(sigma_sq, n, rho_sq, n_unlabeled);

    Some(Allocation {
        n,
        n_unlabeled,
        cost,
        se,
        strategy: Strategy::Ppi,
    })
}

/// Standard error of the PPI estimator `sqrt(σ²/n) · sqrt(1 - ρ²·N/(n + N))`.
///
/// Reduces to the classical `sqrt(σ²/n)` when `N = 0`.
pub fn standard_error(sigma_sq: f64, n: u64, rho_sq: f64, n_unlabeled: u64) -> f64 {
    if n == 0 {
        return if sigma_sq == 0.0 { 0.0 } else { f64::INFINITY };
    }
    let n_f = n as f64;
    let total = (n + n_unlabeled) as f64;
    (sigma_sq / n_f).sqrt() * (1.0 - rho_sq * n_unlabeled as f64 / total).sqrt()
}

/// Sample counts are truncated toward zero; non-finite and negative values become 0.
fn truncate_count(x: f64) -> u64 {
    if x.is_finite() && x > 0.0 {
        x.trunc() as u64
    } else {
        0
    }
}
