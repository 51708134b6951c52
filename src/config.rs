//! Cost model and optimization target.

use serde::{Deserialize, Serialize};

use crate::error::{PowerError, Result};

/// Per-unit costs of the three kinds of data a PPI study collects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Costs {
    /// Cost per gold-standard label.
    pub gold: f64,

    /// Cost per prediction.
    pub prediction: f64,

    /// Cost per unlabeled data point (default: 0).
    ///
    /// Mean estimation assumes the unlabeled covariates are free.
    pub unlabeled: f64,
}

impl Costs {
    /// Costs with free unlabeled data.
    pub fn new(gold: f64, prediction: f64) -> Self {
        Self {
            gold,
            prediction,
            unlabeled: 0.0,
        }
    }

    /// Set the cost per unlabeled data point.
    pub fn with_unlabeled(mut self, unlabeled: f64) -> Self {
        self.unlabeled = unlabeled;
        self
    }

    /// Relative cost of a prediction plus unlabeled unit vs. a gold label.
    pub fn gamma(&self) -> f64 {
        (self.prediction + self.unlabeled) / self.gold
    }

    /// Check that every cost is usable.
    ///
    /// # Errors
    ///
    /// Returns [`PowerError::InvalidParameter`] if the gold cost is not
    /// finite and positive, or another cost is negative or not finite.
    pub fn validate(&self) -> Result<()> {
        if !(self.gold.is_finite() && self.gold > 0.0) {
            return Err(PowerError::InvalidParameter(format!(
                "cost per gold label must be positive, got {}",
                self.gold
            )));
        }
        for (label, value) in [("prediction", self.prediction), ("unlabeled point", self.unlabeled)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PowerError::InvalidParameter(format!(
                    "cost per {} must be non-negative, got {}",
                    label, value
                )));
            }
        }
        Ok(())
    }
}

/// What the optimizer holds fixed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Target {
    /// Maximize power for this total budget.
    Budget(f64),
    /// Minimize cost while achieving this standard error.
    StandardError(f64),
}

impl Target {
    /// Pick the target from optional inputs; the budget wins if both are set.
    ///
    /// # Errors
    ///
    /// - [`PowerError::MissingParameter`] if neither is given.
    /// - [`PowerError::InvalidParameter`] if the chosen value is not finite and positive.
    pub fn resolve(budget: Option<f64>, se_tol: Option<f64>) -> Result<Self> {
        let target = match (budget, se_tol) {
            (Some(b), _) => Target::Budget(b),
            (None, Some(se)) => Target::StandardError(se),
            (None, None) => return Err(PowerError::MissingParameter),
        };
        target.validate()?;
        Ok(target)
    }

    /// Check that the budget or tolerance is finite and positive.
    ///
    /// # Errors
    ///
    /// Returns [`PowerError::InvalidParameter`] otherwise.
    pub fn validate(&self) -> Result<()> {
        let (label, value) = match *self {
            Target::Budget(b) => ("budget", b),
            Target::StandardError(se) => ("se_tol", se),
        };
        if !(value.is_finite() && value > 0.0) {
            return Err(PowerError::InvalidParameter(format!(
                "{} must be positive, got {}",
                label, value
            )));
        }
        Ok(())
    }
}
