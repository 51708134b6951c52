//! Allocation result types.

use serde::{Deserialize, Serialize};

/// Which estimator an allocation was sized for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Strategy {
    /// Predictions pay for themselves: collect gold labels plus extra predictions.
    Ppi,
    /// Predictions do not beat the classical estimator: gold labels only.
    Classical,
}

/// Optimal pair of sample sizes and what it buys.
///
/// Both branches of the optimizer produce this same record; `n_unlabeled`
/// is zero whenever `strategy` is [`Strategy::Classical`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Allocation {
    /// Number of gold-labeled samples (with predictions).
    pub n: u64,

    /// Number of additional unlabeled samples carrying only predictions.
    #[serde(rename = "N")]
    pub n_unlabeled: u64,

    /// Total spend of the allocation.
    pub cost: f64,

    /// Standard error of the estimator at this allocation.
    ///
    /// Infinite when `n` is zero; JSON writes that as `null`.
    #[serde(with = "infinite_as_null")]
    pub se: f64,

    /// Branch that produced this allocation.
    pub strategy: Strategy,
}

impl Allocation {
    /// Total number of samples that need a prediction (`n + N`).
    pub fn total_predictions(&self) -> u64 {
        self.n + self.n_unlabeled
    }

    /// Whether the allocation uses any unlabeled data.
    pub fn uses_unlabeled(&self) -> bool {
        self.n_unlabeled > 0
    }
}

mod infinite_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
