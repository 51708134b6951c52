//! Statistical building blocks for power analysis.
//!
//! - Column centering and population cross-covariance of paired gradients
//! - Pooled sample covariance via mergeable Welford accumulators

mod covariance;

pub use covariance::{
    center_columns, column_means, cross_covariance, pooled_covariance, sandwich_diagonal,
    WelfordCovariance,
};
