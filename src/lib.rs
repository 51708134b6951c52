//! # ppi-power
//!
//! Sample-size planning for prediction-powered inference (PPI) of a mean.
//!
//! PPI combines a few expensive gold-standard labels with many cheap model
//! predictions. Given pilot data and per-unit costs, this crate answers:
//! - How many gold labels (n) and extra predictions (N) give the smallest
//!   standard error for a fixed budget?
//! - What is the cheapest (n, N) that reaches a target standard error?
//!
//! When predictions are not worth their cost, the answer falls back to
//! gold labels only.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ppi_power::MeanPower;
//!
//! let allocation = MeanPower::new(10.0, 1.0) // cost per gold label, per prediction
//!     .budget(10_000.0)
//!     .run(&y, &yhat, &yhat_unlabeled)?;
//!
//! println!("{}", ppi_power::output::format_allocation(&allocation));
//! ```
//!
//! Known σ² and ρ² (e.g. from an earlier study) can skip the pilot data:
//!
//! ```ignore
//! use ppi_power::{analysis::powerful_pair, Costs, PowerParams};
//!
//! let params = PowerParams::from_scalars(1.0, 0.64);
//! let allocation = powerful_pair(&params, &Costs::new(10.0, 1.0), 10_000.0)?[0];
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod error;
mod power;
mod result;
mod types;

// Functional modules
pub mod analysis;
pub mod estimator;
pub mod input;
pub mod output;
pub mod statistics;

// Re-exports for public API
pub use analysis::PowerParams;
pub use config::{Costs, Target};
pub use error::{PowerError, Result};
pub use estimator::{Lambda, PointEstimator, PpiMeanEstimator};
pub use power::{compute_mean_power, MeanPower};
pub use result::{Allocation, Strategy};
pub use types::{CoordVector, GradientMatrix, SquareMatrix, WeightVector};
