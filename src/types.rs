//! Type aliases and common types.

use nalgebra::{DMatrix, DVector};

/// Per-sample gradients: one row per sample, one column per estimand coordinate.
pub type GradientMatrix = DMatrix<f64>;

/// Square `d x d` matrix (covariances, inverse Hessian).
pub type SquareMatrix = DMatrix<f64>;

/// One value per estimand coordinate.
pub type CoordVector = DVector<f64>;

/// Sample weights, one per row of the matching measurement column.
pub type WeightVector = DVector<f64>;
