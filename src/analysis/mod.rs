//! Power analysis for prediction-powered inference.
//!
//! The analysis runs in two stages:
//!
//! 1. **Parameters** ([`power_analysis_params`]): classical variance σ² and PPI correlation ρ² from gradients
//! 2. **Pair optimization** ([`powerful_pair`], [`cheap_pair`]): the (n, N) allocation for a budget or a target standard error

mod pair;
mod params;

pub use pair::{
    cheap_pair, optimal_pair, optimize, powerful_pair, standard_error, CostComparison,
};
pub use params::{power_analysis_params, PowerParams, MIN_LABELED_SAMPLES};
