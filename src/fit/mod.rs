//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - generate the halo core-radius grid
//! - evaluate each candidate core radius (parallel)
//! - estimate parameter uncertainties from the Gauss-Newton covariance
//! - select the best model (baryons vs baryons+halo) using BIC + guardrails

pub mod errors;
pub mod fitter;
pub mod rc_grid;
pub mod selection;

pub use errors::*;
pub use fitter::*;
pub use rc_grid::*;
pub use selection::*;
