//! Halo core-radius grid generation.
//!
//! The composite velocity is nonlinear only in the halo core radius `rc`;
//! we search it on a deterministic log-spaced grid.
//!
//! Why grid search?
//! - It avoids the local minima and starting-point sensitivity of general
//!   nonlinear optimizers on this one-dimensional profile.
//! - It is deterministic given the same inputs/flags.
//! - With a single nonlinear parameter, a modest grid is fast enough for
//!   interactive refits.

use crate::error::AppError;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(AppError::config(format!(
            "Invalid rc range: min={min}, max={max} (must be finite, >0, and max>min)."
        )));
    }
    if steps < 2 {
        return Err(AppError::config("rc steps must be >= 2."));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push((ln_min + step * i as f64).exp());
    }
    Ok(out)
}

/// Core-radius candidate grid for the halo search.
pub fn rc_grid(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    log_space(min, max, steps)
}
