//! Weighted least squares solvers.
//!
//! At a fixed halo core radius the squared composite velocity is linear in
//! the remaining parameters, so the fitter repeatedly solves small problems
//! of the form:
//!
//! ```text
//! minimize Σ w_i (y_i - x_i^T θ)^2,   θ >= 0
//! ```
//!
//! Implementation choices:
//! - Rows are pre-scaled by `sqrt(w_i)` and we solve an ordinary
//!   least-squares problem via SVD. The parameter dimension is tiny
//!   (1-4 columns), so SVD cost is negligible.
//! - Non-negativity (masses and squared prefactors cannot go below zero) is
//!   enforced by deterministic column elimination: solve unconstrained, drop
//!   the most negative coordinate, re-solve. With so few columns this
//!   terminates in at most `p` rounds and needs no general NNLS machinery.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if the strict solve fails. Nearly
    // collinear columns show up when two traced component curves are close
    // to proportional over the measured radii.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(theta) = svd.solve(y, tol) {
            if theta.iter().all(|v| v.is_finite()) {
                return Some(theta);
            }
        }
    }

    None
}

/// Solve `min ||X θ - y||` subject to `θ >= 0`.
///
/// Coordinates eliminated by the active-set loop come back as exactly 0.
/// Returns `None` only if the unconstrained subproblems cannot be solved.
pub fn solve_nonnegative(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let p = x.ncols();
    let mut active: Vec<usize> = (0..p).collect();

    loop {
        if active.is_empty() {
            return Some(DVector::zeros(p));
        }

        let sub = x.select_columns(active.iter());
        let theta_sub = solve_least_squares(&sub, y)?;

        // Find the most negative coordinate (beyond numerical noise).
        let mut worst: Option<(usize, f64)> = None;
        for (slot, &v) in theta_sub.iter().enumerate() {
            if v < -1e-12 && worst.map(|(_, w)| v < w).unwrap_or(true) {
                worst = Some((slot, v));
            }
        }

        match worst {
            Some((slot, _)) => {
                active.remove(slot);
            }
            None => {
                let mut theta = DVector::zeros(p);
                for (slot, &col) in active.iter().enumerate() {
                    theta[col] = theta_sub[slot].max(0.0);
                }
                return Some(theta);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let theta = solve_least_squares(&x, &y).unwrap();
        assert!((theta[0] - 2.0).abs() < 1e-10);
        assert!((theta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn nonnegative_matches_unconstrained_when_feasible() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let theta = solve_nonnegative(&x, &y).unwrap();
        assert!((theta[0] - 2.0).abs() < 1e-10);
        assert!((theta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn nonnegative_zeroes_negative_coordinate() {
        // y decreases in the second column; unconstrained solution would give
        // it a negative coefficient.
        let x = DMatrix::from_row_slice(4, 2, &[
            1.0, 0.0, //
            1.0, 1.0, //
            1.0, 2.0, //
            1.0, 3.0,
        ]);
        let y = DVector::from_row_slice(&[5.0, 4.0, 3.0, 2.0]);

        let theta = solve_nonnegative(&x, &y).unwrap();
        assert_eq!(theta[1], 0.0);
        assert!(theta[0] > 0.0);
    }
}
