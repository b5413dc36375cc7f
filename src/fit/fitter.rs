//! Low-level fitting routine for a single model kind.
//!
//! Given:
//! - observations `(r_i, v_i, sigma_i)`
//! - the traced component curves for the galaxy
//! - a list of candidate halo core radii
//!
//! we exploit that the *squared* composite velocity is linear in
//! `(Mbh, bpref^2, dpref^2, rho0)` once `rc` is fixed:
//!
//! - for each `rc` candidate, solve a weighted non-negative least-squares
//!   problem in velocity-squared space
//! - score each candidate by the velocity-space weighted chi-squared
//!
//! and return the best (lowest chi-squared) candidate. Weights in squared
//! space follow from error propagation: `sigma_{v^2} = 2 v sigma_v`.
//!
//! This replaces a general nonlinear optimizer with a deterministic search:
//! identical inputs always produce identical parameters.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::{FreeParamSet, GalaxyParams, HaloParams, ModelKind, RotationPoint};
use crate::error::AppError;
use crate::math::solve_nonnegative;
use crate::models::{linear_columns, GalaxyModel};

/// Best fit for a single model kind.
#[derive(Debug, Clone)]
pub struct ModelFit {
    pub kind: ModelKind,
    pub params: GalaxyParams,
    /// Error-weighted sum of squared velocity residuals.
    pub chi2: f64,
    /// Unweighted RMS velocity residual (km/s).
    pub rmse: f64,
}

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    params: GalaxyParams,
    chi2: f64,
}

/// Fit a single model kind.
///
/// `fixed` supplies the non-fitted parameters (gas prefactor, and the
/// black-hole mass when it is not free). For `ModelKind::Baryons` the
/// `rc_grid` is ignored.
pub fn fit_model(
    kind: ModelKind,
    model: &GalaxyModel,
    points: &[RotationPoint],
    free: &FreeParamSet,
    fixed: &GalaxyParams,
    rc_grid: &[f64],
) -> Result<ModelFit, AppError> {
    if points.is_empty() {
        return Err(AppError::data("No data points to fit."));
    }
    for p in points {
        if !(p.radius.is_finite() && p.radius >= 0.0) {
            return Err(AppError::data("Non-finite or negative radius in fit input."));
        }
        if !(p.v_obs.is_finite() && p.v_obs > 0.0) {
            return Err(AppError::data("Non-positive observed velocity in fit input."));
        }
        if !(p.v_err.is_finite() && p.v_err > 0.0) {
            return Err(AppError::data("Non-positive velocity error in fit input."));
        }
    }

    // The baryons-only model has no nonlinear parameter; evaluate a single
    // candidate with the halo column disabled.
    let rc_candidates: &[f64] = match kind {
        ModelKind::Baryons => &[0.0],
        ModelKind::BaryonsHalo => {
            if rc_grid.is_empty() {
                return Err(AppError::config("rc grid is empty."));
            }
            rc_grid
        }
    };

    let free = match kind {
        ModelKind::Baryons => FreeParamSet {
            halo: false,
            ..*free
        },
        ModelKind::BaryonsHalo => FreeParamSet {
            halo: true,
            ..*free
        },
    };

    // Evaluate each candidate independently (parallel).
    let candidates: Vec<Candidate> = rc_candidates
        .par_iter()
        .enumerate()
        .filter_map(|(idx, &rc)| {
            evaluate_candidate(model, points, &free, fixed, rc).map(|(params, chi2)| Candidate {
                idx,
                params,
                chi2,
            })
        })
        .collect();

    if candidates.is_empty() {
        return Err(AppError::runtime(format!(
            "Fit did not converge for model {}: no valid candidates.",
            kind.display_name()
        )));
    }

    // Deterministic selection: minimum chi2; break ties by grid index.
    let mut best = &candidates[0];
    for c in &candidates[1..] {
        if c.chi2 < best.chi2 || (c.chi2 == best.chi2 && c.idx < best.idx) {
            best = c;
        }
    }

    let rmse = unweighted_rmse(model, points, &best.params);
    Ok(ModelFit {
        kind,
        params: best.params,
        chi2: best.chi2,
        rmse,
    })
}

/// Velocity-space weighted chi-squared of a parameter set against the data.
pub fn chi_squared(
    model: &GalaxyModel,
    points: &[RotationPoint],
    params: &GalaxyParams,
) -> Result<f64, AppError> {
    let mut chi2 = 0.0;
    for p in points {
        let v_fit = model.total_velocity(p.radius, params)?;
        if !v_fit.is_finite() {
            return Err(AppError::runtime(
                "Non-finite model velocity during chi-squared evaluation.",
            ));
        }
        let z = (p.v_obs - v_fit) / p.v_err;
        chi2 += z * z;
    }
    Ok(chi2)
}

fn evaluate_candidate(
    model: &GalaxyModel,
    points: &[RotationPoint],
    free: &FreeParamSet,
    fixed: &GalaxyParams,
    rc: f64,
) -> Option<(GalaxyParams, f64)> {
    let n = points.len();
    let p = linear_columns(free);

    let params = if p == 0 {
        // Nothing to solve; the candidate is the fixed parameter set.
        assemble_params(free, fixed, rc, &[])
    } else {
        let mut xw = DMatrix::<f64>::zeros(n, p);
        let mut yw = DVector::<f64>::zeros(n);
        let mut row = vec![0.0; p];

        for (i, pt) in points.iter().enumerate() {
            let offset = model.fill_design_row(pt.radius, rc, free, fixed, &mut row);

            // Error propagation into squared space: sigma_{v^2} = 2 v sigma_v.
            let sigma2 = 2.0 * pt.v_obs * pt.v_err;
            if !(sigma2.is_finite() && sigma2 > 0.0) {
                return None;
            }
            let sw = 1.0 / sigma2;

            for j in 0..p {
                if !row[j].is_finite() {
                    return None;
                }
                xw[(i, j)] = row[j] * sw;
            }
            yw[i] = (pt.v_obs * pt.v_obs - offset) * sw;
        }

        let theta = solve_nonnegative(&xw, &yw)?;
        assemble_params(free, fixed, rc, theta.as_slice())
    };

    let mut chi2 = 0.0;
    for pt in points {
        let v_fit = model.total_velocity_unchecked(pt.radius, &params);
        if !v_fit.is_finite() {
            return None;
        }
        let z = (pt.v_obs - v_fit) / pt.v_err;
        chi2 += z * z;
    }

    chi2.is_finite().then_some((params, chi2))
}

/// Map a solved coefficient vector `[Mbh, bpref^2, dpref^2, rho0]` (restricted
/// to the free columns) back to the natural parameterization.
fn assemble_params(free: &FreeParamSet, fixed: &GalaxyParams, rc: f64, theta: &[f64]) -> GalaxyParams {
    let mut it = theta.iter().copied();

    let mbh = if free.mbh {
        it.next().unwrap_or(0.0)
    } else {
        fixed.mbh
    };
    let bpref = if free.bulge {
        it.next().unwrap_or(0.0).max(0.0).sqrt()
    } else {
        fixed.bpref
    };
    let dpref = if free.disk {
        it.next().unwrap_or(0.0).max(0.0).sqrt()
    } else {
        fixed.dpref
    };
    let halo = if free.halo {
        let rho0 = it.next().unwrap_or(0.0).max(0.0);
        Some(HaloParams { rc, rho0 })
    } else {
        fixed.halo
    };

    GalaxyParams {
        mbh,
        bpref,
        dpref,
        gpref: fixed.gpref,
        halo,
    }
}

fn unweighted_rmse(model: &GalaxyModel, points: &[RotationPoint], params: &GalaxyParams) -> f64 {
    let n = points.len().max(1);
    let sse: f64 = points
        .iter()
        .map(|p| {
            let v_fit = model.total_velocity_unchecked(p.radius, params);
            let r = p.v_obs - v_fit;
            r * r
        })
        .sum();
    (sse / n as f64).sqrt()
}
