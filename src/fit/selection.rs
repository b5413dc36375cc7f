//! Model selection (baryons only vs baryons + halo) using BIC with guardrails.
//!
//! The educational question a rotation curve answers is whether visible
//! matter alone explains the data. We fit each enabled model and compute:
//! - chi-squared / reduced chi-squared / RMSE
//! - BIC = n * ln(chi2/n) + k * ln(n)
//!
//! Selection rules:
//! 1. Exclude underdetermined models: require `n >= k + 3`
//! 2. Choose the model with minimum BIC
//! 3. If dBIC < 2 between the best and a simpler model, pick the simpler model

use crate::domain::{
    FitConfig, FitQuality, FitResult, FreeParamSet, GalaxyData, GalaxyParams, ModelKind, ModelSpec,
    ParamErrors, RotationModel,
};
use crate::error::AppError;
use crate::fit::errors::gn_covariance;
use crate::fit::fitter::{fit_model, ModelFit};
use crate::fit::rc_grid::rc_grid;
use crate::models::GalaxyModel;

/// Minimum number of extra observations beyond parameter count.
const MIN_N_BUFFER: usize = 3;

/// Output of fitting + selection.
#[derive(Debug, Clone)]
pub struct FitSelection {
    pub best: FitResult,
    /// Fits for all attempted models (after guardrails).
    pub fits: Vec<FitResult>,
    /// Any models that were skipped and why (for diagnostics).
    pub skipped: Vec<(ModelKind, String)>,
}

/// Fit the enabled model kinds and select the best.
pub fn fit_and_select(
    model: &GalaxyModel,
    data: &GalaxyData,
    config: &FitConfig,
) -> Result<FitSelection, AppError> {
    let n = data.points.len();

    let base = FreeParamSet {
        mbh: config.fit_black_hole,
        bulge: data.bulge.is_present(),
        disk: data.disk.is_present(),
        halo: false,
    };

    let model_kinds: Vec<ModelKind> = match config.model_spec {
        ModelSpec::Baryons => vec![ModelKind::Baryons],
        ModelSpec::Halo => vec![ModelKind::BaryonsHalo],
        ModelSpec::Auto | ModelSpec::All => vec![ModelKind::Baryons, ModelKind::BaryonsHalo],
    };

    let grid = rc_grid(config.rc_min, config.rc_max, config.rc_steps)?;
    let fixed = GalaxyParams::baryonic();

    let mut fits = Vec::new();
    let mut skipped = Vec::new();

    for kind in model_kinds {
        let free = FreeParamSet {
            halo: kind == ModelKind::BaryonsHalo,
            ..base
        };
        let k = free.count();
        if n < k + MIN_N_BUFFER {
            skipped.push((
                kind,
                format!("Underdetermined: n={n} < k+{MIN_N_BUFFER}={}", k + MIN_N_BUFFER),
            ));
            continue;
        }

        let fit = fit_model(kind, model, &data.points, &free, &fixed, &grid)?;
        let errors = gn_covariance(model, &data.points, &fit.params, &free)
            .map(|c| c.standard_errors())
            .unwrap_or_default();
        fits.push(to_fit_result(fit, errors, n, k));
    }

    if fits.is_empty() {
        return Err(AppError::data(
            "Insufficient data to fit any model after guardrails.",
        ));
    }

    // If the user requested a single model, it's already the best.
    let best = if matches!(config.model_spec, ModelSpec::Baryons | ModelSpec::Halo) {
        fits[0].clone()
    } else {
        select_by_bic(&fits)
    };

    Ok(FitSelection {
        best,
        fits,
        skipped,
    })
}

fn to_fit_result(fit: ModelFit, errors: ParamErrors, n: usize, k: usize) -> FitResult {
    let chi2_red = (n > k).then(|| fit.chi2 / (n - k) as f64);

    FitResult {
        model: RotationModel {
            kind: fit.kind,
            display_name: fit.kind.display_name().to_string(),
            params: fit.params,
            errors,
        },
        quality: FitQuality {
            chi2: fit.chi2,
            chi2_red,
            rmse: fit.rmse,
            bic: bic(n, fit.chi2, k),
            n,
            k,
        },
    }
}

fn bic(n: usize, chi2: f64, k: usize) -> f64 {
    let n_f = n as f64;
    let per = (chi2 / n_f).max(1e-12);
    n_f * per.ln() + (k as f64) * n_f.ln()
}

fn select_by_bic(fits: &[FitResult]) -> FitResult {
    let mut best = &fits[0];
    for f in &fits[1..] {
        if f.quality.bic < best.quality.bic {
            best = f;
        }
    }

    let best_bic = best.quality.bic;

    // Prefer simplicity if within 2 BIC points.
    //
    // We iterate in order of increasing complexity and pick the first fit
    // that is "close enough" to the best.
    let order = [ModelKind::Baryons, ModelKind::BaryonsHalo];
    for kind in order {
        if let Some(f) = fits.iter().find(|f| f.model.kind == kind) {
            if f.quality.bic <= best_bic + 2.0 {
                return f.clone();
            }
        }
    }

    best.clone()
}

/// Fitted total velocities on a radius grid, for exports and plots.
pub fn fitted_grid(model: &GalaxyModel, params: &GalaxyParams, radii: &[f64]) -> Vec<f64> {
    radii
        .iter()
        .map(|&r| model.total_velocity_unchecked(r.max(0.0), params))
        .collect()
}
