//! Debug bundle writer for inspecting a fit and its chi-squared profile.
//!
//! Written from the TUI on demand (`d`); the bundle is a markdown file with
//! the dataset summary, the per-model diagnostics, and the chi-squared
//! profile along the halo core-radius grid (useful for spotting flat or
//! multi-modal profiles).

use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use crate::app::pipeline::RunOutput;
use crate::domain::{FitConfig, FreeParamSet, GalaxyParams, ModelKind};
use crate::error::AppError;
use crate::fit::fitter::fit_model;
use crate::fit::rc_grid::rc_grid;

/// Number of rc samples in the chi-squared profile table.
const PROFILE_STEPS: usize = 15;

pub fn write_debug_bundle(
    run: &RunOutput,
    config: &FitConfig,
    current_params: &GalaxyParams,
) -> Result<PathBuf, AppError> {
    let dir = PathBuf::from("debug");
    create_dir_all(&dir)
        .map_err(|e| AppError::runtime(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("rot_debug_{}_{ts}.md", run.data.name));

    let mut out = String::new();
    out.push_str("# rot debug bundle\n");
    out.push_str(&format!("- generated: {}\n", Local::now().to_rfc3339()));
    out.push_str(&format!("- galaxy: {}\n", run.data.name));
    out.push_str(&format!("- distance_mpc: {:.2}\n", run.data.distance_mpc));
    out.push_str(&format!(
        "- points: n={} | r=[{:.3}, {:.3}] kpc | v=[{:.1}, {:.1}] km/s\n",
        run.data.stats.n_points,
        run.data.stats.r_min,
        run.data.stats.r_max,
        run.data.stats.v_min,
        run.data.stats.v_max
    ));
    out.push_str(&format!(
        "- rc grid: [{:.2}, {:.2}] x {} | fit_black_hole: {}\n",
        config.rc_min, config.rc_max, config.rc_steps, config.fit_black_hole
    ));

    out.push_str("\n## Model diagnostics\n");
    out.push_str("| model | chi2 | chi2_red | rmse | bic |\n");
    out.push_str("| - | - | - | - | - |\n");
    for fit in &run.selection.fits {
        let chi2_red = fit
            .quality
            .chi2_red
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!(
            "| {} | {:.4} | {chi2_red} | {:.3} | {:.3} |\n",
            fit.model.display_name, fit.quality.chi2, fit.quality.rmse, fit.quality.bic
        ));
    }
    for (kind, reason) in &run.selection.skipped {
        out.push_str(&format!("- skipped {}: {reason}\n", kind.display_name()));
    }

    out.push_str("\n## Chosen model\n");
    out.push_str(&crate::report::format_parameters(&run.selection.best));

    out.push_str("\n## Current slider values\n");
    out.push_str(&format!("- Mbh: {:.4e} Msun\n", current_params.mbh));
    out.push_str(&format!("- bpref: {:.3}\n", current_params.bpref));
    out.push_str(&format!("- dpref: {:.3}\n", current_params.dpref));
    out.push_str(&format!("- gpref: {:.3}\n", current_params.gpref));
    if let Some(halo) = current_params.halo {
        out.push_str(&format!(
            "- halo: rc={:.3} kpc, rho0={:.4e} Msun/kpc^3\n",
            halo.rc, halo.rho0
        ));
    }
    if let Ok(chi2) =
        crate::fit::chi_squared(&run.model, &run.data.points, current_params)
    {
        out.push_str(&format!("- chi2: {chi2:.4}\n"));
    }

    out.push_str("\n## chi2 profile over rc\n");
    out.push_str(&chi2_profile(run, config));

    let mut file = File::create(&path)
        .map_err(|e| AppError::runtime(format!("Failed to create debug file: {e}")))?;
    file.write_all(out.as_bytes())
        .map_err(|e| AppError::runtime(format!("Failed to write debug file: {e}")))?;

    Ok(path)
}

/// Best linear-subproblem chi2 at each sampled rc (holding the grid fixed to
/// a single candidate per row).
fn chi2_profile(run: &RunOutput, config: &FitConfig) -> String {
    let mut out = String::new();
    out.push_str("| rc (kpc) | chi2 | rho0 |\n");
    out.push_str("| - | - | - |\n");

    let Ok(grid) = rc_grid(config.rc_min, config.rc_max, PROFILE_STEPS) else {
        return "rc grid invalid\n".to_string();
    };

    let free = FreeParamSet {
        mbh: config.fit_black_hole,
        bulge: run.data.bulge.is_present(),
        disk: run.data.disk.is_present(),
        halo: true,
    };
    let fixed = GalaxyParams::baryonic();

    for rc in grid {
        match fit_model(
            ModelKind::BaryonsHalo,
            &run.model,
            &run.data.points,
            &free,
            &fixed,
            &[rc],
        ) {
            Ok(fit) => {
                let rho0 = fit.params.halo.map(|h| h.rho0).unwrap_or(0.0);
                out.push_str(&format!("| {rc:.3} | {:.4} | {rho0:.4e} |\n", fit.chi2));
            }
            Err(_) => {
                out.push_str(&format!("| {rc:.3} | failed | - |\n"));
            }
        }
    }

    out
}
