//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{FitConfig, FitResult, GalaxyData};
use crate::fit::selection::FitSelection;
use crate::io::ingest::RowError;
use crate::report::Outliers;

/// Format the full run summary (dataset stats + fit diagnostics + chosen model).
pub fn format_run_summary(
    data: &GalaxyData,
    row_errors: &[RowError],
    selection: &FitSelection,
    config: &FitConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== rot - Galaxy Rotation Curve Fit ===\n");
    out.push_str(&format!("Galaxy: {}\n", data.name));
    out.push_str(&format!("Distance: {:.1} Mpc\n", data.distance_mpc));
    out.push_str(&format!(
        "Points: n={} | r=[{:.3}, {:.3}] kpc | v=[{:.1}, {:.1}] km/s\n",
        data.stats.n_points,
        data.stats.r_min,
        data.stats.r_max,
        data.stats.v_min,
        data.stats.v_max
    ));

    for warning in component_warnings(data) {
        out.push_str(&format!("Note: {warning}\n"));
    }
    if !row_errors.is_empty() {
        out.push_str(&format!(
            "Note: {} malformed row(s) were skipped (first: line {}: {}).\n",
            row_errors.len(),
            row_errors[0].line,
            row_errors[0].message
        ));
    }

    out.push_str("\nModel diagnostics:\n");
    for fit in &selection.fits {
        let chosen = if fit.model.kind == selection.best.model.kind {
            "*"
        } else {
            " "
        };
        let chi2_red = fit
            .quality
            .chi2_red
            .map(|v| format!("{v:.3}"))
            .unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!(
            "{chosen} {:<16} chi2={:.3} chi2_red={chi2_red} RMSE={:.2}km/s BIC={:.3}\n",
            fit.model.display_name, fit.quality.chi2, fit.quality.rmse, fit.quality.bic
        ));
    }
    for (kind, reason) in &selection.skipped {
        out.push_str(&format!("  (skipped {}) {reason}\n", kind.display_name()));
    }

    out.push_str("\nChosen model:\n");
    out.push_str(&format_parameters(&selection.best));

    let _ = config;
    out
}

/// Per-component availability warnings, matching the upstream widget text.
pub fn component_warnings(data: &GalaxyData) -> Vec<String> {
    let mut warnings = Vec::new();
    if !data.bulge.is_present() {
        warnings.push("There is no bulge component.".to_string());
    }
    if !data.disk.is_present() {
        warnings.push("There is no disk component.".to_string());
    }
    if !data.gas.is_present() {
        warnings.push("There is no gas component.".to_string());
    }
    warnings
}

/// Format the best-fit parameter table (value ± stderr).
pub fn format_parameters(fit: &FitResult) -> String {
    let mut out = String::new();
    let params = &fit.model.params;
    let errors = &fit.model.errors;

    out.push_str(&format!(
        "- {} (n={}, k={})\n",
        fit.model.display_name, fit.quality.n, fit.quality.k
    ));

    if params.mbh > 0.0 || errors.mbh.is_some() {
        out.push_str(&param_line("Mbh [Msun]", params.mbh, errors.mbh, false));
    }
    out.push_str(&param_line(
        "bulge prefactor",
        params.bpref,
        errors.bpref,
        errors.bpref.is_none(),
    ));
    out.push_str(&param_line(
        "disk prefactor",
        params.dpref,
        errors.dpref,
        errors.dpref.is_none(),
    ));
    out.push_str(&param_line("gas prefactor", params.gpref, None, true));
    if let Some(halo) = params.halo {
        out.push_str(&param_line("rc [kpc]", halo.rc, errors.rc, false));
        out.push_str(&param_line("rho0 [Msun/kpc^3]", halo.rho0, errors.rho0, false));
    }

    let chi2_red = fit
        .quality
        .chi2_red
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "n/a (too few points)".to_string());
    out.push_str(&format!(
        "- chi2 = {:.4} | reduced chi2 = {chi2_red}\n",
        fit.quality.chi2
    ));

    out
}

fn param_line(label: &str, value: f64, stderr: Option<f64>, fixed: bool) -> String {
    let value_str = fmt_value(value);
    match stderr {
        Some(e) => format!("  {label:<20} {value_str:>12} +/- {}\n", fmt_value(e)),
        None if fixed => format!("  {label:<20} {value_str:>12} (fixed)\n"),
        None => format!("  {label:<20} {value_str:>12}\n"),
    }
}

fn fmt_value(v: f64) -> String {
    if v == 0.0 {
        "0".to_string()
    } else if v.abs() >= 1e5 || v.abs() < 1e-3 {
        format!("{v:.3e}")
    } else {
        format!("{v:.3}")
    }
}

/// Format the outlier tables.
pub fn format_outliers(outliers: &Outliers) -> String {
    let mut out = String::new();

    out.push_str("Above the curve (positive residual):\n");
    out.push_str(&format_table(&outliers.above));
    out.push('\n');

    out.push_str("Below the curve (negative residual):\n");
    out.push_str(&format_table(&outliers.below));

    out
}

fn format_table(rows: &[crate::domain::PointResidual]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>10} {:>10} {:>10} {:>10} {:>10}\n",
        "r (kpc)", "v_obs", "v_err", "v_fit", "residual"
    ));
    out.push_str(&format!(
        "{:->10} {:->10} {:->10} {:->10} {:->10}\n",
        "", "", "", "", ""
    ));

    for r in rows {
        let p = &r.point;
        out.push_str(&format!(
            "{:>10.3} {:>10.2} {:>10.2} {:>10.2} {:>10.2}\n",
            p.radius, p.v_obs, p.v_err, r.v_fit, r.residual
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DatasetStats, FitQuality, GalaxyParams, HaloParams, ModelKind, ParamErrors, RotationModel,
        RotationPoint, TracedCurve,
    };

    fn demo_fit() -> FitResult {
        FitResult {
            model: RotationModel {
                kind: ModelKind::BaryonsHalo,
                display_name: ModelKind::BaryonsHalo.display_name().to_string(),
                params: GalaxyParams {
                    mbh: 0.0,
                    bpref: 1.02,
                    dpref: 0.88,
                    gpref: 1.0,
                    halo: Some(HaloParams {
                        rc: 1.4,
                        rho0: 3.1e8,
                    }),
                },
                errors: ParamErrors {
                    mbh: None,
                    bpref: Some(0.05),
                    dpref: Some(0.03),
                    rc: Some(0.2),
                    rho0: Some(2.0e7),
                },
            },
            quality: FitQuality {
                chi2: 21.5,
                chi2_red: Some(1.19),
                rmse: 3.4,
                bic: 44.0,
                n: 22,
                k: 4,
            },
        }
    }

    #[test]
    fn parameter_table_includes_errors_and_fixed_markers() {
        let text = format_parameters(&demo_fit());
        assert!(text.contains("bulge prefactor"));
        assert!(text.contains("+/-"));
        assert!(text.contains("(fixed)"));
        assert!(text.contains("rho0 [Msun/kpc^3]"));
        assert!(text.contains("reduced chi2 = 1.1900"));
    }

    #[test]
    fn summary_mentions_missing_components() {
        let data = GalaxyData {
            name: "X".to_string(),
            distance_mpc: 5.0,
            points: vec![RotationPoint {
                radius: 1.0,
                v_obs: 50.0,
                v_err: 2.0,
                weight: 0.25,
            }],
            bulge: TracedCurve::default(),
            disk: TracedCurve {
                radii: vec![1.0, 2.0],
                velocities: vec![40.0, 50.0],
            },
            gas: TracedCurve::default(),
            stats: DatasetStats {
                n_points: 1,
                r_min: 1.0,
                r_max: 1.0,
                v_min: 50.0,
                v_max: 50.0,
            },
        };
        let warnings = component_warnings(&data);
        assert!(warnings.iter().any(|w| w.contains("no bulge")));
        assert!(warnings.iter().any(|w| w.contains("no gas")));
        assert_eq!(warnings.len(), 2);
    }
}
