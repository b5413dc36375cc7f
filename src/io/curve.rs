//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of a fitted rotation curve:
//! - model kind + parameters (with standard errors)
//! - galaxy metadata (name, distance)
//! - a precomputed total-velocity grid for quick plotting
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use crate::domain::{CurveFile, CurveGrid, FitResult, GalaxyData};
use crate::error::AppError;
use crate::fit::fitted_grid;
use crate::models::GalaxyModel;

/// Write a curve JSON file.
pub fn write_curve_json(
    path: &Path,
    best: &FitResult,
    model: &GalaxyModel,
    data: &GalaxyData,
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::config(format!(
            "Failed to create curve JSON '{}': {e}",
            path.display()
        ))
    })?;

    let radii = build_radius_grid(data.stats.r_min, data.stats.r_max, 101);
    let v_total = fitted_grid(model, &best.model.params, &radii);

    let curve = CurveFile {
        tool: "rot".to_string(),
        galaxy: data.name.clone(),
        distance_mpc: data.distance_mpc,
        model: best.model.clone(),
        fit_quality: best.quality.clone(),
        grid: CurveGrid {
            radius_kpc: radii,
            v_total,
        },
    };

    serde_json::to_writer_pretty(file, &curve)
        .map_err(|e| AppError::config(format!("Failed to write curve JSON: {e}")))?;

    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::config(format!(
            "Failed to open curve JSON '{}': {e}",
            path.display()
        ))
    })?;
    let curve: CurveFile = serde_json::from_reader(file)
        .map_err(|e| AppError::config(format!("Invalid curve JSON: {e}")))?;
    Ok(curve)
}

fn build_radius_grid(r_min: f64, r_max: f64, n: usize) -> Vec<f64> {
    let n = n.max(2);
    let mut t0 = r_min;
    let mut t1 = r_max;
    if !(t0.is_finite() && t1.is_finite()) || t1 <= t0 {
        t0 = 0.1;
        t1 = 25.0;
    }

    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            t0 + u * (t1 - t0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DatasetStats, FitQuality, GalaxyParams, HaloParams, ModelKind, ParamErrors, RotationModel,
        RotationPoint, TracedCurve,
    };

    fn demo() -> (GalaxyData, GalaxyModel, FitResult) {
        let radii: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let disk: Vec<f64> = radii.iter().map(|&r| 120.0 * (1.0 - (-r / 3.0).exp())).collect();
        let data = GalaxyData {
            name: "CURVE".to_string(),
            distance_mpc: 12.0,
            points: radii
                .iter()
                .map(|&r| RotationPoint {
                    radius: r,
                    v_obs: 100.0,
                    v_err: 5.0,
                    weight: 0.04,
                })
                .collect(),
            bulge: TracedCurve::default(),
            disk: TracedCurve {
                radii: radii.clone(),
                velocities: disk,
            },
            gas: TracedCurve::default(),
            stats: DatasetStats {
                n_points: 10,
                r_min: 1.0,
                r_max: 10.0,
                v_min: 100.0,
                v_max: 100.0,
            },
        };
        let model = GalaxyModel::new(&data).unwrap();
        let fit = FitResult {
            model: RotationModel {
                kind: ModelKind::BaryonsHalo,
                display_name: ModelKind::BaryonsHalo.display_name().to_string(),
                params: GalaxyParams {
                    mbh: 0.0,
                    bpref: 1.0,
                    dpref: 1.0,
                    gpref: 1.0,
                    halo: Some(HaloParams {
                        rc: 1.4,
                        rho0: 3.1e8,
                    }),
                },
                errors: ParamErrors::default(),
            },
            quality: FitQuality {
                chi2: 12.0,
                chi2_red: Some(2.0),
                rmse: 4.0,
                bic: 30.0,
                n: 10,
                k: 4,
            },
        };
        (data, model, fit)
    }

    #[test]
    fn curve_json_round_trips() {
        let (data, model, fit) = demo();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.json");

        write_curve_json(&path, &fit, &model, &data).unwrap();
        let read = read_curve_json(&path).unwrap();

        assert_eq!(read.galaxy, "CURVE");
        assert_eq!(read.grid.radius_kpc.len(), 101);
        assert_eq!(read.grid.radius_kpc.len(), read.grid.v_total.len());
        assert_eq!(read.model.kind, ModelKind::BaryonsHalo);
        assert!((read.model.params.halo.unwrap().rc - 1.4).abs() < 1e-12);
        assert!(read.grid.v_total.iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn invalid_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = read_curve_json(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
