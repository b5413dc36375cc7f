//! Synthetic rotation-curve generation.
//!
//! Builds a demo galaxy from smooth baryonic baseline curves plus a known
//! halo, with seeded log-normal measurement noise. Everything is derived
//! deterministically from the configuration, so the same flags always
//! produce the same galaxy (and the same fit).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{DatasetStats, FitConfig, GalaxyData, GalaxyParams, HaloParams, RotationPoint, TracedCurve};
use crate::error::AppError;
use crate::models::{DEFAULT_MBH, DEFAULT_RC, DEFAULT_RHO0, G_KPC};

/// Radial extent of the synthetic galaxy (kpc).
const R_MIN: f64 = 0.4;
const R_MAX: f64 = 24.0;

/// Log-velocity noise scale and relative velocity error of the synthetic
/// observations.
const SIGMA_LN: f64 = 0.04;
const ERR_FRACTION: f64 = 0.04;
const ERR_FLOOR_KMS: f64 = 2.0;

/// Baseline component shapes (bulge mass/scale, disk/gas asymptotes).
const BULGE_MASS: f64 = 2.2e10;
const BULGE_SCALE_KPC: f64 = 1.0;
const DISK_VMAX: f64 = 140.0;
const DISK_SCALE_KPC: f64 = 3.0;
const GAS_VMAX: f64 = 35.0;
const GAS_SCALE_KPC: f64 = 8.0;

/// The parameters the synthetic observations are generated with.
///
/// Fitting the synthetic galaxy should recover these (prefactors near 1,
/// halo near the NGC 5533 defaults).
pub fn truth_params() -> GalaxyParams {
    GalaxyParams {
        mbh: DEFAULT_MBH,
        bpref: 1.0,
        dpref: 1.0,
        gpref: 1.0,
        halo: Some(HaloParams {
            rc: DEFAULT_RC,
            rho0: DEFAULT_RHO0,
        }),
    }
}

/// Generate the synthetic demo galaxy for a configuration.
pub fn generate_sample(config: &FitConfig) -> Result<GalaxyData, AppError> {
    if config.sample_count < 8 {
        return Err(AppError::config("Sample count must be >= 8."));
    }

    let mut rng = StdRng::seed_from_u64(sample_seed(config));
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::runtime(format!("Noise distribution error: {e}")))?;

    // Sorted random radii, nudged apart so spline knots stay strictly
    // increasing.
    let mut radii: Vec<f64> = (0..config.sample_count)
        .map(|_| rng.gen_range(R_MIN..=R_MAX))
        .collect();
    radii.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    for i in 1..radii.len() {
        if radii[i] <= radii[i - 1] {
            radii[i] = radii[i - 1] + 1e-6;
        }
    }

    let bulge: Vec<f64> = radii.iter().map(|&r| bulge_baseline(r)).collect();
    let disk: Vec<f64> = radii.iter().map(|&r| disk_baseline(r)).collect();
    let gas: Vec<f64> = radii.iter().map(|&r| gas_baseline(r)).collect();

    let truth = truth_params();
    let halo = truth.halo.unwrap_or(HaloParams {
        rc: DEFAULT_RC,
        rho0: DEFAULT_RHO0,
    });

    let mut points = Vec::with_capacity(config.sample_count);
    for (i, &r) in radii.iter().enumerate() {
        let v2 = G_KPC * truth.mbh / r
            + bulge[i] * bulge[i]
            + disk[i] * disk[i]
            + gas[i] * gas[i]
            + 4.0 * std::f64::consts::PI
                * G_KPC
                * halo.rho0
                * halo.rc
                * halo.rc
                * crate::math::halo_shape(r, halo.rc);
        let v_true = v2.sqrt();

        // Multiplicative log-normal noise, mean-corrected so the observed
        // curve is unbiased around the truth.
        let z: f64 = normal.sample(&mut rng);
        let v_obs = v_true * (SIGMA_LN * z - 0.5 * SIGMA_LN * SIGMA_LN).exp();
        let v_err = (ERR_FRACTION * v_obs).max(ERR_FLOOR_KMS);

        points.push(RotationPoint {
            radius: r,
            v_obs,
            v_err,
            weight: 1.0 / (v_err * v_err),
        });
    }

    let stats = DatasetStats::from_points(&points)
        .ok_or_else(|| AppError::runtime("Failed to compute sample stats."))?;

    Ok(GalaxyData {
        name: "SYNTHETIC".to_string(),
        distance_mpc: 20.0,
        points,
        bulge: TracedCurve {
            radii: radii.clone(),
            velocities: bulge,
        },
        disk: TracedCurve {
            radii: radii.clone(),
            velocities: disk,
        },
        gas: TracedCurve {
            radii,
            velocities: gas,
        },
        stats,
    })
}

/// Plummer-sphere bulge: `v^2 = G M r^2 / (r^2 + a^2)^(3/2)`.
fn bulge_baseline(r: f64) -> f64 {
    let a2 = BULGE_SCALE_KPC * BULGE_SCALE_KPC;
    (G_KPC * BULGE_MASS * r * r / (r * r + a2).powf(1.5)).sqrt()
}

/// Saturating disk curve: rises on the scale length, flattens outward.
fn disk_baseline(r: f64) -> f64 {
    DISK_VMAX * (1.0 - (-r / DISK_SCALE_KPC).exp())
}

fn gas_baseline(r: f64) -> f64 {
    GAS_VMAX * (1.0 - (-r / GAS_SCALE_KPC).exp())
}

fn sample_seed(config: &FitConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.sample_count.hash(&mut hasher);
    config.sample_seed.hash(&mut hasher);
    R_MIN.to_bits().hash(&mut hasher);
    R_MAX.to_bits().hash(&mut hasher);
    SIGMA_LN.to_bits().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GalaxySource, ModelSpec};

    fn config(count: usize, seed: u64) -> FitConfig {
        FitConfig {
            source: GalaxySource::Synthetic,
            fit_black_hole: true,
            model_spec: ModelSpec::Auto,
            rc_min: 0.1,
            rc_max: 20.0,
            rc_steps: 60,
            sample_count: count,
            sample_seed: seed,
            top_n: 10,
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_results: None,
            export_curve: None,
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate_sample(&config(40, 7)).unwrap();
        let b = generate_sample(&config(40, 7)).unwrap();
        assert_eq!(a.points.len(), b.points.len());
        for (pa, pb) in a.points.iter().zip(b.points.iter()) {
            assert_eq!(pa.radius, pb.radius);
            assert_eq!(pa.v_obs, pb.v_obs);
            assert_eq!(pa.v_err, pb.v_err);
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate_sample(&config(40, 7)).unwrap();
        let b = generate_sample(&config(40, 8)).unwrap();
        assert!(a
            .points
            .iter()
            .zip(b.points.iter())
            .any(|(pa, pb)| pa.v_obs != pb.v_obs));
    }

    #[test]
    fn observations_are_valid_for_fitting() {
        let g = generate_sample(&config(50, 1)).unwrap();
        assert_eq!(g.points.len(), 50);
        let radii = g.radii();
        assert!(radii.windows(2).all(|w| w[1] > w[0]));
        for p in &g.points {
            assert!(p.v_obs.is_finite() && p.v_obs > 0.0);
            assert!(p.v_err.is_finite() && p.v_err >= ERR_FLOOR_KMS);
        }
        assert!(g.bulge.is_present());
        assert!(g.disk.is_present());
        assert!(g.gas.is_present());
    }

    #[test]
    fn tiny_sample_count_is_config_error() {
        let err = generate_sample(&config(4, 1)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
