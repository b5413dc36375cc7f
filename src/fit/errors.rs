//! Parameter uncertainties from the Gauss-Newton covariance.
//!
//! At the best fit, the covariance of the parameters is approximated by
//! `(J^T W J)^-1 * chi2_red`, where `J` is the Jacobian of the composite
//! velocity with respect to the free parameters and `W = diag(1/sigma_i^2)`.
//! This is the same quantity general-purpose least-squares libraries report
//! as parameter standard errors.
//!
//! The Jacobian is computed by central finite differences in the natural
//! parameterization (Mbh, bpref, dpref, rc, rho0). The halo core radius is
//! treated as a continuous parameter here even though the search grids it.

use nalgebra::DMatrix;

use crate::domain::{FreeParamSet, GalaxyParams, HaloParams, ParamErrors, RotationPoint};
use crate::models::GalaxyModel;

/// Covariance of the free parameters at a fitted point.
#[derive(Debug, Clone)]
pub struct GnCovariance {
    free: FreeParamSet,
    params: GalaxyParams,
    cov: DMatrix<f64>,
}

/// Estimate the Gauss-Newton covariance at `params`.
///
/// Returns `None` when there are no free parameters, too few observations
/// (`n <= k`), or the normal matrix cannot be inverted.
pub fn gn_covariance(
    model: &GalaxyModel,
    points: &[RotationPoint],
    params: &GalaxyParams,
    free: &FreeParamSet,
) -> Option<GnCovariance> {
    let k = free.count();
    let n = points.len();
    if k == 0 || n <= k {
        return None;
    }

    let chi2 = crate::fit::chi_squared(model, points, params).ok()?;
    let s2 = chi2 / (n - k) as f64;

    let p0 = pack(params, free);
    let steps = fd_steps(&p0, free);

    // Jacobian rows pre-scaled by 1/sigma_i, so J^T J is already J^T W J.
    let mut jw = DMatrix::<f64>::zeros(n, k);
    for j in 0..k {
        let mut hi = p0.clone();
        let mut lo = p0.clone();
        hi[j] += steps[j];
        lo[j] -= steps[j];
        let params_hi = unpack(params, free, &hi);
        let params_lo = unpack(params, free, &lo);

        for (i, pt) in points.iter().enumerate() {
            let v_hi = model.total_velocity(pt.radius, &params_hi).ok()?;
            let v_lo = model.total_velocity(pt.radius, &params_lo).ok()?;
            let dv = (v_hi - v_lo) / (2.0 * steps[j]);
            if !dv.is_finite() {
                return None;
            }
            jw[(i, j)] = dv / pt.v_err;
        }
    }

    let normal = jw.transpose() * &jw;
    let cov = normal.pseudo_inverse(1e-12).ok()? * s2;
    if cov.iter().any(|v| !v.is_finite()) {
        return None;
    }

    Some(GnCovariance {
        free: *free,
        params: *params,
        cov,
    })
}

impl GnCovariance {
    /// One-sigma standard errors in the natural parameterization.
    pub fn standard_errors(&self) -> ParamErrors {
        let mut out = ParamErrors::default();
        let mut idx = 0;
        let mut take = || {
            let v = self.cov[(idx, idx)];
            idx += 1;
            (v.is_finite() && v >= 0.0).then(|| v.sqrt())
        };

        if self.free.mbh {
            out.mbh = take();
        }
        if self.free.bulge {
            out.bpref = take();
        }
        if self.free.disk {
            out.dpref = take();
        }
        if self.free.halo {
            out.rc = take();
            out.rho0 = take();
        }
        out
    }

    /// One-sigma uncertainty of the total velocity at radius `r`, propagated
    /// through the parameter covariance (`sqrt(g^T C g)` with `g = dv/dp`).
    ///
    /// This is what the confidence band around the total curve draws.
    pub fn band_sigma(&self, model: &GalaxyModel, r: f64) -> Option<f64> {
        let k = self.free.count();
        let p0 = pack(&self.params, &self.free);
        let steps = fd_steps(&p0, &self.free);

        let mut g = vec![0.0; k];
        for j in 0..k {
            let mut hi = p0.clone();
            let mut lo = p0.clone();
            hi[j] += steps[j];
            lo[j] -= steps[j];
            let v_hi = model
                .total_velocity(r, &unpack(&self.params, &self.free, &hi))
                .ok()?;
            let v_lo = model
                .total_velocity(r, &unpack(&self.params, &self.free, &lo))
                .ok()?;
            g[j] = (v_hi - v_lo) / (2.0 * steps[j]);
        }

        let mut var = 0.0;
        for a in 0..k {
            for b in 0..k {
                var += g[a] * self.cov[(a, b)] * g[b];
            }
        }
        (var.is_finite() && var >= 0.0).then(|| var.sqrt())
    }
}

/// Pack the free parameters into a vector: `[mbh, bpref, dpref, rc, rho0]`
/// restricted to the free set.
fn pack(params: &GalaxyParams, free: &FreeParamSet) -> Vec<f64> {
    let mut v = Vec::with_capacity(free.count());
    if free.mbh {
        v.push(params.mbh);
    }
    if free.bulge {
        v.push(params.bpref);
    }
    if free.disk {
        v.push(params.dpref);
    }
    if free.halo {
        let h = params.halo.unwrap_or(HaloParams { rc: 0.0, rho0: 0.0 });
        v.push(h.rc);
        v.push(h.rho0);
    }
    v
}

fn unpack(base: &GalaxyParams, free: &FreeParamSet, v: &[f64]) -> GalaxyParams {
    let mut out = *base;
    let mut it = v.iter().copied();
    if free.mbh {
        out.mbh = it.next().unwrap_or(base.mbh).max(0.0);
    }
    if free.bulge {
        out.bpref = it.next().unwrap_or(base.bpref).max(0.0);
    }
    if free.disk {
        out.dpref = it.next().unwrap_or(base.dpref).max(0.0);
    }
    if free.halo {
        let rc = it.next().unwrap_or(0.0).max(1e-6);
        let rho0 = it.next().unwrap_or(0.0).max(0.0);
        out.halo = Some(HaloParams { rc, rho0 });
    }
    out
}

/// Central-difference step sizes: relative with per-parameter floors (the
/// parameter magnitudes span ~10 orders between prefactors and densities).
fn fd_steps(p0: &[f64], free: &FreeParamSet) -> Vec<f64> {
    let mut floors = Vec::with_capacity(p0.len());
    if free.mbh {
        floors.push(1.0);
    }
    if free.bulge {
        floors.push(1e-6);
    }
    if free.disk {
        floors.push(1e-6);
    }
    if free.halo {
        floors.push(1e-6);
        floors.push(1.0);
    }

    p0.iter()
        .zip(floors)
        .map(|(&v, floor)| (v.abs() * 1e-4).max(floor))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetStats, GalaxyData, TracedCurve};
    use crate::models::GalaxyModel;

    fn galaxy_with_noise() -> (GalaxyData, GalaxyModel, GalaxyParams) {
        let radii: Vec<f64> = (1..=25).map(|i| i as f64).collect();
        let disk: Vec<f64> = radii.iter().map(|&r| 150.0 * (1.0 - (-r / 3.0).exp())).collect();
        let gas: Vec<f64> = radii.iter().map(|&r| 30.0 * (1.0 - (-r / 8.0).exp())).collect();

        let data = GalaxyData {
            name: "ERR".to_string(),
            distance_mpc: 10.0,
            points: Vec::new(),
            bulge: TracedCurve::default(),
            disk: TracedCurve {
                radii: radii.clone(),
                velocities: disk,
            },
            gas: TracedCurve {
                radii: radii.clone(),
                velocities: gas,
            },
            stats: DatasetStats {
                n_points: 0,
                r_min: 1.0,
                r_max: 25.0,
                v_min: 0.0,
                v_max: 0.0,
            },
        };
        let model = GalaxyModel::new(&data).unwrap();

        let params = GalaxyParams {
            mbh: 0.0,
            bpref: 1.0,
            dpref: 1.05,
            gpref: 1.0,
            halo: Some(HaloParams {
                rc: 1.4,
                rho0: 3.1e8,
            }),
        };

        // Deterministic "noise": alternate +/- one sigma around the model.
        let points: Vec<RotationPoint> = radii
            .iter()
            .enumerate()
            .map(|(i, &r)| {
                let v = model.total_velocity(r, &params).unwrap();
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                RotationPoint {
                    radius: r,
                    v_obs: v + sign * 4.0,
                    v_err: 4.0,
                    weight: 1.0 / 16.0,
                }
            })
            .collect();

        (GalaxyData { points, ..data }, model, params)
    }

    #[test]
    fn covariance_yields_finite_positive_errors() {
        let (data, model, params) = galaxy_with_noise();
        let free = FreeParamSet {
            mbh: false,
            bulge: false,
            disk: true,
            halo: true,
        };

        let cov = gn_covariance(&model, &data.points, &params, &free).unwrap();
        let errors = cov.standard_errors();

        let dpref = errors.dpref.unwrap();
        let rc = errors.rc.unwrap();
        let rho0 = errors.rho0.unwrap();
        assert!(dpref.is_finite() && dpref > 0.0);
        assert!(rc.is_finite() && rc > 0.0);
        assert!(rho0.is_finite() && rho0 > 0.0);
        assert!(errors.bpref.is_none());
        assert!(errors.mbh.is_none());
    }

    #[test]
    fn band_sigma_is_finite_and_nonnegative() {
        let (data, model, params) = galaxy_with_noise();
        let free = FreeParamSet {
            mbh: false,
            bulge: false,
            disk: true,
            halo: true,
        };

        let cov = gn_covariance(&model, &data.points, &params, &free).unwrap();
        for r in [0.5_f64, 3.0, 10.0, 24.0] {
            let s = cov.band_sigma(&model, r).unwrap();
            assert!(s.is_finite() && s >= 0.0, "r={r}");
        }
    }

    #[test]
    fn too_few_points_gives_no_covariance() {
        let (data, model, params) = galaxy_with_noise();
        let free = FreeParamSet {
            mbh: false,
            bulge: false,
            disk: true,
            halo: true,
        };
        let few = &data.points[..3];
        assert!(gn_covariance(&model, few, &params, &free).is_none());
    }
}
