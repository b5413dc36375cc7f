//! Component velocity evaluation.
//!
//! The fitter relies on two primitive operations:
//! - build a design row in velocity-squared space for a given radius and halo
//!   core radius (for the linear subproblem)
//! - predict `v(r)` given a full parameter set (for residuals/plots)
//!
//! Velocities are circular speeds in km/s, radii in kpc. Negative radii are
//! outside the model domain and rejected with an explicit error; `r = 0`
//! evaluates to the analytic limit (zero enclosed mass, zero velocity).

use std::f64::consts::PI;

use crate::domain::{FreeParamSet, GalaxyData, GalaxyParams, HaloParams, MiniBhParams, TracedCurve};
use crate::error::AppError;
use crate::math::{halo_shape, CubicSpline};
use crate::models::G_KPC;

/// Keplerian circular velocity of a central point mass.
///
/// `v = sqrt(G M / r)`; the `r = 0` limit is reported as 0 (there is no
/// circular orbit at zero radius).
pub fn blackhole_velocity(r: f64, mbh: f64) -> Result<f64, AppError> {
    check_radius(r)?;
    if r == 0.0 || mbh <= 0.0 {
        return Ok(0.0);
    }
    Ok((G_KPC * mbh / r).sqrt())
}

/// Isothermal-sphere halo circular velocity (Jimenez et al. 2003):
///
/// `v = sqrt(4 pi G rho0 rc^2 (1 - (rc/r) atan(r/rc)))`
pub fn halo_velocity(r: f64, halo: HaloParams) -> Result<f64, AppError> {
    check_radius(r)?;
    if halo.rho0 <= 0.0 || halo.rc <= 0.0 {
        return Ok(0.0);
    }
    let v2 = 4.0 * PI * G_KPC * halo.rho0 * halo.rc * halo.rc * halo_shape(r, halo.rc);
    Ok(v2.max(0.0).sqrt())
}

/// Circular velocity of a spherical population of small black holes.
///
/// The population follows the same spatial profile as the isothermal halo,
/// so this is exactly `halo_velocity` with `rho0 = scale * count * mass`.
pub fn minibh_velocity(r: f64, p: MiniBhParams) -> Result<f64, AppError> {
    halo_velocity(r, p.to_halo())
}

/// A traced component curve (bulge, disk or gas) wrapped in a spline.
///
/// Unit evaluation is clamped at zero: splines can undershoot near sparse
/// ends, and component speeds are magnitudes.
#[derive(Debug, Clone)]
pub struct TracedComponent {
    spline: CubicSpline,
}

impl TracedComponent {
    /// Build from a traced curve. `Ok(None)` when the component is absent
    /// (identically zero trace).
    pub fn new(curve: &TracedCurve) -> Result<Option<Self>, AppError> {
        if !curve.is_present() {
            return Ok(None);
        }
        let spline = CubicSpline::new(&curve.radii, &curve.velocities).ok_or_else(|| {
            AppError::data("Traced component curve has too few points or unsorted radii.")
        })?;
        Ok(Some(Self { spline }))
    }

    /// Unit-prefactor velocity at `r`.
    pub fn unit_velocity(&self, r: f64) -> f64 {
        self.spline.eval(r).max(0.0)
    }

    /// Velocity at `r` scaled by a prefactor.
    pub fn velocity(&self, r: f64, prefactor: f64) -> Result<f64, AppError> {
        check_radius(r)?;
        Ok(prefactor.max(0.0) * self.unit_velocity(r))
    }
}

/// Per-component velocities at a single radius, for plotting and reports.
#[derive(Debug, Clone, Copy)]
pub struct ComponentVelocities {
    pub blackhole: Option<f64>,
    pub bulge: Option<f64>,
    pub disk: Option<f64>,
    pub gas: Option<f64>,
    pub halo: Option<f64>,
    pub total: f64,
}

/// The composite rotation-curve model for one galaxy.
///
/// Holds the splined traced components; all evaluation is deterministic and
/// side-effect free.
#[derive(Debug, Clone)]
pub struct GalaxyModel {
    pub bulge: Option<TracedComponent>,
    pub disk: Option<TracedComponent>,
    pub gas: Option<TracedComponent>,
}

impl GalaxyModel {
    pub fn new(data: &GalaxyData) -> Result<Self, AppError> {
        Ok(Self {
            bulge: TracedComponent::new(&data.bulge)?,
            disk: TracedComponent::new(&data.disk)?,
            gas: TracedComponent::new(&data.gas)?,
        })
    }

    /// Total circular velocity: components added in quadrature.
    pub fn total_velocity(&self, r: f64, params: &GalaxyParams) -> Result<f64, AppError> {
        check_radius(r)?;
        Ok(self.total_velocity_unchecked(r, params))
    }

    /// Same as `total_velocity` for a pre-validated radius (fit hot loop).
    pub(crate) fn total_velocity_unchecked(&self, r: f64, params: &GalaxyParams) -> f64 {
        self.v_squared(r, params).sqrt()
    }

    /// All component velocities plus the quadrature total.
    pub fn component_velocities(
        &self,
        r: f64,
        params: &GalaxyParams,
    ) -> Result<ComponentVelocities, AppError> {
        check_radius(r)?;

        let blackhole = (params.mbh > 0.0).then(|| match blackhole_velocity(r, params.mbh) {
            Ok(v) => v,
            Err(_) => 0.0, // radius already validated
        });
        let bulge = self
            .bulge
            .as_ref()
            .map(|c| params.bpref.max(0.0) * c.unit_velocity(r));
        let disk = self
            .disk
            .as_ref()
            .map(|c| params.dpref.max(0.0) * c.unit_velocity(r));
        let gas = self
            .gas
            .as_ref()
            .map(|c| params.gpref.max(0.0) * c.unit_velocity(r));
        let halo = match params.halo {
            Some(h) if h.rho0 > 0.0 && h.rc > 0.0 => Some(halo_velocity(r, h)?),
            _ => None,
        };

        let total = self.total_velocity_unchecked(r, params);
        Ok(ComponentVelocities {
            blackhole,
            bulge,
            disk,
            gas,
            halo,
            total,
        })
    }

    fn v_squared(&self, r: f64, params: &GalaxyParams) -> f64 {
        let mut v2 = 0.0;

        if params.mbh > 0.0 && r > 0.0 {
            v2 += G_KPC * params.mbh / r;
        }
        if let Some(c) = &self.bulge {
            let v = params.bpref.max(0.0) * c.unit_velocity(r);
            v2 += v * v;
        }
        if let Some(c) = &self.disk {
            let v = params.dpref.max(0.0) * c.unit_velocity(r);
            v2 += v * v;
        }
        if let Some(c) = &self.gas {
            let v = params.gpref.max(0.0) * c.unit_velocity(r);
            v2 += v * v;
        }
        if let Some(h) = params.halo {
            if h.rho0 > 0.0 && h.rc > 0.0 {
                v2 += 4.0 * PI * G_KPC * h.rho0 * h.rc * h.rc * halo_shape(r, h.rc);
            }
        }

        v2.max(0.0)
    }

    /// Fill a velocity-squared design row at radius `r` for the linear
    /// subproblem, and return the fixed (non-fitted) contribution.
    ///
    /// Column order is `[mbh, bulge, disk, halo]`, restricted to the free
    /// parameters: the coefficients are `Mbh`, `bpref^2`, `dpref^2` and
    /// `rho0`. The gas term (prefactor fixed) and a fixed black hole are
    /// returned as the offset to subtract from the observed `v^2`.
    ///
    /// # Panics
    /// Panics if `out` is shorter than the number of free columns. Callers
    /// size the row from `FreeParamSet::columns`.
    pub fn fill_design_row(
        &self,
        r: f64,
        rc: f64,
        free: &FreeParamSet,
        fixed: &GalaxyParams,
        out: &mut [f64],
    ) -> f64 {
        let mut col = 0;

        if free.mbh {
            out[col] = if r > 0.0 { G_KPC / r } else { 0.0 };
            col += 1;
        }
        if free.bulge {
            let v = self.bulge.as_ref().map_or(0.0, |c| c.unit_velocity(r));
            out[col] = v * v;
            col += 1;
        }
        if free.disk {
            let v = self.disk.as_ref().map_or(0.0, |c| c.unit_velocity(r));
            out[col] = v * v;
            col += 1;
        }
        if free.halo {
            out[col] = 4.0 * PI * G_KPC * rc * rc * halo_shape(r, rc);
        }

        let mut offset = 0.0;
        if let Some(c) = &self.gas {
            let v = fixed.gpref.max(0.0) * c.unit_velocity(r);
            offset += v * v;
        }
        if !free.mbh && fixed.mbh > 0.0 && r > 0.0 {
            offset += G_KPC * fixed.mbh / r;
        }
        offset
    }
}

/// Number of linear columns for a free-parameter set (halo contributes one
/// linear column, `rho0`; its core radius is handled by the grid search).
pub fn linear_columns(free: &FreeParamSet) -> usize {
    usize::from(free.mbh) + usize::from(free.bulge) + usize::from(free.disk) + usize::from(free.halo)
}

fn check_radius(r: f64) -> Result<(), AppError> {
    if !r.is_finite() || r < 0.0 {
        return Err(AppError::config(format!(
            "Radius {r} kpc is outside the model domain (must be finite and >= 0)."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DatasetStats;

    fn traced(radii: &[f64], velocities: &[f64]) -> TracedCurve {
        TracedCurve {
            radii: radii.to_vec(),
            velocities: velocities.to_vec(),
        }
    }

    fn demo_galaxy() -> GalaxyData {
        let radii = [0.5, 1.0, 2.0, 4.0, 8.0, 16.0];
        GalaxyData {
            name: "DEMO".to_string(),
            distance_mpc: 20.0,
            points: Vec::new(),
            bulge: traced(&radii, &[80.0, 120.0, 150.0, 130.0, 100.0, 70.0]),
            disk: traced(&radii, &[30.0, 60.0, 100.0, 130.0, 140.0, 140.0]),
            gas: traced(&radii, &[5.0, 10.0, 18.0, 25.0, 30.0, 32.0]),
            stats: DatasetStats {
                n_points: 0,
                r_min: 0.5,
                r_max: 16.0,
                v_min: 0.0,
                v_max: 0.0,
            },
        }
    }

    #[test]
    fn blackhole_keplerian_value() {
        // v = sqrt(G M / r) with M = 1000 M_sun at r = 10 kpc.
        let v = blackhole_velocity(10.0, 1000.0).unwrap();
        assert!((v - (G_KPC * 1000.0 / 10.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn negative_radius_is_domain_error() {
        assert!(blackhole_velocity(-1.0, 1e9).is_err());
        assert!(halo_velocity(
            -0.1,
            HaloParams {
                rc: 1.4,
                rho0: 3.1e8
            }
        )
        .is_err());

        let model = GalaxyModel::new(&demo_galaxy()).unwrap();
        assert!(model
            .total_velocity(-2.0, &GalaxyParams::baryonic())
            .is_err());
    }

    #[test]
    fn component_velocities_nonnegative_and_finite() {
        let model = GalaxyModel::new(&demo_galaxy()).unwrap();
        let params = GalaxyParams {
            mbh: 2.7e9,
            bpref: 1.0,
            dpref: 1.0,
            gpref: 1.0,
            halo: Some(HaloParams {
                rc: 1.4,
                rho0: 3.1e8,
            }),
        };
        for i in 0..100 {
            let r = i as f64 * 0.25;
            let c = model.component_velocities(r, &params).unwrap();
            for v in [c.blackhole, c.bulge, c.disk, c.gas, c.halo]
                .into_iter()
                .flatten()
            {
                assert!(v.is_finite() && v >= 0.0, "r={r}");
            }
            assert!(c.total.is_finite() && c.total >= 0.0, "r={r}");
        }
    }

    #[test]
    fn halo_limit_at_zero_radius() {
        let v = halo_velocity(
            0.0,
            HaloParams {
                rc: 1.4,
                rho0: 3.1e8,
            },
        )
        .unwrap();
        assert_eq!(v, 0.0);
    }

    #[test]
    fn total_is_quadrature_sum() {
        let model = GalaxyModel::new(&demo_galaxy()).unwrap();
        let params = GalaxyParams {
            mbh: 1.0e9,
            bpref: 1.2,
            dpref: 0.8,
            gpref: 1.0,
            halo: Some(HaloParams {
                rc: 2.0,
                rho0: 2.0e8,
            }),
        };
        let r = 5.0;
        let c = model.component_velocities(r, &params).unwrap();
        let sum_sq: f64 = [c.blackhole, c.bulge, c.disk, c.gas, c.halo]
            .into_iter()
            .flatten()
            .map(|v| v * v)
            .sum();
        assert!((c.total - sum_sq.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn total_is_monotone_in_each_prefactor() {
        let model = GalaxyModel::new(&demo_galaxy()).unwrap();
        let base = GalaxyParams {
            mbh: 1.0e9,
            bpref: 1.0,
            dpref: 1.0,
            gpref: 1.0,
            halo: Some(HaloParams {
                rc: 1.4,
                rho0: 3.1e8,
            }),
        };

        let bump = |f: &dyn Fn(&mut GalaxyParams)| {
            let mut p = base;
            f(&mut p);
            p
        };

        for r in [0.5_f64, 2.0, 7.5, 15.0] {
            let v0 = model.total_velocity(r, &base).unwrap();
            for bumped in [
                bump(&|p| p.mbh *= 2.0),
                bump(&|p| p.bpref += 0.5),
                bump(&|p| p.dpref += 0.5),
                bump(&|p| p.gpref += 0.5),
                bump(&|p| p.halo = Some(HaloParams { rc: 1.4, rho0: 6.2e8 })),
            ] {
                let v1 = model.total_velocity(r, &bumped).unwrap();
                assert!(v1 >= v0 - 1e-12, "r={r}");
            }
        }
    }

    #[test]
    fn design_row_reconstructs_v_squared() {
        let model = GalaxyModel::new(&demo_galaxy()).unwrap();
        let free = FreeParamSet {
            mbh: true,
            bulge: true,
            disk: true,
            halo: true,
        };
        let params = GalaxyParams {
            mbh: 2.0e9,
            bpref: 1.3,
            dpref: 0.7,
            gpref: 1.0,
            halo: Some(HaloParams {
                rc: 2.5,
                rho0: 1.5e8,
            }),
        };

        let r = 3.0;
        let mut row = vec![0.0; linear_columns(&free)];
        let offset = model.fill_design_row(r, 2.5, &free, &params, &mut row);

        let theta = [
            params.mbh,
            params.bpref * params.bpref,
            params.dpref * params.dpref,
            params.halo.map(|h| h.rho0).unwrap_or(0.0),
        ];
        let v2_row: f64 = row.iter().zip(theta.iter()).map(|(x, t)| x * t).sum::<f64>() + offset;

        let v = model.total_velocity(r, &params).unwrap();
        assert!((v2_row - v * v).abs() < 1e-9);
    }

    #[test]
    fn minibh_equals_equivalent_halo() {
        let p = MiniBhParams {
            scale: 1e6,
            count: 245.0,
            mass: 1.5,
            rcut: 1.4,
        };
        for r in [0.5_f64, 2.0, 10.0, 40.0] {
            let v_bh = minibh_velocity(r, p).unwrap();
            let v_halo = halo_velocity(r, p.to_halo()).unwrap();
            assert!((v_bh - v_halo).abs() < 1e-12);
        }
    }
}
