//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which model family to fit.
///
/// `Auto` fits both families and selects by BIC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelSpec {
    Auto,
    Baryons,
    Halo,
    All,
}

/// Concrete fitted model kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Visible matter only: black hole + bulge + disk + gas.
    Baryons,
    /// Visible matter plus an isothermal dark-matter halo.
    BaryonsHalo,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Baryons => "Baryons only",
            ModelKind::BaryonsHalo => "Baryons + halo",
        }
    }
}

/// How the halo sliders are parameterized in the TUI.
///
/// The two parameterizations describe the *same* velocity profile: a
/// population of `count` black holes of mass `mass` (times a fixed `scale`)
/// reproduces the isothermal halo with `rho0 = scale * count * mass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaloKind {
    Isothermal,
    MiniBh,
}

impl HaloKind {
    pub fn display_name(self) -> &'static str {
        match self {
            HaloKind::Isothermal => "DM halo",
            HaloKind::MiniBh => "mini black holes",
        }
    }
}

/// Where the galaxy data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalaxySource {
    /// A SPARC-style `*_rotmod.dat` file.
    File(PathBuf),
    /// Deterministic synthetic demo galaxy.
    Synthetic,
}

/// A single rotation-curve observation.
#[derive(Debug, Clone, Copy)]
pub struct RotationPoint {
    /// Galactocentric radius (kpc).
    pub radius: f64,
    /// Observed circular velocity (km/s).
    pub v_obs: f64,
    /// Velocity measurement error (km/s).
    pub v_err: f64,
    /// Fit weight, `1 / v_err^2`.
    pub weight: f64,
}

/// A traced component velocity curve sampled at the measured radii.
///
/// Bulge, disk and gas contributions in SPARC mass models are tabulated, not
/// closed-form; off-grid evaluation goes through a spline (see `models`).
#[derive(Debug, Clone, Default)]
pub struct TracedCurve {
    pub radii: Vec<f64>,
    pub velocities: Vec<f64>,
}

impl TracedCurve {
    /// A component whose traced curve is identically zero is absent from the
    /// mass model (e.g., bulgeless disk galaxies).
    pub fn is_present(&self) -> bool {
        self.velocities.iter().any(|v| v.abs() > 0.0)
    }
}

/// Summary stats about the observations actually used for fitting.
#[derive(Debug, Clone, Copy)]
pub struct DatasetStats {
    pub n_points: usize,
    pub r_min: f64,
    pub r_max: f64,
    pub v_min: f64,
    pub v_max: f64,
}

impl DatasetStats {
    /// `None` when the point set is empty or contains non-finite values.
    pub fn from_points(points: &[RotationPoint]) -> Option<Self> {
        let mut r_min = f64::INFINITY;
        let mut r_max = f64::NEG_INFINITY;
        let mut v_min = f64::INFINITY;
        let mut v_max = f64::NEG_INFINITY;

        for p in points {
            r_min = r_min.min(p.radius);
            r_max = r_max.max(p.radius);
            v_min = v_min.min(p.v_obs);
            v_max = v_max.max(p.v_obs);
        }

        if !r_min.is_finite() || !r_max.is_finite() || !v_min.is_finite() || !v_max.is_finite() {
            return None;
        }

        Some(Self {
            n_points: points.len(),
            r_min,
            r_max,
            v_min,
            v_max,
        })
    }
}

/// A fully loaded galaxy: observations plus traced component curves.
///
/// Immutable once loaded; all downstream stages borrow it.
#[derive(Debug, Clone)]
pub struct GalaxyData {
    pub name: String,
    /// Distance to the galaxy (Mpc), from the data-file header.
    pub distance_mpc: f64,
    pub points: Vec<RotationPoint>,
    pub bulge: TracedCurve,
    pub disk: TracedCurve,
    pub gas: TracedCurve,
    pub stats: DatasetStats,
}

impl GalaxyData {
    pub fn radii(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.radius).collect()
    }
}

/// Isothermal halo parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HaloParams {
    /// Core (cutoff) radius (kpc).
    pub rc: f64,
    /// Central mass density (M_sun / kpc^3).
    pub rho0: f64,
}

/// Mini-black-hole population parameters (the "dark matter as tiny black
/// holes" picture).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiniBhParams {
    /// Number of black holes represented by each count unit.
    pub scale: f64,
    /// Black-hole count (in `scale` units).
    pub count: f64,
    /// Mass per black hole (M_sun).
    pub mass: f64,
    /// Cutoff radius of the population (kpc).
    pub rcut: f64,
}

impl MiniBhParams {
    /// The equivalent isothermal halo: `rho0 = scale * count * mass`.
    pub fn to_halo(self) -> HaloParams {
        HaloParams {
            rc: self.rcut,
            rho0: self.scale * self.count * self.mass,
        }
    }
}

/// The full parameter set of the composite rotation curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GalaxyParams {
    /// Central supermassive black hole mass (M_sun).
    pub mbh: f64,
    /// Bulge prefactor (scales the traced bulge curve).
    pub bpref: f64,
    /// Disk prefactor.
    pub dpref: f64,
    /// Gas prefactor (held at 1.0 in fits; the gas curve is measured).
    pub gpref: f64,
    /// Halo parameters; `None` for baryons-only models.
    pub halo: Option<HaloParams>,
}

impl GalaxyParams {
    /// Baryons-only parameter set with unit prefactors and no black hole.
    pub fn baryonic() -> Self {
        Self {
            mbh: 0.0,
            bpref: 1.0,
            dpref: 1.0,
            gpref: 1.0,
            halo: None,
        }
    }
}

/// Which parameters the fit actually varies for a given galaxy/model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeParamSet {
    pub mbh: bool,
    pub bulge: bool,
    pub disk: bool,
    /// Halo contributes two free parameters: `rc` and `rho0`.
    pub halo: bool,
}

impl FreeParamSet {
    pub fn count(&self) -> usize {
        usize::from(self.mbh)
            + usize::from(self.bulge)
            + usize::from(self.disk)
            + if self.halo { 2 } else { 0 }
    }
}

/// One-sigma standard errors for the fitted parameters.
///
/// `None` means the parameter was fixed, or the covariance was not available
/// (e.g., too few observations).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ParamErrors {
    pub mbh: Option<f64>,
    pub bpref: Option<f64>,
    pub dpref: Option<f64>,
    pub rc: Option<f64>,
    pub rho0: Option<f64>,
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    /// Error-weighted sum of squared velocity residuals.
    pub chi2: f64,
    /// `chi2 / (n - k)`; `None` when `n <= k`.
    pub chi2_red: Option<f64>,
    /// Unweighted root-mean-square residual (km/s).
    pub rmse: f64,
    pub bic: f64,
    pub n: usize,
    /// Number of free parameters.
    pub k: usize,
}

/// Fitted model parameters and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationModel {
    pub kind: ModelKind,
    pub display_name: String,
    pub params: GalaxyParams,
    pub errors: ParamErrors,
}

/// Fit output for a single model kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    pub model: RotationModel,
    pub quality: FitQuality,
}

/// A per-point fitted result (used for outlier ranking and exports).
#[derive(Debug, Clone)]
pub struct PointResidual {
    pub point: RotationPoint,
    pub v_fit: f64,
    pub residual: f64,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub source: GalaxySource,
    /// Whether the central black-hole mass is a free parameter.
    ///
    /// SPARC tables fold the black hole into the bulge trace, so this
    /// defaults to off for file sources.
    pub fit_black_hole: bool,
    pub model_spec: ModelSpec,

    /// Halo core-radius grid for the nonlinear search.
    pub rc_min: f64,
    pub rc_max: f64,
    pub rc_steps: usize,

    /// Synthetic-galaxy controls (ignored for file sources).
    pub sample_count: usize,
    pub sample_seed: u64,

    pub top_n: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
}

/// A saved curve file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub galaxy: String,
    pub distance_mpc: f64,
    pub model: RotationModel,
    pub fit_quality: FitQuality,
    pub grid: CurveGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub radius_kpc: Vec<f64>,
    pub v_total: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minibh_maps_onto_isothermal_halo() {
        let p = MiniBhParams {
            scale: 1e6,
            count: 245.0,
            mass: 1.5,
            rcut: 1.4,
        };
        let halo = p.to_halo();
        assert!((halo.rc - 1.4).abs() < 1e-12);
        assert!((halo.rho0 - 1e6 * 245.0 * 1.5).abs() < 1e-3);
    }

    #[test]
    fn free_param_count_includes_two_for_halo() {
        let free = FreeParamSet {
            mbh: false,
            bulge: true,
            disk: true,
            halo: true,
        };
        assert_eq!(free.count(), 4);
        let baryons = FreeParamSet {
            mbh: true,
            bulge: true,
            disk: true,
            halo: false,
        };
        assert_eq!(baryons.count(), 3);
    }

    #[test]
    fn traced_curve_presence() {
        let absent = TracedCurve {
            radii: vec![1.0, 2.0],
            velocities: vec![0.0, 0.0],
        };
        assert!(!absent.is_present());
        let present = TracedCurve {
            radii: vec![1.0, 2.0],
            velocities: vec![0.0, 12.0],
        };
        assert!(present.is_present());
    }
}
