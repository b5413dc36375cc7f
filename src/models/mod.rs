//! Rotation-curve component models.
//!
//! Models are implemented as small, pure functions plus a thin spline wrapper
//! for traced curves, so fitting/search code can stay generic.

pub mod model;

pub use model::*;

/// Gravitational constant in galactic units: kpc (km/s)^2 / M_sun.
pub const G_KPC: f64 = 4.30091e-6;

/// Default central black-hole mass (M_sun), NGC 5533 (Noordermeer 2008).
pub const DEFAULT_MBH: f64 = 2.7e9;

/// Default halo core radius (kpc), NGC 5533.
pub const DEFAULT_RC: f64 = 1.4;

/// Default halo central mass density (M_sun / kpc^3), NGC 5533.
pub const DEFAULT_RHO0: f64 = 0.31e9;

/// Black holes represented by one count unit of the mini-BH sliders.
///
/// The count slider works in units of `MINIBH_SCALE` holes; exposing the raw
/// number would make slider steps uselessly small.
pub const MINIBH_SCALE: f64 = 1e6;
