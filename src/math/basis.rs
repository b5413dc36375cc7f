//! Stable shape function for the isothermal halo profile.
//!
//! The enclosed-mass term of the isothermal sphere gives a squared circular
//! velocity proportional to:
//!
//! - `shape(r, rc) = 1 - (rc/r) * atan(r/rc) = 1 - atan(x)/x`, `x = r/rc`
//!
//! Numerical notes:
//! - For small `x`, `1 - atan(x)/x` suffers from catastrophic cancellation.
//!   We use the series `x^2/3 - x^4/5 + x^6/7` below a threshold.
//! - The analytic limit at `r -> 0` is 0 (no enclosed mass), and
//!   `shape -> 1` as `r -> inf` (the full asymptotic velocity).

/// Threshold below which we switch to the small-x series approximation.
const SMALL_X: f64 = 1e-4;

/// Compute `1 - atan(x)/x` for `x = r/rc` in a numerically stable way.
///
/// Both `r` and `rc` must be non-negative; `rc = 0` degenerates to a point
/// profile with `shape = 1` everywhere except `r = 0`.
pub fn halo_shape(r: f64, rc: f64) -> f64 {
    if r <= 0.0 {
        return 0.0;
    }
    if rc <= 0.0 {
        return 1.0;
    }

    let x = r / rc;
    if x < SMALL_X {
        let x2 = x * x;
        // Series: 1 - atan(x)/x = x^2/3 - x^4/5 + x^6/7 - ...
        return x2 / 3.0 - x2 * x2 / 5.0 + x2 * x2 * x2 / 7.0;
    }

    1.0 - x.atan() / x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_limits() {
        assert_eq!(halo_shape(0.0, 1.4), 0.0);
        // Large radius: atan(x)/x -> 0, shape -> 1.
        assert!((halo_shape(1e9, 1.4) - 1.0).abs() < 1e-8);
    }

    #[test]
    fn shape_series_matches_direct_form() {
        // Just above the series threshold the two branches must agree.
        let rc = 2.0;
        for &x in &[9e-5_f64, 1.1e-4, 1e-3] {
            let r = x * rc;
            let direct = 1.0 - (r / rc).atan() / (r / rc);
            assert!(
                (halo_shape(r, rc) - direct).abs() < 1e-14,
                "mismatch at x={x}"
            );
        }
    }

    #[test]
    fn shape_monotone_in_radius() {
        let rc = 1.4;
        let mut prev = 0.0;
        for i in 1..200 {
            let r = i as f64 * 0.25;
            let s = halo_shape(r, rc);
            assert!(s.is_finite() && s >= prev, "non-monotone at r={r}");
            prev = s;
        }
    }
}
