//! Natural cubic spline interpolation.
//!
//! Traced component curves (bulge/disk/gas) are tabulated at the measured
//! radii; plotting and fitting evaluate them on arbitrary grids. A natural
//! cubic spline matches how the curves were produced upstream while staying
//! deterministic and allocation-light.
//!
//! Outside the knot range we extrapolate linearly with the boundary slope;
//! cubic extrapolation is wild on the sparse outer radii of rotation curves.

/// A natural cubic spline over strictly increasing knots.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at the knots (natural boundary: zero at the ends).
    d2: Vec<f64>,
}

impl CubicSpline {
    /// Build a spline; returns `None` when fewer than two knots are supplied,
    /// the lengths mismatch, or the knots are not strictly increasing.
    pub fn new(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let n = xs.len();
        if n < 2 || ys.len() != n {
            return None;
        }
        if xs.windows(2).any(|w| !(w[1] > w[0])) {
            return None;
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return None;
        }

        let d2 = second_derivatives(xs, ys);
        Some(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            d2,
        })
    }

    /// Evaluate the spline at `x` (linear extrapolation outside the knots).
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0] + self.boundary_slope_left() * (x - self.xs[0]);
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1] + self.boundary_slope_right() * (x - self.xs[n - 1]);
        }

        // Find the interval [x_i, x_{i+1}] containing x.
        let i = match self.xs.partition_point(|&k| k <= x) {
            0 => 0,
            idx => idx - 1,
        };
        let h = self.xs[i + 1] - self.xs[i];
        let a = (self.xs[i + 1] - x) / h;
        let b = (x - self.xs[i]) / h;

        a * self.ys[i]
            + b * self.ys[i + 1]
            + ((a * a * a - a) * self.d2[i] + (b * b * b - b) * self.d2[i + 1]) * (h * h) / 6.0
    }

    fn boundary_slope_left(&self) -> f64 {
        let h = self.xs[1] - self.xs[0];
        (self.ys[1] - self.ys[0]) / h - h * (2.0 * self.d2[0] + self.d2[1]) / 6.0
    }

    fn boundary_slope_right(&self) -> f64 {
        let n = self.xs.len();
        let h = self.xs[n - 1] - self.xs[n - 2];
        (self.ys[n - 1] - self.ys[n - 2]) / h + h * (self.d2[n - 2] + 2.0 * self.d2[n - 1]) / 6.0
    }
}

/// Solve the tridiagonal system for natural-spline second derivatives.
fn second_derivatives(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let mut d2 = vec![0.0; n];
    if n < 3 {
        return d2; // two knots: a straight line
    }

    // Forward sweep (Thomas algorithm); natural boundary rows are identity.
    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];

    for i in 1..n - 1 {
        let h0 = xs[i] - xs[i - 1];
        let h1 = xs[i + 1] - xs[i];
        let a = h0;
        let b = 2.0 * (h0 + h1);
        let c = h1;
        let rhs = 6.0 * ((ys[i + 1] - ys[i]) / h1 - (ys[i] - ys[i - 1]) / h0);

        let denom = b - a * c_prime[i - 1];
        c_prime[i] = c / denom;
        d_prime[i] = (rhs - a * d_prime[i - 1]) / denom;
    }

    for i in (1..n - 1).rev() {
        d2[i] = d_prime[i] - c_prime[i] * d2[i + 1];
    }

    d2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_knots_exactly() {
        let xs = [0.5, 1.2, 2.6, 5.3, 6.7, 9.5];
        let ys = [100.0, 200.0, 280.0, 200.0, 130.0, 100.0];
        let s = CubicSpline::new(&xs, &ys).unwrap();
        for (&x, &y) in xs.iter().zip(ys.iter()) {
            assert!((s.eval(x) - y).abs() < 1e-9, "knot x={x}");
        }
    }

    #[test]
    fn reproduces_linear_data_everywhere() {
        let xs: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 + 2.0 * x).collect();
        let s = CubicSpline::new(&xs, &ys).unwrap();
        for i in 0..90 {
            let x = -1.0 + i as f64 * 0.125; // includes extrapolation range
            assert!((s.eval(x) - (3.0 + 2.0 * x)).abs() < 1e-9, "x={x}");
        }
    }

    #[test]
    fn rejects_bad_knots() {
        assert!(CubicSpline::new(&[1.0], &[1.0]).is_none());
        assert!(CubicSpline::new(&[1.0, 1.0], &[1.0, 2.0]).is_none());
        assert!(CubicSpline::new(&[2.0, 1.0], &[1.0, 2.0]).is_none());
        assert!(CubicSpline::new(&[1.0, 2.0], &[1.0]).is_none());
    }

    #[test]
    fn extrapolation_is_linear() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 1.0, 8.0, 27.0];
        let s = CubicSpline::new(&xs, &ys).unwrap();
        // Beyond the right end, equally spaced samples have constant slope.
        let y1 = s.eval(4.0);
        let y2 = s.eval(5.0);
        let y3 = s.eval(6.0);
        assert!(((y2 - y1) - (y3 - y2)).abs() < 1e-9);
    }
}
