//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `o`
//! - total curve: `-`
//! - component curves: `*` (black hole), `b` (bulge), `d` (disk), `g` (gas),
//!   `h` (halo)

use crate::domain::{CurveFile, GalaxyData, GalaxyParams};
use crate::models::GalaxyModel;

const LEFT_MARGIN: usize = 9;

/// Render a plot for an in-memory galaxy + parameter set.
pub fn render_ascii_plot(
    data: &GalaxyData,
    model: &GalaxyModel,
    params: &GalaxyParams,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(20);
    let height = height.max(8);

    let r0 = 0.0;
    let r1 = if data.stats.r_max.is_finite() && data.stats.r_max > 0.0 {
        data.stats.r_max * 1.02
    } else {
        25.0
    };

    // Sample each curve once per column.
    let mut series: Vec<(char, Vec<(f64, f64)>)> = Vec::new();
    let mut total = Vec::with_capacity(width);
    let mut blackhole = Vec::new();
    let mut bulge = Vec::new();
    let mut disk = Vec::new();
    let mut gas = Vec::new();
    let mut halo = Vec::new();

    for i in 0..width {
        let u = i as f64 / (width as f64 - 1.0);
        let r = r0 + u * (r1 - r0);
        let Ok(c) = model.component_velocities(r, params) else {
            continue;
        };
        total.push((r, c.total));
        if let Some(v) = c.blackhole {
            blackhole.push((r, v));
        }
        if let Some(v) = c.bulge {
            bulge.push((r, v));
        }
        if let Some(v) = c.disk {
            disk.push((r, v));
        }
        if let Some(v) = c.gas {
            gas.push((r, v));
        }
        if let Some(v) = c.halo {
            halo.push((r, v));
        }
    }

    // Draw order: components first so the total and the data win overlaps.
    for (ch, s) in [
        ('*', blackhole),
        ('b', bulge),
        ('d', disk),
        ('g', gas),
        ('h', halo),
    ] {
        if !s.is_empty() {
            series.push((ch, s));
        }
    }
    series.push(('-', total));

    let points: Vec<(f64, f64)> = data.points.iter().map(|p| (p.radius, p.v_obs)).collect();

    render_grid(&series, &points, r0, r1, width, height)
}

/// Render a plot from a saved curve JSON file (total curve only).
pub fn render_ascii_plot_from_curve_file(curve: &CurveFile, width: usize, height: usize) -> String {
    let width = width.max(20);
    let height = height.max(8);

    let pts: Vec<(f64, f64)> = curve
        .grid
        .radius_kpc
        .iter()
        .zip(curve.grid.v_total.iter())
        .map(|(&r, &v)| (r, v))
        .collect();

    let r0 = pts.first().map(|p| p.0).unwrap_or(0.0);
    let r1 = pts.last().map(|p| p.0).unwrap_or(25.0).max(r0 + 1e-6);

    render_grid(&[('-', pts)], &[], r0, r1, width, height)
}

fn render_grid(
    series: &[(char, Vec<(f64, f64)>)],
    points: &[(f64, f64)],
    r0: f64,
    r1: f64,
    width: usize,
    height: usize,
) -> String {
    // y-range from everything drawn, padded.
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for (_, s) in series {
        for &(_, y) in s {
            if y.is_finite() {
                y_min = y_min.min(y);
                y_max = y_max.max(y);
            }
        }
    }
    for &(_, y) in points {
        if y.is_finite() {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min = 0.0;
        y_max = 1.0;
    }
    let pad = (y_max - y_min) * 0.05;
    let y_min = (y_min - pad).min(0.0);
    let y_max = y_max + pad;

    let mut grid = vec![vec![' '; width]; height];

    let place = |grid: &mut Vec<Vec<char>>, x: f64, y: f64, ch: char| {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        let u = (x - r0) / (r1 - r0);
        let v = (y - y_min) / (y_max - y_min);
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return;
        }
        let col = ((width - 1) as f64 * u).round() as usize;
        let row = (height - 1) - ((height - 1) as f64 * v).round() as usize;
        grid[row][col] = ch;
    };

    for (ch, s) in series {
        for &(x, y) in s {
            place(&mut grid, x, y, *ch);
        }
    }
    for &(x, y) in points {
        place(&mut grid, x, y, 'o');
    }

    let mut out = String::new();
    for (row_idx, row) in grid.iter().enumerate() {
        let label = if row_idx == 0 {
            format!("{y_max:>8.1}")
        } else if row_idx == height - 1 {
            format!("{y_min:>8.1}")
        } else {
            " ".repeat(8)
        };
        out.push_str(&label);
        out.push('|');
        out.extend(row.iter());
        out.push('\n');
    }

    out.push_str(&" ".repeat(LEFT_MARGIN));
    out.push_str(&"-".repeat(width));
    out.push('\n');
    out.push_str(&format!(
        "{:>width_l$}{:>width_r$}\n",
        format!("{r0:.1}"),
        format!("{r1:.1} kpc"),
        width_l = LEFT_MARGIN + 4,
        width_r = width.saturating_sub(4),
    ));
    out.push_str("o data  - total  b bulge  d disk  g gas  h halo  * black hole\n");

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatasetStats, HaloParams, RotationPoint, TracedCurve};

    fn demo() -> (GalaxyData, GalaxyModel) {
        let radii: Vec<f64> = (1..=12).map(|i| i as f64).collect();
        let disk: Vec<f64> = radii.iter().map(|&r| 120.0 * (1.0 - (-r / 3.0).exp())).collect();
        let gas: Vec<f64> = radii.iter().map(|&r| 25.0 * (1.0 - (-r / 6.0).exp())).collect();
        let points: Vec<RotationPoint> = radii
            .iter()
            .map(|&r| RotationPoint {
                radius: r,
                v_obs: 100.0 + r,
                v_err: 4.0,
                weight: 1.0 / 16.0,
            })
            .collect();
        let data = GalaxyData {
            name: "PLOT".to_string(),
            distance_mpc: 10.0,
            points,
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
                n_points: 12,
                r_min: 1.0,
                r_max: 12.0,
                v_min: 101.0,
                v_max: 112.0,
            },
        };
        let model = GalaxyModel::new(&data).unwrap();
        (data, model)
    }

    #[test]
    fn plot_contains_points_curves_and_legend() {
        let (data, model) = demo();
        let params = GalaxyParams {
            mbh: 0.0,
            bpref: 1.0,
            dpref: 1.0,
            gpref: 1.0,
            halo: Some(HaloParams {
                rc: 1.4,
                rho0: 3.1e8,
            }),
        };
        let plot = render_ascii_plot(&data, &model, &params, 60, 18);
        assert!(plot.contains('o'));
        assert!(plot.contains('-'));
        assert!(plot.contains('d'));
        assert!(plot.contains('h'));
        assert!(plot.contains("o data"));
    }

    #[test]
    fn plot_is_deterministic() {
        let (data, model) = demo();
        let params = GalaxyParams::baryonic();
        let a = render_ascii_plot(&data, &model, &params, 50, 15);
        let b = render_ascii_plot(&data, &model, &params, 50, 15);
        assert_eq!(a, b);
    }
}
