//! SPARC rotation-curve ingest and normalization.
//!
//! This module turns a `*_rotmod.dat` mass-model table into a clean
//! `GalaxyData` that is safe to fit.
//!
//! File format (SPARC, Lelli/McGaugh/Schombert 2016):
//!
//! ```text
//! # Distance = 13.9 Mpc
//! # Rad  Vobs  errV  Vgas  Vdisk  Vbul  SBdisk  SBbul
//! 0.32  31.4  4.3  3.1  28.8  0.0  1251.3  0.0
//! ...
//! ```
//!
//! Design goals:
//! - **Strict header** for the distance line (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (rows are sorted by radius, duplicates dropped)
//! - **Separation of concerns**: no fitting logic here

use std::fs;
use std::path::Path;

use crate::domain::{DatasetStats, GalaxyData, RotationPoint, TracedCurve};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: normalized galaxy + row errors + counts.
#[derive(Debug, Clone)]
pub struct IngestedGalaxy {
    pub data: GalaxyData,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load and normalize a SPARC `*_rotmod.dat` file.
pub fn load_rotmod(path: &Path) -> Result<IngestedGalaxy, AppError> {
    let text = fs::read_to_string(path).map_err(|e| {
        AppError::config(format!("Failed to open data file '{}': {e}", path.display()))
    })?;

    let name = galaxy_name(path);
    let mut lines = text.lines().enumerate();

    let distance_mpc = match lines.next() {
        Some((_, first)) => parse_distance_header(first).ok_or_else(|| {
            AppError::config(format!(
                "Missing distance header in '{}': expected '# Distance = <value> Mpc' on line 1.",
                path.display()
            ))
        })?,
        None => {
            return Err(AppError::config(format!(
                "Data file '{}' is empty.",
                path.display()
            )));
        }
    };

    let mut rows: Vec<RawRow> = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, raw) in lines {
        let line = idx + 1; // enumerate is 0-based; humans count from 1
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        rows_read += 1;

        match parse_row(trimmed) {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    // Sort by radius and drop duplicate radii (splines need strictly
    // increasing knots). Deterministic: the first occurrence wins.
    rows.sort_by(|a, b| a.radius.partial_cmp(&b.radius).unwrap_or(std::cmp::Ordering::Equal));
    rows.dedup_by(|b, a| {
        if (b.radius - a.radius).abs() < 1e-9 {
            row_errors.push(RowError {
                line: 0,
                message: format!("Duplicate radius {:.4} kpc dropped.", b.radius),
            });
            true
        } else {
            false
        }
    });

    let rows_used = rows.len();
    if rows_used < 2 {
        return Err(AppError::data(format!(
            "Too few valid observations in '{}' ({rows_used} after validation; need at least 2).",
            path.display()
        )));
    }

    let points: Vec<RotationPoint> = rows
        .iter()
        .map(|r| RotationPoint {
            radius: r.radius,
            v_obs: r.v_obs,
            v_err: r.v_err,
            weight: 1.0 / (r.v_err * r.v_err),
        })
        .collect();

    let radii: Vec<f64> = rows.iter().map(|r| r.radius).collect();
    let gas = TracedCurve {
        radii: radii.clone(),
        velocities: rows.iter().map(|r| r.v_gas).collect(),
    };
    let disk = TracedCurve {
        radii: radii.clone(),
        velocities: rows.iter().map(|r| r.v_disk).collect(),
    };
    let bulge = TracedCurve {
        radii,
        velocities: rows.iter().map(|r| r.v_bulge).collect(),
    };

    let stats = DatasetStats::from_points(&points)
        .ok_or_else(|| AppError::data("No valid points remain after normalization."))?;

    Ok(IngestedGalaxy {
        data: GalaxyData {
            name,
            distance_mpc,
            points,
            bulge,
            disk,
            gas,
            stats,
        },
        row_errors,
        rows_read,
        rows_used,
    })
}

/// Galaxy name from the file name: `NGC5005_rotmod.dat` -> `NGC5005`.
pub fn galaxy_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
        .trim_end_matches("_rotmod")
        .to_string()
}

/// Parse the `# Distance = 13.9 Mpc` header line.
fn parse_distance_header(line: &str) -> Option<f64> {
    let trimmed = line.trim();
    if !trimmed.starts_with('#') {
        return None;
    }
    let mut tokens = trimmed.split_whitespace();
    tokens.find(|t| t.eq_ignore_ascii_case("distance"))?;

    // Accept both "# Distance = 13.9 Mpc" and "# Distance 13.9 Mpc".
    for token in tokens {
        if token == "=" {
            continue;
        }
        let value = token.parse::<f64>().ok()?;
        return (value.is_finite() && value > 0.0).then_some(value);
    }
    None
}

struct RawRow {
    radius: f64,
    v_obs: f64,
    v_err: f64,
    v_gas: f64,
    v_disk: f64,
    v_bulge: f64,
}

fn parse_row(line: &str) -> Result<RawRow, String> {
    let mut values = Vec::with_capacity(8);
    for token in line.split_whitespace() {
        let v = token
            .parse::<f64>()
            .map_err(|_| format!("Invalid number '{token}'."))?;
        values.push(v);
    }

    // Rad Vobs errV Vgas Vdisk Vbul [SBdisk SBbul ...] — trailing surface
    // brightness columns are ignored.
    if values.len() < 6 {
        return Err(format!(
            "Expected at least 6 columns (Rad Vobs errV Vgas Vdisk Vbul), found {}.",
            values.len()
        ));
    }

    let radius = values[0];
    let v_obs = values[1];
    let v_err = values[2];

    if !(radius.is_finite() && radius >= 0.0) {
        return Err(format!("Invalid radius {radius} (must be >= 0)."));
    }
    if !(v_obs.is_finite() && v_obs > 0.0) {
        return Err(format!("Invalid observed velocity {v_obs} (must be > 0)."));
    }
    if !(v_err.is_finite() && v_err > 0.0) {
        return Err(format!("Invalid velocity error {v_err} (must be > 0)."));
    }
    for (label, v) in [("Vgas", values[3]), ("Vdisk", values[4]), ("Vbul", values[5])] {
        if !v.is_finite() {
            return Err(format!("Non-finite {label} value."));
        }
    }

    Ok(RawRow {
        radius,
        v_obs,
        v_err,
        // Traced component speeds are magnitudes; SPARC encodes a net
        // outward gas force at small radii as a negative Vgas, which still
        // contributes |v| to the quadrature sum.
        v_gas: values[3].abs(),
        v_disk: values[4].abs(),
        v_bulge: values[5].abs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
# Distance = 13.9 Mpc
# Rad Vobs errV Vgas Vdisk Vbul SBdisk SBbul
0.32 31.4 4.3 3.1 28.8 0.0 1251.3 0.0
0.64 55.2 3.9 6.0 49.9 0.0 980.1 0.0
1.28 81.5 3.1 10.2 72.3 0.0 640.7 0.0
2.56 102.0 2.8 15.8 88.1 0.0 300.2 0.0
5.12 110.3 2.5 21.4 92.6 0.0 110.9 0.0
";

    fn write_temp(content: &str) -> tempfile::TempPath {
        let mut f = tempfile::Builder::new()
            .suffix("_rotmod.dat")
            .tempfile()
            .unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.into_temp_path()
    }

    #[test]
    fn loads_well_formed_file() {
        let path = write_temp(SAMPLE);
        let ingest = load_rotmod(&path).unwrap();

        assert_eq!(ingest.rows_read, 5);
        assert_eq!(ingest.rows_used, 5);
        assert!(ingest.row_errors.is_empty());
        assert!((ingest.data.distance_mpc - 13.9).abs() < 1e-12);
        assert_eq!(ingest.data.points.len(), 5);
        assert!(!ingest.data.bulge.is_present());
        assert!(ingest.data.disk.is_present());
        assert!(ingest.data.gas.is_present());

        let p = &ingest.data.points[0];
        assert!((p.weight - 1.0 / (4.3 * 4.3)).abs() < 1e-12);
        assert!((ingest.data.stats.r_max - 5.12).abs() < 1e-12);
    }

    #[test]
    fn reports_bad_rows_with_line_numbers() {
        let content = "\
# Distance = 9.2 Mpc
0.5 40.0 3.0 2.0 35.0 0.0
0.9 not-a-number 3.0 2.0 35.0 0.0
1.5 60.0 0.0 2.0 50.0 0.0
2.5 70.0 2.0 3.0 60.0 0.0
3.5 75.0 2.0 3.0 64.0 0.0
";
        let path = write_temp(content);
        let ingest = load_rotmod(&path).unwrap();

        assert_eq!(ingest.rows_used, 3);
        assert_eq!(ingest.row_errors.len(), 2);
        assert_eq!(ingest.row_errors[0].line, 3);
        assert_eq!(ingest.row_errors[1].line, 4);
    }

    #[test]
    fn missing_distance_header_is_config_error() {
        let content = "0.5 40.0 3.0 2.0 35.0 0.0\n";
        let path = write_temp(content);
        let err = load_rotmod(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn too_few_valid_rows_is_data_error() {
        let content = "# Distance = 9.2 Mpc\n0.5 40.0 3.0 2.0 35.0 0.0\n";
        let path = write_temp(content);
        let err = load_rotmod(&path).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn rows_are_sorted_and_deduplicated() {
        let content = "\
# Distance = 9.2 Mpc
2.5 70.0 2.0 3.0 60.0 0.0
0.5 40.0 3.0 2.0 35.0 0.0
2.5 71.0 2.0 3.0 61.0 0.0
1.5 60.0 2.5 2.5 50.0 0.0
";
        let path = write_temp(content);
        let ingest = load_rotmod(&path).unwrap();

        assert_eq!(ingest.rows_used, 3);
        let radii = ingest.data.radii();
        assert!(radii.windows(2).all(|w| w[1] > w[0]));
        assert!(ingest
            .row_errors
            .iter()
            .any(|e| e.message.contains("Duplicate radius")));
    }

    #[test]
    fn header_parser_accepts_spacing_variants() {
        assert_eq!(parse_distance_header("# Distance = 13.9 Mpc"), Some(13.9));
        assert_eq!(parse_distance_header("#Distance 7.5 Mpc"), None); // glued '#'
        assert_eq!(parse_distance_header("# distance = 7.5 Mpc"), Some(7.5));
        assert_eq!(parse_distance_header("# Rad Vobs"), None);
    }

    #[test]
    fn galaxy_name_strips_suffix() {
        assert_eq!(
            galaxy_name(Path::new("/data/NGC5005_rotmod.dat")),
            "NGC5005"
        );
    }
}
