//! Export per-point results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::PointResidual;
use crate::error::AppError;

/// Write per-point fit results to a CSV file.
pub fn write_results_csv(
    path: &Path,
    galaxy: &str,
    residuals: &[PointResidual],
) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::config(format!(
            "Failed to create export CSV '{}': {e}",
            path.display()
        ))
    })?;

    writeln!(
        file,
        "galaxy,radius_kpc,v_obs_kms,v_err_kms,v_fit_kms,residual_kms,weight"
    )
    .map_err(|e| AppError::config(format!("Failed to write export CSV header: {e}")))?;

    for r in residuals {
        let p = &r.point;
        writeln!(
            file,
            "{},{:.6},{:.4},{:.4},{:.4},{:.4},{:.10}",
            galaxy, p.radius, p.v_obs, p.v_err, r.v_fit, r.residual, p.weight,
        )
        .map_err(|e| AppError::config(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RotationPoint;

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let residuals = vec![PointResidual {
            point: RotationPoint {
                radius: 2.5,
                v_obs: 110.0,
                v_err: 4.0,
                weight: 1.0 / 16.0,
            },
            v_fit: 108.0,
            residual: 2.0,
        }];

        write_results_csv(&path, "NGC0000", &residuals).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("galaxy,radius_kpc"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("NGC0000,2.500000,110.0000"));
    }
}
