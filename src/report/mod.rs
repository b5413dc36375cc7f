//! Reporting utilities: residuals, outlier ranking, and formatted output.

pub mod format;

pub use format::*;

use crate::domain::{GalaxyParams, PointResidual, RotationPoint};
use crate::error::AppError;
use crate::models::GalaxyModel;

/// Most discrepant observations on each side of the fitted curve (top-N).
#[derive(Debug, Clone)]
pub struct Outliers {
    /// Points well above the curve (positive residual).
    pub above: Vec<PointResidual>,
    /// Points well below the curve (negative residual).
    pub below: Vec<PointResidual>,
}

/// Compute fitted velocities and residuals for each observation.
pub fn compute_residuals(
    model: &GalaxyModel,
    points: &[RotationPoint],
    params: &GalaxyParams,
) -> Result<Vec<PointResidual>, AppError> {
    let mut out = Vec::with_capacity(points.len());
    for p in points {
        let v_fit = model.total_velocity(p.radius, params)?;
        if !v_fit.is_finite() {
            return Err(AppError::runtime(
                "Non-finite model velocity during residual computation.",
            ));
        }
        let residual = p.v_obs - v_fit;
        out.push(PointResidual {
            point: *p,
            v_fit,
            residual,
        });
    }
    Ok(out)
}

/// Rank the top-N observations above and below the fitted curve.
pub fn rank_outliers(residuals: &[PointResidual], top_n: usize) -> Outliers {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| {
        b.residual
            .partial_cmp(&a.residual)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let above = sorted.iter().take(top_n).cloned().collect();

    let mut sorted_below = residuals.to_vec();
    sorted_below.sort_by(|a, b| {
        a.residual
            .partial_cmp(&b.residual)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let below = sorted_below.iter().take(top_n).cloned().collect();

    Outliers { above, below }
}
