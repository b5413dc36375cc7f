//! Shared "fit pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> build model -> fit/select -> residuals -> outliers
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use crate::data::generate_sample;
use crate::domain::{FitConfig, GalaxyData, GalaxySource, PointResidual};
use crate::error::AppError;
use crate::fit::selection::{fit_and_select, FitSelection};
use crate::io::ingest::{load_rotmod, RowError};
use crate::models::GalaxyModel;
use crate::report::{compute_residuals, rank_outliers, Outliers};

/// All computed outputs of a single `rot fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub data: GalaxyData,
    pub row_errors: Vec<RowError>,
    pub model: GalaxyModel,
    pub selection: FitSelection,
    pub residuals: Vec<PointResidual>,
    pub outliers: Outliers,
}

/// Load the configured galaxy (data file or synthetic sample).
pub fn load_galaxy(config: &FitConfig) -> Result<(GalaxyData, Vec<RowError>), AppError> {
    match &config.source {
        GalaxySource::File(path) => {
            let ingest = load_rotmod(path)?;
            Ok((ingest.data, ingest.row_errors))
        }
        GalaxySource::Synthetic => Ok((generate_sample(config)?, Vec::new())),
    }
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let (data, row_errors) = load_galaxy(config)?;
    run_fit_with_data(config, data, row_errors)
}

/// Execute the fitting pipeline with pre-loaded data.
///
/// This is useful for the TUI where we want to refit without re-reading the
/// data file.
pub fn run_fit_with_data(
    config: &FitConfig,
    data: GalaxyData,
    row_errors: Vec<RowError>,
) -> Result<RunOutput, AppError> {
    let model = GalaxyModel::new(&data)?;
    let selection = fit_and_select(&model, &data, config)?;
    let residuals = compute_residuals(&model, &data.points, &selection.best.model.params)?;
    let outliers = rank_outliers(&residuals, config.top_n);

    Ok(RunOutput {
        data,
        row_errors,
        model,
        selection,
        residuals,
        outliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelSpec;

    fn synthetic_config() -> FitConfig {
        FitConfig {
            source: GalaxySource::Synthetic,
            fit_black_hole: true,
            model_spec: ModelSpec::Auto,
            rc_min: 0.1,
            rc_max: 20.0,
            rc_steps: 40,
            sample_count: 40,
            sample_seed: 42,
            top_n: 5,
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_results: None,
            export_curve: None,
        }
    }

    #[test]
    fn synthetic_pipeline_runs_end_to_end() {
        let run = run_fit(&synthetic_config()).unwrap();

        assert_eq!(run.data.points.len(), 40);
        assert_eq!(run.residuals.len(), 40);
        assert!(run.outliers.above.len() <= 5);
        assert!(run.selection.best.quality.chi2.is_finite());
        // The synthetic galaxy contains a halo; selection should keep it.
        assert!(run.selection.best.model.params.halo.is_some());
    }

    #[test]
    fn pipeline_is_deterministic() {
        let a = run_fit(&synthetic_config()).unwrap();
        let b = run_fit(&synthetic_config()).unwrap();
        assert_eq!(
            a.selection.best.model.params,
            b.selection.best.model.params
        );
        assert_eq!(a.selection.best.quality.chi2, b.selection.best.quality.chi2);
    }
}
