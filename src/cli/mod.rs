//! Command-line parsing for the rotation-curve fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::ModelSpec;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "rot",
    version,
    about = "Galaxy rotation-curve fitter and explorer (SPARC mass models)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit rotation-curve models, print diagnostics/outliers, and optionally plot/export.
    Fit(FitArgs),
    /// Print the most discrepant observations only (useful for scripting).
    Outliers(FitArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying fit pipeline as `rot fit`, but renders
    /// results in a terminal UI with parameter sliders.
    Tui(FitArgs),
    /// Download the SPARC rotation-curve archive into the data directory.
    Fetch(FetchArgs),
}

/// Common options for fitting, outlier ranking and the TUI.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Galaxy data file (SPARC `*_rotmod.dat`).
    ///
    /// If omitted, a picker lists files found under the data directory
    /// (`ROT_DATA_DIR`, default `./data`).
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Use the built-in synthetic demo galaxy instead of a file.
    #[arg(long)]
    pub synthetic: bool,

    /// Treat the central black-hole mass as a free parameter.
    ///
    /// SPARC tables fold the black hole into the bulge trace, so this is off
    /// by default for file sources (it is always on for the synthetic galaxy).
    #[arg(long)]
    pub fit_black_hole: bool,

    /// Which model(s) to fit.
    #[arg(long, value_enum, default_value_t = ModelSpec::Auto)]
    pub model: ModelSpec,

    /// Minimum halo core radius (kpc) for the grid search.
    #[arg(long, default_value_t = 0.1)]
    pub rc_min: f64,

    /// Maximum halo core radius (kpc) for the grid search.
    #[arg(long, default_value_t = 20.0)]
    pub rc_max: f64,

    /// Core-radius grid steps.
    #[arg(long, default_value_t = 60)]
    pub rc_steps: usize,

    /// Number of synthetic observations (with --synthetic).
    #[arg(short = 'n', long, default_value_t = 40)]
    pub sample_count: usize,

    /// Random seed for synthetic observations.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Show top-N outliers on each side of the curve.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export per-point results to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export curve (model + params + fitted grid) to JSON.
    #[arg(long = "export-curve")]
    pub export_curve: Option<PathBuf>,
}

/// Options for plotting a saved curve.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Curve JSON file produced by `rot fit --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for downloading the SPARC archive.
#[derive(Debug, Parser)]
pub struct FetchArgs {
    /// Archive URL.
    #[arg(long, default_value = crate::io::fetch::SPARC_ARCHIVE_URL)]
    pub url: String,

    /// Target directory (defaults to the data directory).
    #[arg(long)]
    pub dir: Option<PathBuf>,
}
