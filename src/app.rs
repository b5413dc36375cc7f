//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads galaxy data (file or synthetic)
//! - runs curve fitting + model selection
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, FetchArgs, FitArgs, PlotArgs};
use crate::domain::{FitConfig, GalaxySource};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `rot` binary.
pub fn run() -> Result<(), AppError> {
    // We want `rot` and `rot -f NGC5005_rotmod.dat` to behave like
    // `rot tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => handle_fit(args, OutputMode::Full),
        Command::Outliers(args) => handle_fit(args, OutputMode::OutliersOnly),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args),
        Command::Fetch(args) => handle_fetch(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    OutliersOnly,
}

fn handle_fit(args: FitArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = fit_config_from_args(&args)?;
    let run = pipeline::run_fit(&config)?;

    match mode {
        OutputMode::Full => {
            println!(
                "{}",
                crate::report::format_run_summary(&run.data, &run.row_errors, &run.selection, &config)
            );
        }
        OutputMode::OutliersOnly => {}
    }

    println!("{}", crate::report::format_outliers(&run.outliers));

    if mode == OutputMode::Full && config.plot {
        let plot = crate::plot::render_ascii_plot(
            &run.data,
            &run.model,
            &run.selection.best.model.params,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_results {
        crate::io::export::write_results_csv(path, &run.data.name, &run.residuals)?;
    }
    if let Some(path) = &config.export_curve {
        crate::io::curve::write_curve_json(path, &run.selection.best, &run.model, &run.data)?;
    }

    Ok(())
}

fn handle_tui(args: FitArgs) -> Result<(), AppError> {
    crate::tui::run(args)
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::curve::read_curve_json(&args.curve)?;
    let plot = crate::plot::render_ascii_plot_from_curve_file(&curve, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let dir = args
        .dir
        .unwrap_or_else(crate::cli::picker::data_dir);
    println!("Downloading {} ...", args.url);
    let count = crate::io::fetch::fetch_sparc_archive(&dir, &args.url)?;
    println!("Extracted {count} galaxy file(s) into '{}'.", dir.display());
    Ok(())
}

/// Resolve a `FitConfig` from CLI flags, prompting for a galaxy file when
/// neither `-f` nor `--synthetic` was given.
pub fn fit_config_from_args(args: &FitArgs) -> Result<FitConfig, AppError> {
    let source = if args.synthetic {
        GalaxySource::Synthetic
    } else {
        match &args.file {
            Some(path) => GalaxySource::File(path.clone()),
            None => GalaxySource::File(crate::cli::picker::prompt_for_data_file()?),
        }
    };

    Ok(FitConfig {
        // The synthetic galaxy is generated with a central black hole, so its
        // mass is always fitted there.
        fit_black_hole: args.fit_black_hole || source == GalaxySource::Synthetic,
        source,
        model_spec: args.model,
        rc_min: args.rc_min,
        rc_max: args.rc_max,
        rc_steps: args.rc_steps,
        sample_count: args.sample_count,
        sample_seed: args.seed,
        top_n: args.top,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_results: args.export.clone(),
        export_curve: args.export_curve.clone(),
    })
}

/// Rewrite argv so `rot` defaults to `rot tui`.
///
/// Rules:
/// - `rot`                      -> `rot tui`
/// - `rot -f FILE ...`          -> `rot tui -f FILE ...`
/// - `rot --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "fit" | "outliers" | "plot" | "tui" | "fetch"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
