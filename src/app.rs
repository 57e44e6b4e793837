//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments (and `.env`)
//! - resolves the input CSV
//! - runs the fit pipeline
//! - prints reports/plots and writes optional exports

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::cli::{Command, FitArgs, InputArgs, PlotArgs, ScanArgs, SynthArgs, TuiArgs};
use crate::data::SynthConfig;
use crate::domain::{RunConfig, Selection};
use crate::error::AppError;
use crate::math::SolverOptions;

pub mod pipeline;

/// CSV used when neither `-f` nor `ANOMFIT_CSV` is given.
pub const DEFAULT_CSV: &str = "monthly_csv.csv";

/// Entry point for the `anomfit` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` must be loaded before clap reads `ANOMFIT_CSV`.
    match dotenvy::dotenv() {
        Ok(path) => log::debug!("loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("ignoring unreadable .env file: {e}"),
    }

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Scan(args) => handle_scan(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args),
        Command::Synth(args) => handle_synth(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let run = pipeline::run_fit(&config)?;
    let fitted = run.analysis.outcome?;

    println!("{}", crate::report::format_run_summary(&run.series, &fitted, &config));

    if config.plot {
        println!(
            "{}",
            crate::plot::render_fit_plot(&fitted, config.plot_width, config.plot_height)
        );
    }

    if let Some(path) = &config.export_residuals {
        crate::io::write_residuals_csv(path, &fitted)?;
    }
    if let Some(path) = &config.export_fit {
        crate::io::write_fit_json(path, &fitted)?;
    }

    Ok(())
}

fn handle_scan(args: ScanArgs) -> Result<(), AppError> {
    let csv_path = resolve_csv_path(&args.input)?;
    let series = crate::io::load_series(&csv_path)?;
    let solver = solver_from_args(&args.input);

    let present = series.years();
    let from = args.from.or(present.first().copied()).unwrap_or(0);
    let to = args.to.or(present.last().copied()).unwrap_or(from);
    if to < from {
        return Err(AppError::input(format!("Empty year range {from}..{to}")));
    }
    let years: Vec<i32> = (from..=to).collect();

    let analyses = pipeline::scan_years(&series, &years, args.input.model, &solver);
    let failed = analyses.iter().filter(|a| a.outcome.is_err()).count();
    log::info!("scanned {} years, {failed} without a fit", years.len());

    println!(
        "Model: {} | f(t) = {}\n",
        args.input.model.display_name(),
        args.input.model.formula()
    );
    print!("{}", crate::report::format_scan_table(&analyses));
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let csv_path = resolve_csv_path(&args.input)?;
    // Load before entering the alternate screen so input errors print normally.
    let series = crate::io::load_series(&csv_path)?;

    crate::tui::run(crate::tui::Session {
        series,
        csv_path,
        model: args.input.model,
        solver: solver_from_args(&args.input),
        year: args.year,
    })
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::read_fit_json(&args.fit)?;
    println!(
        "{} | f(t) = {}",
        file.selection.label(),
        file.formula
    );
    println!("{}", crate::plot::render_fit_file_plot(&file, args.width, args.height));
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let config = SynthConfig {
        start_year: args.start_year,
        end_year: args.end_year,
        seed: args.seed,
        ..SynthConfig::default()
    };
    let series = crate::data::write_synth_csv(&args.output, &config)?;
    println!("Wrote {} samples to {}", series.len(), args.output.display());
    Ok(())
}

/// Build the run configuration for `anomfit fit`.
pub fn run_config_from_args(args: &FitArgs) -> Result<RunConfig, AppError> {
    Ok(RunConfig {
        csv_path: resolve_csv_path(&args.input)?,
        model: args.input.model,
        solver: solver_from_args(&args.input),
        selection: Selection::from(args.year),
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_residuals: args.export.clone(),
        export_fit: args.export_fit.clone(),
    })
}

fn solver_from_args(input: &InputArgs) -> SolverOptions {
    SolverOptions {
        max_iter: input.max_iter,
        ..SolverOptions::default()
    }
}

/// Pick the input CSV: `-f`/`ANOMFIT_CSV`, then the default file, then the picker.
fn resolve_csv_path(input: &InputArgs) -> Result<PathBuf, AppError> {
    if let Some(path) = &input.csv {
        return Ok(path.clone());
    }
    let default = Path::new(DEFAULT_CSV);
    if default.exists() {
        return Ok(default.to_path_buf());
    }
    if std::io::stdin().is_terminal() {
        return crate::cli::picker::prompt_for_csv_path();
    }
    Err(AppError::input(format!(
        "No input CSV: pass -f <file.csv>, set {}, or create {DEFAULT_CSV} (see `anomfit synth`).",
        crate::cli::CSV_ENV
    )))
}

/// Rewrite argv so `anomfit` defaults to `anomfit tui`.
///
/// Rules:
/// - `anomfit`                     -> `anomfit tui`
/// - `anomfit -f data.csv ...`     -> `anomfit tui -f data.csv ...`
/// - `anomfit --help/--version/-h` -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(argv(&["anomfit"])), argv(&["anomfit", "tui"]));
    }

    #[test]
    fn leading_flag_goes_to_tui() {
        assert_eq!(
            rewrite_args(argv(&["anomfit", "-f", "x.csv"])),
            argv(&["anomfit", "tui", "-f", "x.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        assert_eq!(rewrite_args(argv(&["anomfit", "fit", "-y", "1950"])), argv(&["anomfit", "fit", "-y", "1950"]));
        assert_eq!(rewrite_args(argv(&["anomfit", "--help"])), argv(&["anomfit", "--help"]));
    }

    #[test]
    fn fit_args_map_to_run_config() {
        let cli = crate::cli::Cli::parse_from(argv(&[
            "anomfit",
            "fit",
            "-f",
            "data.csv",
            "--year",
            "1950",
            "--model",
            "annual",
            "--no-plot",
            "--export-fit",
            "fit.json",
        ]));
        let Command::Fit(args) = cli.command else {
            panic!("expected fit subcommand");
        };

        let config = run_config_from_args(&args).unwrap();
        assert_eq!(config.csv_path, PathBuf::from("data.csv"));
        assert_eq!(config.selection, Selection::Year(1950));
        assert_eq!(config.model, crate::domain::ModelKind::Annual);
        assert!(!config.plot);
        assert_eq!(config.export_fit, Some(PathBuf::from("fit.json")));
        assert_eq!(config.solver.max_iter, 200);
    }

    #[test]
    fn zero_max_iter_is_rejected() {
        let err = crate::cli::Cli::try_parse_from(argv(&["anomfit", "fit", "--max-iter", "0"])).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let cli = crate::cli::Cli::try_parse_from(argv(&["anomfit", "fit", "--max-iter", "1"])).unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit subcommand");
        };
        assert_eq!(solver_from_args(&args.input).max_iter, 1);
    }

    #[test]
    fn tui_defaults_to_year_2000() {
        let cli = crate::cli::Cli::parse_from(rewrite_args(argv(&["anomfit", "-f", "x.csv"])));
        let Command::Tui(args) = cli.command else {
            panic!("expected tui subcommand");
        };
        assert_eq!(args.year, 2000);
    }
}
