//! Command-line parsing for the temperature-anomaly curve fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ModelKind;

pub mod picker;

/// Environment variable (or `.env` entry) naming the input CSV.
pub const CSV_ENV: &str = "ANOMFIT_CSV";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "anomfit", version, about = "Temperature anomaly curve fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the curve once, print parameters and statistics, and optionally plot/export.
    Fit(FitArgs),
    /// Fit every year independently and print one row per year.
    Scan(ScanArgs),
    /// Plot a previously exported fit JSON.
    Plot(PlotArgs),
    /// Launch the interactive TUI with a year slider.
    ///
    /// This uses the same underlying fit pipeline as `anomfit fit`, but renders
    /// results in a terminal UI using Ratatui.
    Tui(TuiArgs),
    /// Write a synthetic monthly anomaly CSV.
    Synth(SynthArgs),
}

/// Input + model options shared by every command that reads the CSV.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Input CSV (header row; columns: source, YYYY-MM-DD date, anomaly).
    #[arg(short = 'f', long = "csv", value_name = "CSV", env = CSV_ENV)]
    pub csv: Option<PathBuf>,

    /// Model function to fit.
    #[arg(long, value_enum, default_value_t = ModelKind::Literal)]
    pub model: ModelKind,

    /// Maximum solver iterations (at least 1).
    #[arg(long, default_value_t = 200, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub max_iter: usize,
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Fit only the rows of this year (default: the whole series).
    #[arg(short = 'y', long)]
    pub year: Option<i32>,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export per-sample residuals to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the fit (model + params + statistics + curve grid) to JSON.
    #[arg(long = "export-fit", value_name = "JSON")]
    pub export_fit: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ScanArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// First year to scan (default: first year in the file).
    #[arg(long)]
    pub from: Option<i32>,

    /// Last year to scan (default: last year in the file).
    #[arg(long)]
    pub to: Option<i32>,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Initial slider year.
    #[arg(short = 'y', long, default_value_t = crate::tui::DEFAULT_YEAR)]
    pub year: i32,
}

/// Options for plotting a saved fit.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Fit JSON file produced by `anomfit fit --export-fit`.
    #[arg(long, value_name = "JSON")]
    pub fit: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args)]
pub struct SynthArgs {
    /// Output CSV path.
    #[arg(short = 'o', long, value_name = "CSV", default_value = crate::app::DEFAULT_CSV)]
    pub output: PathBuf,

    #[arg(long, default_value_t = 1880)]
    pub start_year: i32,

    #[arg(long, default_value_t = 2016)]
    pub end_year: i32,

    /// Random seed (same seed, same file).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
