//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::math::SolverOptions;

/// One monthly observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub date: NaiveDate,
    /// Temperature anomaly in °C.
    pub anomaly: f64,
}

/// The loaded series, in file order.
///
/// The loader never sorts or deduplicates: index `i` here is row `i` of the file.
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    pub samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Date of the first row; the origin of the time axis.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.samples.first().map(|s| s.date)
    }

    /// Whole days elapsed since the first sample, one value per sample.
    pub fn time_axis(&self) -> Vec<f64> {
        let Some(origin) = self.first_date() else {
            return Vec::new();
        };
        self.samples
            .iter()
            .map(|s| (s.date - origin).num_days() as f64)
            .collect()
    }

    /// Distinct years present in the series, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.samples.iter().map(|s| s.date.year()).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// `true` when dates never decrease from one row to the next.
    pub fn is_chronological(&self) -> bool {
        self.samples.windows(2).all(|w| w[0].date <= w[1].date)
    }
}

/// Which model function to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// `a·cos(t)·(2π·t + b) + c`, exactly as the analysis was first written.
    Literal,
    /// `a·cos(2π·t/365.25 + b) + c`, a one-year sinusoid on the day axis.
    Annual,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Literal => "literal",
            ModelKind::Annual => "annual sinusoid",
        }
    }

    pub fn formula(self) -> &'static str {
        match self {
            ModelKind::Literal => "a*cos(t)*(2*pi*t + b) + c",
            ModelKind::Annual => "a*cos(2*pi*t/365.25 + b) + c",
        }
    }
}

/// Which part of the series a fit covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "year")]
pub enum Selection {
    All,
    Year(i32),
}

impl Selection {
    pub fn label(self) -> String {
        match self {
            Selection::All => "all years".to_string(),
            Selection::Year(y) => format!("year {y}"),
        }
    }
}

impl From<Option<i32>> for Selection {
    fn from(value: Option<i32>) -> Self {
        value.map(Selection::Year).unwrap_or(Selection::All)
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Residuals are zero to machine precision.
    ExactFit,
    /// Relative reduction of the cost fell below `ftol`.
    CostTolerance,
    /// Relative step size fell below `xtol`.
    StepTolerance,
    /// Scaled gradient fell below `gtol`.
    GradientTolerance,
}

/// Output of the least-squares fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    pub model: ModelKind,
    /// Point estimates in model order (`a`, `b`, `c`).
    pub params: Vec<f64>,
    /// Square roots of the covariance diagonal; `inf` with no degrees of freedom.
    #[serde(with = "super::float_json::vec")]
    pub std_errors: Vec<f64>,
    /// Row-major covariance estimate.
    #[serde(with = "super::float_json::matrix")]
    pub covariance: Vec<Vec<f64>>,
    pub sse: f64,
    pub n: usize,
    pub iterations: usize,
    /// Numerical rank of the Jacobian at the solution.
    pub rank: usize,
    pub termination: Termination,
}

/// Statistics derived from a fit on one selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitSummary {
    /// Population standard deviation of the residuals.
    pub residual_error: f64,
    /// Location (days) of the local minimum found from the mean time.
    pub min_t: f64,
    /// Curve value at `min_t`.
    #[serde(with = "super::float_json::scalar")]
    pub min_anomaly: f64,
    /// Whether the local search met its gradient tolerance.
    pub min_converged: bool,
    /// Arithmetic mean of the observed values.
    pub average: f64,
    /// `a·cos(b)·2π + c`; a fixed heuristic, not a derivative.
    pub slope: f64,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub csv_path: PathBuf,
    pub model: ModelKind,
    pub solver: SolverOptions,
    pub selection: Selection,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_residuals: Option<PathBuf>,
    pub export_fit: Option<PathBuf>,
}

/// A saved fit file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub formula: String,
    pub selection: Selection,
    /// Day zero of the time axis.
    pub origin: NaiveDate,
    pub fit: FitResult,
    pub summary: FitSummary,
    pub grid: CurveGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub t_days: Vec<f64>,
    pub y: Vec<f64>,
}
