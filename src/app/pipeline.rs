//! Shared "fit pipeline" logic used by the CLI, the batch scan and the TUI.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! series -> time axis -> selection -> fit -> derived statistics
//!
//! The front-ends then only deal with presentation (printing vs widgets).

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;

use crate::domain::{FitResult, FitSummary, ModelKind, RunConfig, Selection, TimeSeries};
use crate::error::{AppError, FitError};
use crate::fit::{fit_curve, selection_indices, summarize};
use crate::io::load_series;
use crate::math::SolverOptions;
use crate::models::model_for;

/// A selection that was fitted successfully.
#[derive(Debug, Clone)]
pub struct FittedSelection {
    pub selection: Selection,
    /// Day zero of the time axis (first sample of the whole series).
    pub origin: NaiveDate,
    pub dates: Vec<NaiveDate>,
    pub t: Vec<f64>,
    pub y: Vec<f64>,
    pub fit: FitResult,
    pub summary: FitSummary,
}

/// One observed point next to its fitted value.
#[derive(Debug, Clone, Copy)]
pub struct ResidualRow {
    pub date: NaiveDate,
    pub t: f64,
    pub observed: f64,
    pub fitted: f64,
    pub residual: f64,
}

impl FittedSelection {
    pub fn rows(&self) -> Vec<ResidualRow> {
        let model = model_for(self.fit.model);
        self.dates
            .iter()
            .zip(&self.t)
            .zip(&self.y)
            .map(|((&date, &t), &observed)| {
                let fitted = model.eval(t, &self.fit.params);
                ResidualRow {
                    date,
                    t,
                    observed,
                    fitted,
                    residual: observed - fitted,
                }
            })
            .collect()
    }

    /// Time range covered by the selection, widened when it is a single day.
    pub fn t_range(&self) -> (f64, f64) {
        let lo = self.t.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = self.t.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !(lo.is_finite() && hi.is_finite()) {
            return (0.0, 1.0);
        }
        if hi - lo < 1.0 { (lo - 1.0, hi + 1.0) } else { (lo, hi) }
    }

    /// Calendar date for a time-axis value.
    pub fn date_at(&self, t: f64) -> NaiveDate {
        date_at(self.origin, t)
    }
}

/// Calendar date `t` whole days after `origin` (saturating at the origin).
pub fn date_at(origin: NaiveDate, t: f64) -> NaiveDate {
    if !t.is_finite() {
        return origin;
    }
    origin
        .checked_add_signed(Duration::days(t.round() as i64))
        .unwrap_or(origin)
}

/// Result of running the pipeline on one selection.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub selection: Selection,
    pub n_samples: usize,
    pub outcome: Result<FittedSelection, FitError>,
}

/// All computed outputs of a single `anomfit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub series: TimeSeries,
    pub analysis: Analysis,
}

/// Load the CSV named in `config` and analyze the configured selection.
pub fn run_fit(config: &RunConfig) -> Result<RunOutput, AppError> {
    let series = load_series(&config.csv_path)?;
    let analysis = analyze(&series, config.selection, config.model, &config.solver);
    Ok(RunOutput { series, analysis })
}

/// Fit one selection of the series and derive its statistics.
///
/// Never fails as a whole: a selection that cannot be fitted yields an
/// `Analysis` whose outcome carries the reason.
pub fn analyze(series: &TimeSeries, selection: Selection, model: ModelKind, solver: &SolverOptions) -> Analysis {
    let idx = selection_indices(series, selection);
    let n_samples = idx.len();
    let outcome = fit_selection(series, selection, &idx, model, solver);
    if let Err(e) = &outcome {
        log::debug!("{}: fit unavailable: {e}", selection.label());
    }
    Analysis {
        selection,
        n_samples,
        outcome,
    }
}

fn fit_selection(
    series: &TimeSeries,
    selection: Selection,
    idx: &[usize],
    model: ModelKind,
    solver: &SolverOptions,
) -> Result<FittedSelection, FitError> {
    if idx.is_empty() {
        if let Selection::Year(year) = selection {
            return Err(FitError::EmptySelection(year));
        }
    }
    let model = model_for(model);
    let Some(origin) = series.first_date() else {
        return Err(FitError::InsufficientData {
            got: 0,
            required: model.param_count(),
        });
    };

    // The selection keeps the whole-series time axis.
    let axis = series.time_axis();
    let t: Vec<f64> = idx.iter().map(|&i| axis[i]).collect();
    let y: Vec<f64> = idx.iter().map(|&i| series.samples[i].anomaly).collect();
    let dates = idx.iter().map(|&i| series.samples[i].date).collect();

    let fit = fit_curve(model, &t, &y, solver)?;
    let summary = summarize(model, &fit, &t, &y);

    Ok(FittedSelection {
        selection,
        origin,
        dates,
        t,
        y,
        fit,
        summary,
    })
}

/// Analyze every year in `years` independently (in parallel), in input order.
pub fn scan_years(series: &TimeSeries, years: &[i32], model: ModelKind, solver: &SolverOptions) -> Vec<Analysis> {
    years
        .par_iter()
        .map(|&year| analyze(series, Selection::Year(year), model, solver))
        .collect()
}
