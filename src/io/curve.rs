//! Read/write fit JSON files.
//!
//! A fit JSON is the portable representation of one fit:
//! - model formula, parameters, standard errors and covariance
//! - the derived statistics
//! - a precomputed curve grid for quick plotting
//!
//! The schema is defined by `domain::FitFile`.

use std::fs::File;
use std::path::Path;

use crate::app::pipeline::FittedSelection;
use crate::domain::{CurveGrid, FitFile};
use crate::error::AppError;
use crate::models::predict;

const GRID_POINTS: usize = 201;

/// Build the serializable fit description.
pub fn fit_file(fitted: &FittedSelection) -> FitFile {
    let (t0, t1) = fitted.t_range();
    let (t_days, y) = build_grid(fitted, t0, t1, GRID_POINTS);
    FitFile {
        tool: "anomfit".to_string(),
        formula: fitted.fit.model.formula().to_string(),
        selection: fitted.selection,
        origin: fitted.origin,
        fit: fitted.fit.clone(),
        summary: fitted.summary.clone(),
        grid: CurveGrid { t_days, y },
    }
}

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, fitted: &FittedSelection) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create fit JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, &fit_file(fitted))
        .map_err(|e| AppError::input(format!("Failed to write fit JSON: {e}")))?;
    log::info!("wrote fit to {}", path.display());
    Ok(())
}

/// Read a fit JSON file.
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open fit JSON '{}': {e}", path.display())))?;
    let fit: FitFile =
        serde_json::from_reader(file).map_err(|e| AppError::input(format!("Invalid fit JSON: {e}")))?;
    Ok(fit)
}

fn build_grid(fitted: &FittedSelection, t0: f64, t1: f64, n: usize) -> (Vec<f64>, Vec<f64>) {
    let n = n.max(2);
    let mut t_days = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);

    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let t = t0 + u * (t1 - t0);
        t_days.push(t);
        y.push(predict(fitted.fit.model, t, &fitted.fit.params));
    }

    (t_days, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::analyze;
    use crate::domain::{ModelKind, Sample, Selection, TimeSeries};
    use crate::math::SolverOptions;
    use chrono::NaiveDate;

    #[test]
    fn fit_file_survives_json() {
        let samples = (1..=12)
            .map(|m| Sample {
                date: NaiveDate::from_ymd_opt(1990, m, 15).unwrap(),
                anomaly: 0.25,
            })
            .collect();
        let series = TimeSeries::new(samples);
        let analysis = analyze(&series, Selection::Year(1990), ModelKind::Literal, &SolverOptions::default());
        let fitted = analysis.outcome.unwrap();

        let file = fit_file(&fitted);
        assert_eq!(file.grid.t_days.len(), GRID_POINTS);
        assert_eq!(file.grid.t_days[0], 0.0);

        let json = serde_json::to_string(&file).unwrap();
        let back: FitFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.selection, Selection::Year(1990));
        assert_eq!(back.origin, NaiveDate::from_ymd_opt(1990, 1, 15).unwrap());
        assert_eq!(back.fit.params.len(), 3);
    }
}
