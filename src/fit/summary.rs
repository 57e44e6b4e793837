//! Statistics derived from a fitted curve.
//!
//! - residual error: population std-dev of `observed - fitted`
//! - local minimum of the curve, searched from the mean time of the selection
//! - average observed anomaly
//! - slope heuristic `a·cos(b)·2π + c` (a fixed formula, not a derivative)

use std::f64::consts::PI;

use crate::domain::{FitResult, FitSummary};
use crate::math::{ScalarMinOptions, mean, minimize_scalar, std_dev};
use crate::models::CurveModel;

/// Observed-minus-fitted residuals.
pub fn residuals(model: &dyn CurveModel, fit: &FitResult, t: &[f64], y: &[f64]) -> Vec<f64> {
    t.iter()
        .zip(y)
        .map(|(&t, &y)| y - model.eval(t, &fit.params))
        .collect()
}

/// `a·cos(b)·2π + c`.
pub fn slope_heuristic(params: &[f64]) -> f64 {
    params[0] * params[1].cos() * 2.0 * PI + params[2]
}

/// Derive the reported statistics from a fit.
///
/// `t` and `y` are the points `fit` was computed from, so they are non-empty.
pub fn summarize(model: &dyn CurveModel, fit: &FitResult, t: &[f64], y: &[f64]) -> FitSummary {
    let res = residuals(model, fit, t, y);
    let residual_error = std_dev(&res).unwrap_or(f64::NAN);
    let average = mean(y).unwrap_or(f64::NAN);
    let t_mean = mean(t).unwrap_or(0.0);

    let min = minimize_scalar(|x| model.eval(x, &fit.params), t_mean, &ScalarMinOptions::default());
    if !min.converged {
        log::warn!(
            "local minimum search from t={t_mean:.1} stopped after {} iterations without meeting tolerance",
            min.iterations
        );
    }

    FitSummary {
        residual_error,
        min_t: min.x,
        min_anomaly: min.value,
        min_converged: min.converged,
        average,
        slope: slope_heuristic(&fit.params),
    }
}
