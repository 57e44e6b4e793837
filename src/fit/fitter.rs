//! Nonlinear least-squares calibration of a single model.
//!
//! Given:
//! - time values `t_i` (days)
//! - observed anomalies `y_i`
//! - a `CurveModel`
//!
//! we run Levenberg–Marquardt from the model's initial guess and attach a
//! covariance estimate built from the Jacobian at the solution.

use nalgebra::{DMatrix, DVector};

use crate::domain::FitResult;
use crate::error::FitError;
use crate::math::{LeastSquaresProblem, SolverOptions, covariance_from_jacobian, levenberg_marquardt};
use crate::models::CurveModel;

/// Residuals `f(t_i) - y_i` for one model over one selection.
struct CurveProblem<'a> {
    model: &'a dyn CurveModel,
    t: &'a [f64],
    y: &'a [f64],
}

impl LeastSquaresProblem for CurveProblem<'_> {
    fn param_count(&self) -> usize {
        self.model.param_count()
    }

    fn residual_count(&self) -> usize {
        self.t.len()
    }

    fn residuals(&self, params: &DVector<f64>) -> DVector<f64> {
        let p = params.as_slice();
        DVector::from_iterator(
            self.t.len(),
            self.t.iter().zip(self.y).map(|(&t, &y)| self.model.eval(t, p) - y),
        )
    }

    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64> {
        let p = params.as_slice();
        let k = self.param_count();
        let mut j = DMatrix::<f64>::zeros(self.t.len(), k);
        let mut row = vec![0.0; k];
        for (i, &t) in self.t.iter().enumerate() {
            self.model.gradient(t, p, &mut row);
            for (col, v) in row.iter().enumerate() {
                j[(i, col)] = *v;
            }
        }
        j
    }
}

/// Fit `model` to `(t, y)`.
///
/// Fails, rather than returning degenerate parameters, when the arrays differ in
/// length, hold fewer points than parameters, contain non-finite values, or the
/// solver cannot reach a well-defined minimum.
pub fn fit_curve(
    model: &dyn CurveModel,
    t: &[f64],
    y: &[f64],
    opts: &SolverOptions,
) -> Result<FitResult, FitError> {
    if t.len() != y.len() {
        return Err(FitError::LengthMismatch {
            times: t.len(),
            values: y.len(),
        });
    }
    let k = model.param_count();
    if t.len() < k {
        return Err(FitError::InsufficientData {
            got: t.len(),
            required: k,
        });
    }
    if t.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(FitError::NonFiniteInput);
    }

    let problem = CurveProblem { model, t, y };
    let initial = DVector::from_vec(model.initial_guess());
    let report = levenberg_marquardt(&problem, initial, opts)?;

    if report.params.iter().any(|v| !v.is_finite()) || !report.cost.is_finite() {
        return Err(FitError::NonFiniteParameters);
    }

    let cov = covariance_from_jacobian(&report.jacobian, report.cost);
    if cov.rank == 0 {
        return Err(FitError::SingularJacobian);
    }
    if cov.rank < k {
        log::warn!(
            "{} model: Jacobian rank {} < {k}; some parameters are not identified by this data",
            model.kind().display_name(),
            cov.rank
        );
    }

    log::debug!(
        "{} model: n={} iterations={} sse={:.6e} termination={:?}",
        model.kind().display_name(),
        t.len(),
        report.iterations,
        report.cost,
        report.termination
    );

    Ok(FitResult {
        model: model.kind(),
        params: report.params.iter().copied().collect(),
        std_errors: cov.std_errors(),
        covariance: cov.to_rows(),
        sse: report.cost,
        n: t.len(),
        iterations: report.iterations,
        rank: cov.rank,
        termination: report.termination,
    })
}
