//! Levenberg–Marquardt nonlinear least squares.
//!
//! Minimizes `cost(p) = Σ r_i(p)²` for a problem that supplies residuals and
//! their Jacobian. Each iteration solves the damped Gauss–Newton system
//!
//! ```text
//! (JᵀJ + λ·diag(JᵀJ)) δ = -Jᵀr
//! ```
//!
//! and adapts `λ`: a step that lowers the cost is accepted and `λ` shrinks, a
//! step that does not is rejected and `λ` grows. Termination follows the usual
//! MINPACK-style tests on cost reduction, step size and the scaled gradient.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::domain::Termination;
use crate::error::FitError;
use crate::math::solve_least_squares;

const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e16;
const LAMBDA_UP: f64 = 10.0;
const LAMBDA_DOWN: f64 = 10.0;

/// Floor for damping entries relative to the largest diagonal of `JᵀJ`.
const DIAG_FLOOR_REL: f64 = 1e-12;

/// A least-squares problem in residual form.
///
/// Residuals are `model - observed`, so the Jacobian is the model gradient.
pub trait LeastSquaresProblem {
    fn param_count(&self) -> usize;

    fn residual_count(&self) -> usize;

    fn residuals(&self, params: &DVector<f64>) -> DVector<f64>;

    /// `residual_count × param_count` matrix of `∂r_i/∂p_j`.
    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64>;
}

/// Solver settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    pub max_iter: usize,
    /// Relative cost reduction tolerance.
    pub ftol: f64,
    /// Relative step size tolerance.
    pub xtol: f64,
    /// Scaled gradient tolerance.
    pub gtol: f64,
    pub initial_lambda: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iter: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-10,
            initial_lambda: 1e-3,
        }
    }
}

/// Solver output.
#[derive(Debug, Clone)]
pub struct LmReport {
    pub params: DVector<f64>,
    pub residuals: DVector<f64>,
    /// Jacobian evaluated at `params`.
    pub jacobian: DMatrix<f64>,
    /// Sum of squared residuals at `params`.
    pub cost: f64,
    pub iterations: usize,
    pub termination: Termination,
}

/// Run Levenberg–Marquardt from `initial`.
pub fn levenberg_marquardt<P: LeastSquaresProblem>(
    problem: &P,
    initial: DVector<f64>,
    opts: &SolverOptions,
) -> Result<LmReport, FitError> {
    if initial.len() != problem.param_count() {
        return Err(FitError::LengthMismatch {
            times: problem.param_count(),
            values: initial.len(),
        });
    }

    let mut x = initial;
    let mut r = problem.residuals(&x);
    let mut cost = r.norm_squared();
    if !cost.is_finite() {
        return Err(FitError::NonFiniteParameters);
    }

    let mut lambda = opts.initial_lambda.max(LAMBDA_MIN);

    for iter in 1..=opts.max_iter {
        let j = problem.jacobian(&x);
        if j.iter().any(|v| !v.is_finite()) {
            return Err(FitError::NonFiniteParameters);
        }

        if cost <= f64::MIN_POSITIVE {
            return Ok(finish(problem, x, r, cost, iter - 1, Termination::ExactFit));
        }

        let g = j.transpose() * &r;
        if scaled_gradient(&j, &g, cost.sqrt()) <= opts.gtol {
            return Ok(report(x, r, j, cost, iter - 1, Termination::GradientTolerance));
        }

        let a = j.transpose() * &j;
        let diag_max = a.diagonal().iter().fold(0.0_f64, |m, v| m.max(*v));
        let floor = (diag_max * DIAG_FLOOR_REL).max(f64::MIN_POSITIVE);

        loop {
            let mut damped = a.clone();
            for k in 0..damped.nrows() {
                damped[(k, k)] += lambda * a[(k, k)].max(floor);
            }

            let Some(delta) = solve_least_squares(&damped, &(-&g)) else {
                lambda *= LAMBDA_UP;
                if lambda > LAMBDA_MAX {
                    return Err(FitError::SingularJacobian);
                }
                continue;
            };

            let step_small = delta.norm() <= opts.xtol * (x.norm() + opts.xtol);

            let x_new = &x + &delta;
            let r_new = problem.residuals(&x_new);
            let cost_new = r_new.norm_squared();

            let actual = cost - cost_new;
            if cost_new.is_finite() && actual > 0.0 {
                // Reduction predicted by the linearized model ||r + Jδ||².
                let predicted = -(2.0 * delta.dot(&g) + delta.dot(&(&a * &delta)));

                x = x_new;
                r = r_new;
                cost = cost_new;
                lambda = (lambda / LAMBDA_DOWN).max(LAMBDA_MIN);

                if actual <= opts.ftol * (cost + actual) && predicted.abs() <= opts.ftol * (cost + actual) {
                    return Ok(finish(problem, x, r, cost, iter, Termination::CostTolerance));
                }
                if step_small {
                    return Ok(finish(problem, x, r, cost, iter, Termination::StepTolerance));
                }
                break;
            }

            // Rejected: any further step would be at roundoff level.
            if step_small {
                return Ok(report(x, r, j, cost, iter, Termination::StepTolerance));
            }

            lambda *= LAMBDA_UP;
            if lambda > LAMBDA_MAX {
                return Ok(report(x, r, j, cost, iter, Termination::StepTolerance));
            }
        }
    }

    log::warn!("Levenberg-Marquardt hit the iteration limit ({})", opts.max_iter);
    Err(FitError::NotConverged(opts.max_iter))
}

fn finish<P: LeastSquaresProblem>(
    problem: &P,
    x: DVector<f64>,
    r: DVector<f64>,
    cost: f64,
    iterations: usize,
    termination: Termination,
) -> LmReport {
    let j = problem.jacobian(&x);
    report(x, r, j, cost, iterations, termination)
}

fn report(
    params: DVector<f64>,
    residuals: DVector<f64>,
    jacobian: DMatrix<f64>,
    cost: f64,
    iterations: usize,
    termination: Termination,
) -> LmReport {
    LmReport {
        params,
        residuals,
        jacobian,
        cost,
        iterations,
        termination,
    }
}

/// Largest `|J_jᵀ r| / (‖J_j‖ ‖r‖)` over columns; `0` for zero columns.
fn scaled_gradient(j: &DMatrix<f64>, g: &DVector<f64>, r_norm: f64) -> f64 {
    if r_norm == 0.0 {
        return 0.0;
    }
    let mut worst = 0.0_f64;
    for (k, col) in j.column_iter().enumerate() {
        let col_norm = col.norm();
        if col_norm == 0.0 {
            continue;
        }
        worst = worst.max(g[k].abs() / (col_norm * r_norm));
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fit `y = p0 · exp(p1 · x)`.
    struct ExpDecay {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl LeastSquaresProblem for ExpDecay {
        fn param_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            self.x.len()
        }

        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_iterator(
                self.x.len(),
                self.x.iter().zip(&self.y).map(|(&x, &y)| p[0] * (p[1] * x).exp() - y),
            )
        }

        fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
            let mut j = DMatrix::zeros(self.x.len(), 2);
            for (i, &x) in self.x.iter().enumerate() {
                let e = (p[1] * x).exp();
                j[(i, 0)] = e;
                j[(i, 1)] = p[0] * x * e;
            }
            j
        }
    }

    #[test]
    fn recovers_exponential_parameters() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
        let y = x.iter().map(|&x| 3.0 * (-0.7 * x).exp()).collect();
        let problem = ExpDecay { x, y };

        let out = levenberg_marquardt(&problem, DVector::from_vec(vec![1.0, -0.1]), &SolverOptions::default())
            .unwrap();
        assert!((out.params[0] - 3.0).abs() < 1e-8, "p0 = {}", out.params[0]);
        assert!((out.params[1] + 0.7).abs() < 1e-8, "p1 = {}", out.params[1]);
        assert!(out.cost < 1e-16);
    }

    #[test]
    fn iteration_limit_is_reported() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
        let y = x.iter().map(|&x| 3.0 * (-0.7 * x).exp()).collect();
        let problem = ExpDecay { x, y };
        let opts = SolverOptions {
            max_iter: 1,
            ..SolverOptions::default()
        };

        let err = levenberg_marquardt(&problem, DVector::from_vec(vec![1.0, -0.1]), &opts).unwrap_err();
        assert_eq!(err, FitError::NotConverged(1));
    }

    #[test]
    fn zero_gradient_start_is_already_converged() {
        let problem = ExpDecay {
            x: vec![0.0, 1.0, 2.0],
            y: vec![0.0, 0.0, 0.0],
        };
        let out = levenberg_marquardt(&problem, DVector::from_vec(vec![0.0, 0.5]), &SolverOptions::default())
            .unwrap();
        assert_eq!(out.termination, Termination::ExactFit);
        assert_eq!(out.iterations, 0);
    }
}
