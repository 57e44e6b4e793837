//! Model functions `f(t; a, b, c)`.
//!
//! The fitter relies on three primitive operations per model:
//! - evaluate `f(t)` for given parameters (residuals, plots, the minimum search)
//! - fill the gradient row `∂f/∂(a, b, c)` at `t` (the solver's Jacobian)
//! - an initial guess
//!
//! `t` is always in days since the first sample.

use std::f64::consts::PI;

use crate::domain::ModelKind;

/// Days per year used by the annual model.
const YEAR_DAYS: f64 = 365.25;

/// A parametric curve the fitter can calibrate.
pub trait CurveModel: Sync {
    fn kind(&self) -> ModelKind;

    fn param_names(&self) -> &'static [&'static str] {
        &["a", "b", "c"]
    }

    fn param_count(&self) -> usize {
        self.param_names().len()
    }

    fn eval(&self, t: f64, params: &[f64]) -> f64;

    /// Write `∂f/∂p_j` at `t` into `out` (length `param_count()`).
    fn gradient(&self, t: f64, params: &[f64], out: &mut [f64]);

    fn initial_guess(&self) -> Vec<f64> {
        vec![1.0; self.param_count()]
    }
}

/// `a·cos(t)·(2π·t + b) + c`.
///
/// Kept exactly as the analysis has always computed it, including the `cos(t)`
/// factor multiplying a linear term.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralCosine;

impl CurveModel for LiteralCosine {
    fn kind(&self) -> ModelKind {
        ModelKind::Literal
    }

    fn eval(&self, t: f64, p: &[f64]) -> f64 {
        p[0] * t.cos() * (2.0 * PI * t + p[1]) + p[2]
    }

    fn gradient(&self, t: f64, p: &[f64], out: &mut [f64]) {
        let cos_t = t.cos();
        out[0] = cos_t * (2.0 * PI * t + p[1]);
        out[1] = p[0] * cos_t;
        out[2] = 1.0;
    }
}

/// `a·cos(2π·t/365.25 + b) + c`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnualCycle;

impl CurveModel for AnnualCycle {
    fn kind(&self) -> ModelKind {
        ModelKind::Annual
    }

    fn eval(&self, t: f64, p: &[f64]) -> f64 {
        p[0] * (2.0 * PI * t / YEAR_DAYS + p[1]).cos() + p[2]
    }

    fn gradient(&self, t: f64, p: &[f64], out: &mut [f64]) {
        let phase = 2.0 * PI * t / YEAR_DAYS + p[1];
        out[0] = phase.cos();
        out[1] = -p[0] * phase.sin();
        out[2] = 1.0;
    }
}

static LITERAL: LiteralCosine = LiteralCosine;
static ANNUAL: AnnualCycle = AnnualCycle;

/// The model implementation for a kind.
pub fn model_for(kind: ModelKind) -> &'static dyn CurveModel {
    match kind {
        ModelKind::Literal => &LITERAL,
        ModelKind::Annual => &ANNUAL,
    }
}

/// Evaluate `f(t)` for the given model kind.
pub fn predict(kind: ModelKind, t: f64, params: &[f64]) -> f64 {
    model_for(kind).eval(t, params)
}
