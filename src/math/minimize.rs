//! One-dimensional local minimization.
//!
//! Quasi-Newton (BFGS in one dimension, i.e. a secant estimate of the inverse
//! curvature) with an Armijo line search that backtracks or expands, and
//! central-difference derivatives. Starts from a single point and stops in
//! whatever basin it lands in: the result is a local minimum, not a global one.

/// Settings for [`minimize_scalar`].
#[derive(Debug, Clone, Copy)]
pub struct ScalarMinOptions {
    pub max_iter: usize,
    /// Stop once `|f'(x)|` falls below this.
    pub gtol: f64,
}

impl Default for ScalarMinOptions {
    fn default() -> Self {
        Self {
            max_iter: 200,
            gtol: 1e-5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScalarMin {
    pub x: f64,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

const ARMIJO_C: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 60;
const MAX_EXPANSIONS: usize = 60;
/// Inverse-curvature growth factor while the curve bends the wrong way.
const H_GROWTH: f64 = 4.0;
const H_MAX: f64 = 1e12;

pub fn minimize_scalar<F: Fn(f64) -> f64>(f: F, x0: f64, opts: &ScalarMinOptions) -> ScalarMin {
    let mut x = x0;
    let mut fx = f(x);
    let mut g = derivative(&f, x);
    // Inverse curvature estimate; starts at identity.
    let mut h = 1.0_f64;

    for iter in 0..opts.max_iter {
        if !(fx.is_finite() && g.is_finite()) {
            return ScalarMin {
                x,
                value: fx,
                iterations: iter,
                converged: false,
            };
        }

        // A flat gradient only counts as a minimum where the curve is not bending down.
        let stationary = g.abs() <= opts.gtol;
        if stationary && second_derivative(&f, x) >= 0.0 {
            return ScalarMin {
                x,
                value: fx,
                iterations: iter,
                converged: true,
            };
        }

        let (dir, step) = if stationary {
            // On a peak: roll off towards the lower side.
            let h2 = curvature_step(x);
            let dir = if f(x + h2) <= f(x - h2) { 1.0 } else { -1.0 };
            (dir, h2)
        } else {
            (-g.signum(), (h * g.abs()).max(min_step(x)))
        };

        let Some((x_new, f_new)) = line_search(&f, x, fx, dir, step, g * dir) else {
            // No descent at any representable step: we are at the bottom unless sitting on a peak.
            return ScalarMin {
                x,
                value: fx,
                iterations: iter,
                converged: !stationary,
            };
        };

        let g_new = derivative(&f, x_new);
        let s = x_new - x;
        let y = g_new - g;
        if s * y > 0.0 {
            h = s / y;
        } else {
            h = (h * H_GROWTH).min(H_MAX);
        }

        x = x_new;
        fx = f_new;
        g = g_new;
    }

    ScalarMin {
        x,
        value: fx,
        iterations: opts.max_iter,
        converged: g.abs() <= opts.gtol,
    }
}

/// Armijo search along `dir` starting at `step`.
///
/// Backtracks while the first trial is rejected; otherwise keeps doubling while
/// the value keeps dropping, so a poor curvature estimate cannot pin the
/// search to tiny steps.
fn line_search<F: Fn(f64) -> f64>(f: &F, x: f64, fx: f64, dir: f64, step: f64, slope: f64) -> Option<(f64, f64)> {
    let accepts = |alpha: f64, f_try: f64| f_try.is_finite() && f_try < fx && f_try <= fx + ARMIJO_C * alpha * slope;

    let mut alpha = step;
    let mut best = None;
    for _ in 0..MAX_BACKTRACKS {
        let x_try = x + alpha * dir;
        let f_try = f(x_try);
        if accepts(alpha, f_try) {
            best = Some((x_try, f_try));
            break;
        }
        alpha *= 0.5;
    }
    let (mut x_best, mut f_best) = best?;

    for _ in 0..MAX_EXPANSIONS {
        alpha *= 2.0;
        let x_try = x + alpha * dir;
        let f_try = f(x_try);
        if !(accepts(alpha, f_try) && f_try < f_best) {
            break;
        }
        x_best = x_try;
        f_best = f_try;
    }
    Some((x_best, f_best))
}

/// Smallest step worth trying at `x`.
fn min_step(x: f64) -> f64 {
    f64::EPSILON.sqrt() * x.abs().max(1.0)
}

fn derivative<F: Fn(f64) -> f64>(f: &F, x: f64) -> f64 {
    let h = f64::EPSILON.cbrt() * x.abs().max(1.0);
    (f(x + h) - f(x - h)) / (2.0 * h)
}

fn curvature_step(x: f64) -> f64 {
    f64::EPSILON.powf(0.25) * x.abs().max(1.0)
}

fn second_derivative<F: Fn(f64) -> f64>(f: &F, x: f64) -> f64 {
    let h = curvature_step(x);
    (f(x + h) - 2.0 * f(x) + f(x - h)) / (h * h)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;

    #[test]
    fn finds_parabola_minimum() {
        let out = minimize_scalar(|x| (x - 3.0).powi(2) + 1.0, 10.0, &ScalarMinOptions::default());
        assert!(out.converged);
        assert!((out.x - 3.0).abs() < 1e-5);
        assert!((out.value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn flat_function_stays_at_start() {
        let out = minimize_scalar(|_| 0.25, 42.0, &ScalarMinOptions::default());
        assert!(out.converged);
        assert_eq!(out.iterations, 0);
        assert_eq!(out.x, 42.0);
        assert_eq!(out.value, 0.25);
    }

    #[test]
    fn stays_in_the_starting_basin() {
        // cos has minima at odd multiples of π; starting near 3π must not jump to π.
        let out = minimize_scalar(f64::cos, 3.0 * std::f64::consts::PI + 0.3, &ScalarMinOptions::default());
        assert!(out.converged);
        assert!((out.x - 3.0 * std::f64::consts::PI).abs() < 1e-4);
    }

    #[test]
    fn leaves_the_concave_side_of_a_slow_cosine() {
        let period = 365.25;
        let f = |x: f64| 0.05 * (2.0 * PI * x / period).cos();
        let out = minimize_scalar(f, 10.0, &ScalarMinOptions::default());
        assert!(out.converged, "{out:?}");
        assert!((out.x - period / 2.0).abs() < 1.0, "x = {}", out.x);
        assert!((out.value + 0.05).abs() < 1e-5, "value = {}", out.value);
    }

    #[test]
    fn starting_on_a_peak_rolls_off_it() {
        // Zero gradient at the start, but it is a maximum.
        let period = 365.25;
        let f = |x: f64| 0.05 * (2.0 * PI * x / period).cos() - 0.2;
        let out = minimize_scalar(f, period, &ScalarMinOptions::default());
        assert!(out.converged, "{out:?}");
        assert!((out.value + 0.25).abs() < 1e-5, "value = {}", out.value);
        assert!((out.x - period).abs() <= period / 2.0 + 1.0, "x = {}", out.x);
    }
}
