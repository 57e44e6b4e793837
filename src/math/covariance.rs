//! Parameter covariance from the Jacobian at a least-squares solution.
//!
//! ```text
//! cov = pinv(JᵀJ) · SSE / (n - p)
//! ```
//!
//! `pinv(JᵀJ)` is built from the SVD of `J` itself (`V Σ⁻² Vᵀ`), discarding
//! singular values below `ε · max(n, p) · σ_max`. Directions the data cannot
//! resolve therefore contribute nothing instead of producing infinities.
//! With no residual degrees of freedom (`n == p`) the scale is undefined and
//! every entry is reported as `+∞`.

use nalgebra::DMatrix;

/// Covariance estimate plus the numerical rank of `J`.
#[derive(Debug, Clone)]
pub struct Covariance {
    pub matrix: DMatrix<f64>,
    pub rank: usize,
}

impl Covariance {
    /// Square roots of the diagonal.
    pub fn std_errors(&self) -> Vec<f64> {
        self.matrix.diagonal().iter().map(|v| v.sqrt()).collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.matrix
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }
}

pub fn covariance_from_jacobian(jacobian: &DMatrix<f64>, sse: f64) -> Covariance {
    let (n, p) = jacobian.shape();
    let svd = jacobian.clone().svd(false, true);

    let s_max = svd.singular_values.iter().fold(0.0_f64, |m, v| m.max(*v));
    let threshold = f64::EPSILON * n.max(p) as f64 * s_max;

    let mut matrix = DMatrix::<f64>::zeros(p, p);
    let mut rank = 0;
    if let Some(v_t) = &svd.v_t {
        for (k, &s) in svd.singular_values.iter().enumerate() {
            if s <= threshold || s == 0.0 {
                continue;
            }
            rank += 1;
            let v = v_t.row(k).transpose();
            matrix += (&v * v.transpose()) / (s * s);
        }
    }

    if n > p {
        matrix *= sse / (n - p) as f64;
    } else {
        matrix.fill(f64::INFINITY);
    }

    Covariance { matrix, rank }
}
