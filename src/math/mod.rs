//! Mathematical utilities: least squares (linear and nonlinear), covariance,
//! scalar minimization and descriptive statistics.

pub mod covariance;
pub mod lm;
pub mod minimize;
pub mod ols;
pub mod stats;

pub use covariance::*;
pub use lm::*;
pub use minimize::*;
pub use ols::*;
pub use stats::*;
