//! Curve fitting.
//!
//! Responsibilities:
//!
//! - select the samples a fit covers (whole series or one year)
//! - calibrate a model by nonlinear least squares
//! - derive summary statistics from the fitted curve

pub mod filter;
pub mod fitter;
pub mod summary;

pub use filter::*;
pub use fitter::*;
pub use summary::*;
