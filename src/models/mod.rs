//! Model functions fitted to the anomaly series.
//!
//! Models are implemented behind the `CurveModel` trait so fitting, statistics
//! and plotting code can stay generic.

pub mod model;

pub use model::*;
