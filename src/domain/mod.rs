//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - loaded observations (`Sample`, `TimeSeries`)
//! - model and selection enums (`ModelKind`, `Selection`)
//! - fit outputs (`FitResult`, `FitSummary`, `FitFile`)

pub mod float_json;
pub mod types;

pub use types::*;
