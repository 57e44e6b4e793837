//! Data sources other than the input CSV.

pub mod synth;

pub use synth::*;
