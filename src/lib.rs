//! `anomaly-fit` library crate.
//!
//! The binary (`anomfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the CLI report, the batch scan and the TUI share one pipeline

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
