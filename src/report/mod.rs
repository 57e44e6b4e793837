//! Reporting utilities: formatted terminal output for fits and scans.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - the CLI report and the TUI results panel show the same numbers

pub mod format;

pub use format::*;
