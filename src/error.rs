//! Error types.
//!
//! `AppError` is what every entry point returns: a message plus the process exit
//! code. `FitError` describes why a single fit could not be produced; the
//! interactive and batch front-ends show it in place of results instead of
//! aborting.

use thiserror::Error;

/// Exit code for unreadable or malformed input.
pub const EXIT_INPUT: u8 = 2;
/// Exit code for a fit that could not be produced.
pub const EXIT_FIT: u8 = 3;
/// Exit code for terminal / runtime failures.
pub const EXIT_RUNTIME: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(EXIT_FIT, format!("Fit unavailable: {err}"))
    }
}

/// Reasons a fit is unavailable for a selection of samples.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("no samples for year {0}")]
    EmptySelection(i32),
    #[error("time and value arrays differ in length ({times} vs {values})")]
    LengthMismatch { times: usize, values: usize },
    #[error("need at least {required} points to fit {required} parameters, got {got}")]
    InsufficientData { got: usize, required: usize },
    #[error("non-finite value in fit input")]
    NonFiniteInput,
    #[error("solver did not converge within {0} iterations")]
    NotConverged(usize),
    #[error("Jacobian is singular at the solution")]
    SingularJacobian,
    #[error("solver produced non-finite parameters")]
    NonFiniteParameters,
}
