//! Error types for the imputation pipeline.

use thiserror::Error;

/// Result type for imputation operations.
pub type Result<T> = std::result::Result<T, ImputeError>;

/// Error types for imputation operations.
///
/// Per-date estimator failures are not represented here: an estimator that
/// cannot produce a value for a date omits it from its estimate instead.
#[derive(Error, Debug)]
pub enum ImputeError {
    #[error("Data format error: {0}")]
    DataFormat(String),

    #[error("Invalid date format: {0}")]
    InvalidDateFormat(String),

    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Invalid parameter '{param}' = '{value}': {reason}")]
    InvalidParameter {
        param: String,
        value: String,
        reason: String,
    },

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ImputeError {
    /// Process exit code for this error.
    ///
    /// Input problems share code 2 so scripts can tell "bad file" apart from
    /// "bad flags" (3) and numeric trouble (4).
    pub fn exit_code(&self) -> u8 {
        match self {
            ImputeError::DataFormat(_)
            | ImputeError::InvalidDateFormat(_)
            | ImputeError::InsufficientData { .. } => 2,
            ImputeError::InvalidParameter { .. } => 3,
            ImputeError::ComputationError(_) => 4,
            ImputeError::InternalError(_) => 70,
        }
    }

    /// Whether this error belongs to the data-format family that aborts a
    /// run before any estimator executes.
    pub fn is_data_format(&self) -> bool {
        matches!(
            self,
            ImputeError::DataFormat(_)
                | ImputeError::InvalidDateFormat(_)
                | ImputeError::InsufficientData { .. }
        )
    }

    pub(crate) fn invalid_parameter(
        param: &str,
        value: impl ToString,
        reason: &str,
    ) -> ImputeError {
        ImputeError::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
