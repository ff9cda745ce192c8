//! Error types for policy-gradient training
//!
//! Numeric routines return [`PgError`] directly. Orchestration code
//! (environments, the trainer, file I/O) works in `anyhow::Result` and
//! carries a `PgError` as the source, so callers can recover the kind with
//! `err.downcast_ref::<PgError>()`.

use thiserror::Error;

/// Failure kinds raised by the training core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PgError {
    /// The policy family cannot act in the environment's spaces
    #[error("unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    /// Finite-difference check disagrees with the analytic score function
    #[error(
        "gradient check failed at parameter {index}: numeric {numeric:.8}, analytic {analytic:.8}"
    )]
    GradientCheckFailed {
        /// Flattened parameter index
        index: usize,
        /// Central-difference estimate
        numeric: f64,
        /// Value returned by `grad_log_prob`
        analytic: f64,
    },

    /// The trust-region quadratic form is not positive
    #[error("degenerate Fisher matrix: quadratic form {quadratic_form} is not positive")]
    DegenerateFisher {
        /// Value of ĝᵀFĝ
        quadratic_form: f64,
    },

    /// Matrix inversion or the parameter update produced non-finite values
    #[error("ill-conditioned update: {0}")]
    IllConditioned(String),

    /// Shapes of two operands disagree
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length or shape
        expected: String,
        /// Length or shape actually supplied
        actual: String,
    },

    /// A trajectory is longer than the environment horizon
    #[error("trajectory of length {length} exceeds horizon {horizon}")]
    HorizonExceeded {
        /// Trajectory length
        length: usize,
        /// Environment timestep limit
        horizon: usize,
    },

    /// Hyperparameters failed validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PgError {
    /// Build a [`PgError::DimensionMismatch`] from anything printable
    pub fn mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        PgError::DimensionMismatch { expected: expected.to_string(), actual: actual.to_string() }
    }
}
