//! Error types for the simulation engine.

use thiserror::Error;

/// Errors produced while building, evolving or measuring a Rydberg register.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuantumError {
    /// A construction parameter is out of its valid domain.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An input vector does not match the register width.
    #[error("input has {got} values but the register has {expected} atoms")]
    DimensionMismatch {
        /// Number of atoms in the register.
        expected: usize,
        /// Length of the offending input.
        got: usize,
    },

    /// The dense state space would not fit the configured limits.
    #[error(
        "{n_atoms} atoms need ~{required_bytes} bytes per sample, budget is {budget_bytes} bytes"
    )]
    Resource {
        /// Requested atom count.
        n_atoms: usize,
        /// Estimated dense footprint for one in-flight sample.
        required_bytes: u128,
        /// Configured per-layer memory budget.
        budget_bytes: u128,
    },

    /// The state norm left its tolerance during time evolution.
    #[error("norm drifted to {norm:.3e} after step {step} (tolerance {tolerance:.1e})")]
    Numerical {
        /// Zero-based index of the step that produced the fault.
        step: usize,
        /// Norm observed before renormalisation.
        norm: f64,
        /// Allowed deviation of the norm from one.
        tolerance: f64,
    },
}

/// Result type for simulation operations.
pub type QuantumResult<T> = Result<T, QuantumError>;
