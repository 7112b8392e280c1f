//! Error types for the reservoir layer.

use quantum::QuantumError;
use thiserror::Error;

/// Errors surfaced by [`crate::DetuningLayer`] and its helpers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LayerError {
    /// Configuration, resource or numerical failure outside any one sample.
    #[error(transparent)]
    Quantum(#[from] QuantumError),

    /// A single sample failed; the whole batch is abandoned.
    #[error("sample {index}: {source}")]
    Sample {
        /// Row index of the failing sample.
        index: usize,
        /// Underlying cause.
        source: QuantumError,
    },

    /// The caller raised the cancellation flag.
    #[error("batch cancelled before all samples were dispatched")]
    Cancelled,

    /// Feature scaling could not be applied.
    #[error("cannot scale features: {0}")]
    Scaling(String),

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A CSV matrix file could not be parsed.
    #[error("{path}:{line}: {message}")]
    Csv {
        path: String,
        line: usize,
        message: String,
    },
}

/// Result type for layer operations.
pub type LayerResult<T> = Result<T, LayerError>;
