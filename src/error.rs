//! Error types for the GARC encoder.

use thiserror::Error;

/// Errors that can occur while loading a reference or encoding a variant call.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A parse error occurred while reading input data.
    #[error("{0}")]
    Parse(String),

    /// A validation constraint was violated.
    #[error("{0}")]
    Validation(String),

    /// The gene is not part of the reference model.
    #[error("unknown gene: {0}")]
    UnknownGene(String),

    /// An encoding branch that must be unreachable was reached.
    /// Fatal for the call that raised it, never for a batch.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
