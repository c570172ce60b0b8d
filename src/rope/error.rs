//! Rope Construction Error Types
//!
//! Every variant describes a precondition violation detected when a rope is
//! built. The per-tick update path has no error cases.

use thiserror::Error;

/// Result type for rope construction
pub type Result<T> = std::result::Result<T, RopeError>;

/// Rope construction errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RopeError {
    /// Resolution (spacing between points) must be finite and positive
    #[error("Invalid rope resolution: {0} (must be finite and > 0)")]
    InvalidResolution(f32),

    /// Start and end points coincide, no chain can be spanned
    #[error("Degenerate rope endpoints: start and end are {0} apart")]
    DegenerateEndpoints(f32),

    /// A chain needs at least two points (both endpoints)
    #[error("Rope needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    /// Constraint solver would never run
    #[error("Solver iteration count must be > 0")]
    ZeroIterations,

    /// Mass, damping or gravity contained NaN or infinity
    #[error("Non-finite rope parameter: {0}")]
    NonFiniteParameter(&'static str),
}
