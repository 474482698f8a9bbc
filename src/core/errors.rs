// src/core/errors.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RfiError {
    /// Malformed or unknown feature identifiers, or otherwise invalid arguments.
    #[error("Validation Error: {0}")]
    Validation(String),
    /// `sample` was called for a (J, G) pair that has no cached sampling function.
    #[error("Sampler not trained on {j:?} | {g:?}")]
    NotTrained { j: Vec<String>, g: Vec<String> },
    /// A tensor or block had an unsupported shape.
    #[error("Shape Error: {reason} (got shape {shape:?})")]
    Shape { shape: Vec<usize>, reason: String },
    /// Raised by (or about) a pluggable trainer.
    #[error("Training Error: {0}")]
    Training(String),
    #[error("Ndarray Error: {0}")]
    Ndarray(String),
}

impl From<ndarray::ShapeError> for RfiError {
    fn from(err: ndarray::ShapeError) -> Self {
        RfiError::Ndarray(format!("ndarray ShapeError: {}", err))
    }
}

// Convenience type alias for Result
pub type Result<T> = std::result::Result<T, RfiError>;
