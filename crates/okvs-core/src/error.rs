//! Primitive error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Hash key too short: need {expected} bytes, got {actual}")]
    KeyLength { expected: usize, actual: usize },

    #[error("Element length mismatch: expected {expected} bytes, got {actual}")]
    ElementLength { expected: usize, actual: usize },

    #[error("Unsupported field size: {0} bits (must be a positive multiple of 8)")]
    FieldSize(usize),

    #[error("Zero has no multiplicative inverse")]
    NotInvertible,

    #[error("Duplicate interpolation point at index {0}")]
    DuplicatePoint(usize),

    #[error("Dimension mismatch: {0}")]
    Dimension(String),
}
