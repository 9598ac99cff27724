//! OKVS error types

use okvs_core::CoreError;
use thiserror::Error;

/// Why an encoding attempt failed.
///
/// Each reason occurs with probability bounded by
/// `2^-neg_log_failure_probability()` for correctly sized parameters. The
/// caller may retry with fresh hash keys.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("no empty slot among the key's positions")]
    EmptySlotExhausted,

    #[error("linear system over the residual core is inconsistent")]
    LinearSystemInconsistent,

    #[error("bin {bin} received {load} keys, capacity {capacity}")]
    BucketOverflow {
        bin: usize,
        load: usize,
        capacity: usize,
    },

    #[error("duplicate evaluation point in bin {bin}")]
    PointCollision { bin: usize },

    #[error("two keys share an evaluation point")]
    DuplicatePoint,
}

#[derive(Error, Debug)]
pub enum OkvsError {
    #[error("Encoding failed: {0}")]
    EncodingFailure(FailureReason),

    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Wire format error: {0}")]
    Wire(#[from] bincode::Error),
}

impl OkvsError {
    /// Stable error code for logs and tooling
    pub fn code(&self) -> &'static str {
        match self {
            OkvsError::EncodingFailure(_) => "ENCODING_FAILURE",
            OkvsError::PreconditionViolation(_) => "PRECONDITION_VIOLATION",
            OkvsError::Core(_) => "CORE_ERROR",
            OkvsError::Config(_) => "CONFIG_ERROR",
            OkvsError::Io(_) => "IO_ERROR",
            OkvsError::Json(_) => "JSON_ERROR",
            OkvsError::Wire(_) => "WIRE_ERROR",
        }
    }

    /// Whether retrying with fresh hash keys can succeed
    pub fn is_retriable(&self) -> bool {
        matches!(self, OkvsError::EncodingFailure(_))
    }
}

impl From<FailureReason> for OkvsError {
    fn from(reason: FailureReason) -> Self {
        OkvsError::EncodingFailure(reason)
    }
}

pub type Result<T> = std::result::Result<T, OkvsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_encoding_failures_retriable() {
        assert!(OkvsError::from(FailureReason::EmptySlotExhausted).is_retriable());
        assert!(!OkvsError::PreconditionViolation("too many keys".into()).is_retriable());
        assert!(!OkvsError::Core(CoreError::NotInvertible).is_retriable());
    }

    #[test]
    fn test_error_codes() {
        let overflow = OkvsError::from(FailureReason::BucketOverflow {
            bin: 3,
            load: 9,
            capacity: 8,
        });
        assert_eq!(overflow.code(), "ENCODING_FAILURE");
        assert_eq!(
            overflow.to_string(),
            "Encoding failed: bin 3 received 9 keys, capacity 8"
        );
        assert_eq!(OkvsError::Config("x".into()).code(), "CONFIG_ERROR");
        assert_eq!(
            OkvsError::from(FailureReason::DuplicatePoint).to_string(),
            "Encoding failed: two keys share an evaluation point"
        );
    }
}
