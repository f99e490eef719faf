//! Error types for quantized GEMM operations

use thiserror::Error;

/// Result type for GEMM operations
pub type GemmResult<T> = Result<T, GemmError>;

/// Errors that can occur in GEMM operations.
///
/// Every variant is a caller-input fault detected before any computation starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GemmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Shape mismatch for {name}: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),

    #[error("Weight level {level} at index {index} out of range for {bit_width}-bit levels")]
    LevelOutOfRange {
        index: usize,
        level: u8,
        bit_width: u32,
    },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl GemmError {
    /// Shorthand for a length mismatch on a named buffer.
    pub(crate) fn shape(name: &'static str, expected: usize, actual: usize) -> Self {
        GemmError::ShapeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// True for any shape-class error (length mismatch or invalid dimensions).
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            GemmError::ShapeMismatch { .. } | GemmError::InvalidShape(_)
        )
    }
}
