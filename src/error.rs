// ============================================================
// Core Error Type
// ============================================================
// Errors raised by the data pipeline and the model core.
// The application and CLI layers wrap these in anyhow.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemNetError {
    #[error("invalid configuration: {field} must be positive (got {value})")]
    InvalidConfig { field: &'static str, value: usize },

    #[error("shape mismatch for {tensor}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        tensor:   &'static str,
        expected: Vec<usize>,
        actual:   Vec<usize>,
    },

    #[error("token id {id} in {tensor} is outside [0, {bound})")]
    TokenOutOfRange {
        tensor: &'static str,
        id:     i64,
        bound:  usize,
    },

    #[error("batch is empty")]
    EmptyBatch,

    #[error("loss became non-finite at step {step}")]
    NonFiniteLoss { step: usize },

    #[error("parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("token '{0}' is not in the vocabulary")]
    UnknownToken(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MemNetError>;
