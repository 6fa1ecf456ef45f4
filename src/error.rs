use thiserror::Error;

/// Errors surfaced by tensor, layer, and network operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// Tensor shapes or layer sizes disagree.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    /// An argument is out of range or otherwise unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// An operation was called out of sequence, e.g. backward before forward.
    #[error("operation order: {0}")]
    OperationOrder(String),
}

pub type Result<T> = std::result::Result<T, NetworkError>;
