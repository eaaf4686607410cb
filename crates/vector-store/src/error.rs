use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Malformed vector literal: {0}")]
    Decode(String),

    #[error("Deadline exceeded during vector search")]
    Timeout,

    #[error("{0}")]
    Other(String),
}
