use converse_protocol::{OrderKeyExhausted, PathSyntaxError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TopicStoreError>;

#[derive(Error, Debug)]
pub enum TopicStoreError {
    #[error("Invalid path syntax: {0}")]
    Syntax(#[from] PathSyntaxError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Topic path '{path}' already exists in group {group_id}")]
    DuplicatePath { path: String, group_id: i64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Concurrent write conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    IndexExhausted(#[from] OrderKeyExhausted),

    #[error("Deadline exceeded during store operation")]
    Timeout,

    #[error("{0}")]
    Other(String),
}
