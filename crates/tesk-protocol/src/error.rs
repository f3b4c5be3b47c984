use thiserror::Error;

/// Errors raised while parsing or validating a task document, shared by
/// both binaries before any cluster or transput work begins.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("failed to read task input: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse task JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("task has no executors")]
    NoExecutors,

    #[error("invalid argument: {0}")]
    Args(String),
}
