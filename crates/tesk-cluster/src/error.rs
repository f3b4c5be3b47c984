use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("cluster rejected spec: {0}")]
    Rejected(String),

    #[error("cluster API transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("resource not found: {0}")]
    NotFound(String),
}
