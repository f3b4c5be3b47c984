use tesk_cluster::ClusterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("cluster error: {0}")]
    Cluster(#[from] ClusterError),

    #[error("invalid argument: {0}")]
    Args(String),

    #[error("failed to read task input: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse task JSON: {0}")]
    Json(#[from] serde_json::Error),
}
