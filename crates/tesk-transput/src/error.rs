use thiserror::Error;

/// Error taxonomy for a single transput. Every variant
/// is swallowed at the transfer boundary and surfaced as a non-zero exit
/// code by the `tesk-filer` binary; nothing here is allowed to unwind past
/// `Engine::process`.
#[derive(Debug, Error)]
pub enum TransputError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FTP error: {0}")]
    Ftp(String),

    #[error("S3 error: {0}")]
    S3(String),
}
