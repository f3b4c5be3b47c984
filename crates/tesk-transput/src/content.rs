//! Content-bypass path: inputs that carry a
//! literal `content` string skip the engine entirely.

use crate::error::TransputError;

pub async fn write_content(path: &str, content: &str) -> Result<(), TransputError> {
    tokio::fs::write(path, content.as_bytes()).await?;
    Ok(())
}
