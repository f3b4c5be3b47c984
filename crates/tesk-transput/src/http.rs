//! HTTP(S) transput variant.
//!
//! A single `reqwest::Client` is shared across the whole filer run instead
//! of the original's one-shot `requests.get`/`put` per call. `Client` is
//! explicitly designed to be cloned/shared and pools connections, so this
//! does not change observable behavior, only connection reuse.

use crate::error::TransputError;
use std::path::Path;
use tesk_protocol::IoType;

pub async fn download_file(
    client: &reqwest::Client,
    path: &str,
    url: &str,
) -> Result<(), TransputError> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(TransputError::Protocol(format!(
            "GET {url} returned status {}",
            resp.status()
        )));
    }
    let bytes = resp.bytes().await?;
    if let Some(parent) = Path::new(path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &bytes).await?;
    Ok(())
}

pub async fn upload_file(
    client: &reqwest::Client,
    path: &str,
    url: &str,
) -> Result<(), TransputError> {
    let body = tokio::fs::read(path).await?;
    let resp = client.put(url).body(body).send().await?;
    if !resp.status().is_success() {
        return Err(TransputError::Protocol(format!(
            "PUT {url} returned status {}",
            resp.status()
        )));
    }
    Ok(())
}

/// Enumerate `path` and recurse one child transput per entry, against
/// `url + "/" + name`. The original collapses child return codes with
/// `min(sum(codes), 1)`; reproduced here as "any failure propagates", i.e.
/// a short-circuiting logical OR over failures rather than a literal sum.
pub fn upload_dir<'a>(
    client: &'a reqwest::Client,
    path: &'a str,
    url: &'a str,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), TransputError>> + Send + 'a>> {
    Box::pin(async move {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut any_failed = false;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let child_path = format!("{path}/{name}");
            let child_url = format!("{url}/{name}");
            let file_type = entry.file_type().await?;

            let result = if file_type.is_dir() {
                upload_dir(client, &child_path, &child_url).await
            } else {
                upload_file(client, &child_path, &child_url).await
            };
            if let Err(err) = result {
                tracing::error!("failed to upload {}: {}", child_path, err);
                any_failed = true;
            }
        }
        if any_failed {
            return Err(TransputError::Protocol(format!(
                "one or more uploads under {path} failed"
            )));
        }
        Ok(())
    })
}

/// HTTP directory download is unconditionally unsupported: an HTTP server's
/// directory listing is not something this engine parses.
pub async fn download_dir(_path: &str, url: &str) -> Result<(), TransputError> {
    tracing::error!("won't crawl http directory, unable to download url: {url}");
    Err(TransputError::Unsupported(format!(
        "HTTP directory download unsupported for {url}"
    )))
}

pub async fn transfer(
    client: &reqwest::Client,
    path: &str,
    url: &str,
    ty: IoType,
    direction: tesk_protocol::Direction,
) -> Result<(), TransputError> {
    use tesk_protocol::Direction::*;
    match (direction, ty) {
        (Download, IoType::File) => download_file(client, path, url).await,
        (Download, IoType::Directory) => download_dir(path, url).await,
        (Upload, IoType::File) => upload_file(client, path, url).await,
        (Upload, IoType::Directory) => upload_dir(client, path, url).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn download_dir_is_always_unsupported() {
        let err = download_dir("/tmp/whatever", "http://host/dir")
            .await
            .unwrap_err();
        assert!(matches!(err, TransputError::Unsupported(_)));
    }
}
