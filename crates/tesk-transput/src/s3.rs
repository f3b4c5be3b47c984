//! S3-compatible object storage transput variant.
//!
//! URL form is `s3://<endpoint-host[:port]>/<bucket>/<object-key...>`. The
//! endpoint host is not a real AWS region endpoint, it's wherever the
//! MinIO-style object store lives, so the client is always built with
//! `force_path_style(true)` and an explicit `http://` endpoint override,
//! matching the original's `endpoint_url="http://" + netloc`.

use crate::error::TransputError;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use tesk_protocol::subfolders_in;

/// Credentials resolved once at startup from `TESK_S3_ACCESS_KEY` /
/// `TESK_S3_SECRET_KEY`, matching the env-based credential
/// lookup. Absent either, the SDK's default provider chain is used instead
/// of hardcoding "no credentials", a deliberate broadening over the
/// original (see DESIGN.md).
#[derive(Debug, Clone, Default)]
pub struct S3Credentials {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl S3Credentials {
    pub fn from_env() -> Self {
        Self {
            access_key: std::env::var("TESK_S3_ACCESS_KEY").ok(),
            secret_key: std::env::var("TESK_S3_SECRET_KEY").ok(),
        }
    }
}

/// Split a URL path (`/<bucket>/<object-key...>`) into (bucket, object_key),
/// trimming a trailing slash from the key, matching the original
/// `get_bucket_object`.
fn split_bucket_object(url_path: &str) -> (String, String) {
    let trimmed = url_path.trim_start_matches('/');
    let mut parts = trimmed.split('/');
    let bucket = parts.next().unwrap_or_default().to_string();
    let object_name = parts.collect::<Vec<_>>().join("/");
    (bucket, object_name.trim_end_matches('/').to_string())
}

async fn build_client(netloc: &str, creds: &S3Credentials) -> Client {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new("us-east-1"));
    if let (Some(access), Some(secret)) = (&creds.access_key, &creds.secret_key) {
        loader = loader.credentials_provider(Credentials::new(
            access.clone(),
            secret.clone(),
            None,
            None,
            "tesk-transput",
        ));
    }
    let base = loader.load().await;
    let s3_config = aws_sdk_s3::config::Builder::from(&base)
        .endpoint_url(format!("http://{netloc}"))
        .force_path_style(true)
        .build();
    Client::from_conf(s3_config)
}

/// Create the bucket if it doesn't already exist, swallowing "already
/// owned"/"already exists" errors exactly as the original's
/// `except (BucketAlreadyOwnedByYou, BucketAlreadyExists)`.
async fn ensure_bucket(client: &Client, bucket: &str) -> Result<(), TransputError> {
    match client.create_bucket().bucket(bucket).send().await {
        Ok(_) => Ok(()),
        Err(err) => match err.into_service_error() {
            CreateBucketError::BucketAlreadyOwnedByYou(_) => Ok(()),
            CreateBucketError::BucketAlreadyExists(_) => Ok(()),
            other => Err(TransputError::S3(other.to_string())),
        },
    }
}

pub async fn upload_file(
    creds: &S3Credentials,
    path: &str,
    netloc: &str,
    url_path: &str,
) -> Result<(), TransputError> {
    let (bucket, key) = split_bucket_object(url_path);
    let client = build_client(netloc, creds).await;
    ensure_bucket(&client, &bucket).await?;

    let body = ByteStream::from_path(path)
        .await
        .map_err(|e| TransputError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
    client
        .put_object()
        .bucket(&bucket)
        .key(&key)
        .body(body)
        .send()
        .await
        .map_err(|e| TransputError::S3(e.to_string()))?;
    Ok(())
}

pub async fn download_file(
    creds: &S3Credentials,
    path: &str,
    netloc: &str,
    url_path: &str,
) -> Result<(), TransputError> {
    let (bucket, key) = split_bucket_object(url_path);
    let client = build_client(netloc, creds).await;

    let resp = client
        .get_object()
        .bucket(&bucket)
        .key(&key)
        .send()
        .await
        .map_err(|e| TransputError::S3(e.to_string()))?;
    let data = resp
        .body
        .collect()
        .await
        .map_err(|e| TransputError::S3(e.to_string()))?
        .into_bytes();

    if let Some(parent) = Path::new(path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &data).await?;
    Ok(())
}

pub fn upload_dir<'a>(
    creds: &'a S3Credentials,
    path: &'a str,
    netloc: &'a str,
    url_path: &'a str,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), TransputError>> + Send + 'a>> {
    Box::pin(async move {
        let (bucket, _) = split_bucket_object(url_path);
        let client = build_client(netloc, creds).await;
        ensure_bucket(&client, &bucket).await?;

        let mut entries = tokio::fs::read_dir(path).await?;
        let mut any_failed = false;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let child_path = format!("{path}/{name}");
            let child_url_path = format!("{url_path}/{name}");
            let file_type = entry.file_type().await?;

            let result = if file_type.is_dir() {
                upload_dir(creds, &child_path, netloc, &child_url_path).await
            } else {
                upload_file(creds, &child_path, netloc, &child_url_path).await
            };
            if let Err(err) = result {
                tracing::error!("failed to upload {} to s3: {}", child_path, err);
                any_failed = true;
            }
        }
        if any_failed {
            return Err(TransputError::S3(format!(
                "one or more uploads under {path} failed"
            )));
        }
        Ok(())
    })
}

/// Downloads every object under `object_key` as a prefix, re-rooting each
/// key under local `path`. The offset math is preserved exactly from the
/// original: "length of the penultimate subfolder of the object key, plus
/// one; zero if the key has a single segment", a fragile quirk
/// the original tool preserves rather than "fixes".
pub async fn download_dir(
    creds: &S3Credentials,
    path: &str,
    netloc: &str,
    url_path: &str,
) -> Result<(), TransputError> {
    let (bucket, object_key) = split_bucket_object(url_path);
    let client = build_client(netloc, creds).await;

    let subfolders = subfolders_in(&object_key);
    let offset = if subfolders.len() > 1 {
        subfolders[subfolders.len() - 2].len() + 1
    } else {
        0
    };

    let mut target = path.to_string();
    if !target.ends_with('/') {
        target.push('/');
    }

    let resp = client
        .list_objects_v2()
        .bucket(&bucket)
        .prefix(&object_key)
        .send()
        .await
        .map_err(|e| TransputError::S3(e.to_string()))?;

    for obj in resp.contents() {
        let key = obj.key().unwrap_or_default();
        let relative = &key[offset.min(key.len())..];
        let basedir = Path::new(relative).parent().map(|p| p.display().to_string());
        let dir_path = match basedir {
            Some(d) if !d.is_empty() && d != "." => format!("{target}{d}"),
            _ => target.trim_end_matches('/').to_string(),
        };
        tokio::fs::create_dir_all(&dir_path).await?;

        let filename = Path::new(key)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.to_string());
        let file_path = format!("{dir_path}/{filename}");

        let obj_resp = client
            .get_object()
            .bucket(&bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| TransputError::S3(e.to_string()))?;
        let data = obj_resp
            .body
            .collect()
            .await
            .map_err(|e| TransputError::S3(e.to_string()))?
            .into_bytes();
        tokio::fs::write(&file_path, &data).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_bucket_and_trims_trailing_slash() {
        let (bucket, key) = split_bucket_object("/b/path/to/obj/");
        assert_eq!(bucket, "b");
        assert_eq!(key, "path/to/obj");
    }

    #[test]
    fn single_segment_key_has_empty_object_name() {
        let (bucket, key) = split_bucket_object("/onlybucket");
        assert_eq!(bucket, "onlybucket");
        assert_eq!(key, "");
    }
}
