//! Dispatcher: scheme-sniffs a `TransputRequest`'s URL and delegates to the
//! matching protocol variant.

use crate::content::write_content;
use crate::error::TransputError;
use crate::ftp::FtpCredentials;
use crate::s3::S3Credentials;
use crate::{ftp, http, s3};
use tesk_protocol::{Direction, IoEntry, IoType, TransputRequest};
use url::Url;

/// Holds the resources resolved once at process startup and reused across
/// every transput the filer binary processes: the shared HTTP client and
/// whatever FTP/S3 credentials are present in the environment.
pub struct Engine {
    http_client: reqwest::Client,
    ftp_creds: FtpCredentials,
    s3_creds: S3Credentials,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
            ftp_creds: FtpCredentials::from_env(),
            s3_creds: S3Credentials::from_env(),
        }
    }

    /// Process one `inputs[]`/`outputs[]` entry. Content-bearing entries
    /// bypass the network entirely; everything else is scheme-sniffed and
    /// dispatched to the matching protocol variant.
    pub async fn process(&self, entry: &IoEntry, direction: Direction) -> Result<(), TransputError> {
        if let Some(content) = &entry.content {
            return write_content(&entry.path, content).await;
        }

        let request = TransputRequest::from_entry(entry, direction).ok_or_else(|| {
            TransputError::Malformed(format!(
                "entry at \"{}\" has neither url nor content",
                entry.path
            ))
        })?;

        let url = Url::parse(&request.url)
            .map_err(|e| TransputError::Malformed(format!("invalid url \"{}\": {e}", request.url)))?;

        match url.scheme() {
            "ftp" => self.dispatch_ftp(&request, &url).await,
            "http" | "https" => self.dispatch_http(&request, &url).await,
            "s3" => self.dispatch_s3(&request, &url).await,
            other => Err(TransputError::Malformed(format!(
                "unknown protocol \"{other}\" in url \"{}\"",
                request.url
            ))),
        }
    }

    async fn dispatch_http(&self, req: &TransputRequest, _url: &Url) -> Result<(), TransputError> {
        http::transfer(&self.http_client, &req.path, &req.url, req.ty, req.direction).await
    }

    async fn dispatch_ftp(&self, req: &TransputRequest, url: &Url) -> Result<(), TransputError> {
        let netloc = netloc_of(url);
        let remote_path = url.path().to_string();
        match req.direction {
            Direction::Download => {
                ftp::download(self.ftp_creds.clone(), req.path.clone(), netloc, remote_path, req.ty).await
            }
            Direction::Upload => {
                ftp::upload(self.ftp_creds.clone(), req.path.clone(), netloc, remote_path, req.ty).await
            }
        }
    }

    async fn dispatch_s3(&self, req: &TransputRequest, url: &Url) -> Result<(), TransputError> {
        let netloc = netloc_of(url);
        let url_path = url.path();
        match (req.direction, req.ty) {
            (Direction::Download, IoType::File) => {
                s3::download_file(&self.s3_creds, &req.path, &netloc, url_path).await
            }
            (Direction::Download, IoType::Directory) => {
                s3::download_dir(&self.s3_creds, &req.path, &netloc, url_path).await
            }
            (Direction::Upload, IoType::File) => {
                s3::upload_file(&self.s3_creds, &req.path, &netloc, url_path).await
            }
            (Direction::Upload, IoType::Directory) => {
                s3::upload_dir(&self.s3_creds, &req.path, &netloc, url_path).await
            }
        }
    }
}

fn netloc_of(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}
