//! Startup configuration, resolved once from CLI flags and the process
//! environment and threaded explicitly through the run; no global mutable
//! config, matching this codebase's `SentinelConfig`/`WorkerConfig`
//! convention for its other long-running binaries.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub namespace: String,
    pub poll_interval: Duration,
    pub filer_version: String,
    pub debug: bool,
    /// Accepted for CLI compatibility with the original `-s/--state-file`
    /// flag; no core behavior depends on it.
    #[allow(dead_code)]
    pub state_file: PathBuf,
    /// Base URL of the cluster's job/PVC API. Not part of the distilled
    /// CLI surface (the cluster API is an external collaborator, assumed
    /// reachable); resolved from the environment the way an in-cluster
    /// client normally discovers its API server.
    pub cluster_api_url: String,
    /// Registry prefix the filer image is pulled from; the filer version
    /// tag itself remains a CLI flag.
    pub filer_image_registry: String,
    pub callback_url: Option<String>,
    pub cancellation_label_path: PathBuf,
    pub ftp_username: Option<String>,
    pub ftp_password: Option<String>,
}

impl SupervisorConfig {
    pub fn resolve(
        namespace: String,
        poll_interval_secs: u64,
        filer_version: String,
        debug: bool,
        state_file: String,
    ) -> Self {
        Self {
            namespace,
            poll_interval: Duration::from_secs(poll_interval_secs),
            filer_version,
            debug,
            state_file: PathBuf::from(state_file),
            cluster_api_url: std::env::var("TESK_CLUSTER_API_URL")
                .unwrap_or_else(|_| "https://kubernetes.default.svc".to_string()),
            filer_image_registry: std::env::var("TESK_FILER_IMAGE_REGISTRY")
                .unwrap_or_else(|_| "quay.io/tes".to_string()),
            callback_url: std::env::var("TESK_CALLBACK_URL").ok(),
            cancellation_label_path: std::env::var("TESK_CANCELLATION_LABEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/podinfo/labels")),
            ftp_username: std::env::var("TESK_FTP_USERNAME").ok(),
            ftp_password: std::env::var("TESK_FTP_PASSWORD").ok(),
        }
    }
}
