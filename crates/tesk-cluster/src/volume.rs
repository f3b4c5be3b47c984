//! Volume Claim Handle.

use crate::client::ClusterClient;
use crate::error::ClusterError;
use serde_json::{json, Value};
use std::sync::Arc;
use tesk_protocol::MountDescriptor;

/// A task-scoped scratch volume, mounted by every filer and executor pod
/// of one task.
pub struct VolumeClaimHandle {
    name: String,
    namespace: String,
    basename: String,
    mounts: Vec<MountDescriptor>,
    client: Arc<dyn ClusterClient>,
    deleted: bool,
}

impl VolumeClaimHandle {
    /// Synthesize a claim spec (`ReadWriteOnce`, `requests.storage = "<size>Gi"`),
    /// submit it, and compute one mount descriptor per path (duplicates
    /// included, each with its own unique sub-path tag).
    pub async fn create(
        client: Arc<dyn ClusterClient>,
        paths: &[String],
        basename: impl Into<String>,
        claim_name: impl Into<String>,
        size_gb: u64,
        namespace: impl Into<String>,
    ) -> Result<Self, ClusterError> {
        let name = claim_name.into();
        let namespace = namespace.into();
        let basename = basename.into();

        let spec = json!({
            "apiVersion": "v1",
            "kind": "PersistentVolumeClaim",
            "metadata": { "name": name },
            "spec": {
                "accessModes": ["ReadWriteOnce"],
                "resources": { "requests": { "storage": format!("{size_gb}Gi") } },
            }
        });

        client.create_pvc(&namespace, &spec).await?;

        let mounts = MountDescriptor::generate(paths, &basename);

        Ok(Self {
            name,
            namespace,
            basename,
            mounts,
            client,
            deleted: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mounts(&self) -> &[MountDescriptor] {
        &self.mounts
    }

    /// A volume descriptor referencing this claim by name, non-read-only.
    pub fn volume(&self) -> Value {
        json!({
            "name": self.basename,
            "persistentVolumeClaim": {
                "readOnly": false,
                "claimName": self.name,
            }
        })
    }

    /// Idempotent, best-effort deletion.
    pub async fn delete(&mut self) {
        if self.deleted {
            return;
        }
        self.deleted = true;
        if let Err(err) = self.client.delete_pvc(&self.namespace, &self.name).await {
            tracing::warn!("failed to delete volume claim {}: {}", self.name, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClusterClient;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tesk_protocol::Condition;

    #[derive(Default)]
    struct FakeCluster {
        delete_calls: AtomicUsize,
        create_calls: AtomicUsize,
    }

    #[async_trait]
    impl ClusterClient for FakeCluster {
        async fn create_job(&self, _ns: &str, _body: &Value) -> Result<(), ClusterError> {
            Ok(())
        }
        async fn job_conditions(&self, _ns: &str, _name: &str) -> Result<Vec<Condition>, ClusterError> {
            Ok(vec![])
        }
        async fn delete_job(&self, _ns: &str, _name: &str) -> Result<(), ClusterError> {
            Ok(())
        }
        async fn create_pvc(&self, _ns: &str, _body: &Value) -> Result<(), ClusterError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn delete_pvc(&self, _ns: &str, _name: &str) -> Result<(), ClusterError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn create_sizes_storage_request_and_names_claim() {
        let fake = Arc::new(FakeCluster::default());
        let claim = VolumeClaimHandle::create(
            fake.clone(),
            &["/data".to_string()],
            "task-volume",
            "mytask-pvc",
            2,
            "default",
        )
        .await
        .unwrap();

        assert_eq!(claim.name(), "mytask-pvc");
        assert_eq!(fake.create_calls.load(Ordering::SeqCst), 1);
        let volume = claim.volume();
        assert_eq!(volume["persistentVolumeClaim"]["claimName"], "mytask-pvc");
        assert_eq!(volume["name"], "task-volume");
    }

    #[tokio::test]
    async fn duplicate_paths_produce_distinct_mounts() {
        let fake = Arc::new(FakeCluster::default());
        let paths = vec!["/data".to_string(), "/data".to_string(), "/data".to_string()];
        let claim = VolumeClaimHandle::create(fake, &paths, "task-volume", "t-pvc", 1, "default")
            .await
            .unwrap();

        assert_eq!(claim.mounts().len(), 3);
        let unique: std::collections::HashSet<&str> =
            claim.mounts().iter().map(|m| m.sub_path.as_str()).collect();
        assert_eq!(unique.len(), 3);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let fake = Arc::new(FakeCluster::default());
        let mut claim = VolumeClaimHandle::create(fake.clone(), &[], "v", "p", 1, "default")
            .await
            .unwrap();
        claim.delete().await;
        claim.delete().await;
        assert_eq!(fake.delete_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_paths_yield_no_mounts() {
        let fake = Arc::new(FakeCluster::default());
        let claim = VolumeClaimHandle::create(fake, &[], "v", "p", 1, "default")
            .await
            .unwrap();
        assert!(claim.mounts().is_empty());
    }
}
