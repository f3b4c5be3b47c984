//! Filer Spec Builder.

use serde_json::{json, Value};
use tesk_cluster::VolumeClaimHandle;
use tesk_protocol::{Direction, Task};

pub struct FilerSpecBuilder<'a> {
    task: &'a Task,
    registry: String,
    filer_version: String,
    debug: bool,
    ftp_username: Option<String>,
    ftp_password: Option<String>,
}

impl<'a> FilerSpecBuilder<'a> {
    pub fn new(
        task: &'a Task,
        registry: impl Into<String>,
        filer_version: impl Into<String>,
        debug: bool,
    ) -> Self {
        Self {
            task,
            registry: registry.into(),
            filer_version: filer_version.into(),
            debug,
            ftp_username: None,
            ftp_password: None,
        }
    }

    pub fn with_ftp_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.ftp_username = username;
        self.ftp_password = password;
        self
    }

    /// Build a job spec that runs `tesk-filer <direction> <data>` inside
    /// the task's namespace, mounted exactly the way executors will be
    /// mounted, so the engine sees the same paths executors will.
    ///
    /// The serialized `data` subset carries both `inputs` and `outputs`
    /// keys (the inactive one empty), mirroring the original
    /// `transput_filer.py main()`'s `data[args.transputtype]` access
    /// pattern, which assumes the blob it's handed already carries both.
    pub fn build(&self, direction: Direction, claim: &VolumeClaimHandle) -> Value {
        let data = match direction {
            Direction::Download => json!({ "inputs": self.task.inputs, "outputs": [] }),
            Direction::Upload => json!({ "inputs": [], "outputs": self.task.outputs }),
        };

        let mut args = vec![
            direction.as_transput_type().to_string(),
            data.to_string(),
        ];
        if self.debug {
            args.push("--debug".to_string());
        }

        let mut env = Vec::new();
        if let (Some(username), Some(password)) = (&self.ftp_username, &self.ftp_password) {
            env.push(json!({ "name": "TESK_FTP_USERNAME", "value": username }));
            env.push(json!({ "name": "TESK_FTP_PASSWORD", "value": password }));
        }

        let volume_mounts: Vec<Value> = claim
            .mounts()
            .iter()
            .map(|m| {
                json!({
                    "name": m.volume_name,
                    "mountPath": m.path,
                    "subPath": m.sub_path,
                })
            })
            .collect();

        json!({
            "apiVersion": "batch/v1",
            "kind": "Job",
            "metadata": {},
            "spec": {
                "template": {
                    "spec": {
                        "restartPolicy": "Never",
                        "containers": [{
                            "name": "filer",
                            "image": format!("{}/filer:{}", self.registry, self.filer_version),
                            "args": args,
                            "env": env,
                            "volumeMounts": volume_mounts,
                        }],
                        "volumes": [claim.volume()],
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tesk_cluster::ClusterClient;
    use tesk_protocol::{ExecutorLabels, ExecutorMetadata, IoEntry, IoType, Resources};

    async fn fake_claim() -> VolumeClaimHandle {
        use async_trait::async_trait;
        use tesk_cluster::ClusterError;
        use tesk_protocol::Condition;

        struct NoopCluster;
        #[async_trait]
        impl ClusterClient for NoopCluster {
            async fn create_job(&self, _ns: &str, _body: &Value) -> Result<(), ClusterError> {
                Ok(())
            }
            async fn job_conditions(&self, _ns: &str, _n: &str) -> Result<Vec<Condition>, ClusterError> {
                Ok(vec![])
            }
            async fn delete_job(&self, _ns: &str, _n: &str) -> Result<(), ClusterError> {
                Ok(())
            }
            async fn create_pvc(&self, _ns: &str, _body: &Value) -> Result<(), ClusterError> {
                Ok(())
            }
            async fn delete_pvc(&self, _ns: &str, _n: &str) -> Result<(), ClusterError> {
                Ok(())
            }
        }

        VolumeClaimHandle::create(
            Arc::new(NoopCluster),
            &["/data".to_string()],
            "task-volume",
            "task-pvc",
            2,
            "default",
        )
        .await
        .unwrap()
    }

    fn task_with_input() -> Task {
        Task {
            executors: vec![tesk_protocol::Executor {
                metadata: ExecutorMetadata {
                    name: "exec-1".into(),
                    labels: ExecutorLabels { taskmaster_name: "task-1".into() },
                },
                spec: json!({}),
            }],
            inputs: vec![IoEntry {
                path: "/data/in.txt".into(),
                ty: IoType::File,
                url: Some("http://h/in.txt".into()),
                content: None,
            }],
            outputs: vec![],
            volumes: vec!["/data".into()],
            resources: Resources { disk_gb: 2 },
        }
    }

    #[tokio::test]
    async fn download_spec_carries_only_inputs_and_mounts_claim() {
        let task = task_with_input();
        let claim = fake_claim().await;
        let builder = FilerSpecBuilder::new(&task, "quay.io/tes", "v0.1.9", false);
        let spec = builder.build(Direction::Download, &claim);

        let args = spec["spec"]["template"]["spec"]["containers"][0]["args"]
            .as_array()
            .unwrap();
        assert_eq!(args[0], "inputs");
        let data: Value = serde_json::from_str(args[1].as_str().unwrap()).unwrap();
        assert_eq!(data["inputs"].as_array().unwrap().len(), 1);
        assert!(data["outputs"].as_array().unwrap().is_empty());

        let image = spec["spec"]["template"]["spec"]["containers"][0]["image"].as_str().unwrap();
        assert_eq!(image, "quay.io/tes/filer:v0.1.9");

        let mounts = spec["spec"]["template"]["spec"]["containers"][0]["volumeMounts"]
            .as_array()
            .unwrap();
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0]["mountPath"], "/data");
    }

    #[tokio::test]
    async fn ftp_credentials_become_container_env() {
        let task = task_with_input();
        let claim = fake_claim().await;
        let builder = FilerSpecBuilder::new(&task, "quay.io/tes", "v0.1.9", false)
            .with_ftp_credentials(Some("u".into()), Some("p".into()));
        let spec = builder.build(Direction::Download, &claim);
        let env = spec["spec"]["template"]["spec"]["containers"][0]["env"]
            .as_array()
            .unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env[0]["name"], "TESK_FTP_USERNAME");
    }
}
