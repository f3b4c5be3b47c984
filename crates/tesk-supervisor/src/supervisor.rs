//! Task sequencing: stage in, run executors in order, stage out, per
//! `created_jobs`/`created_claim` replace the
//! original module-level `CREATED_JOBS`/`CREATED_PVC` globals with fields
//! owned by the value that actually needs them.

use crate::cancel::CancellationProbe;
use crate::config::SupervisorConfig;
use crate::error::SupervisorError;
use crate::filer_spec::FilerSpecBuilder;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tesk_cluster::{ClusterClient, JobHandle, VolumeClaimHandle};
use tesk_protocol::{Direction, JobState, Task};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorOutcome {
    Completed,
    Cancelled { reason: String },
    JobFailed { job: String, state: JobState },
}

pub struct Supervisor {
    client: Arc<dyn ClusterClient>,
    namespace: String,
    poll_interval: Duration,
    filer_registry: String,
    filer_version: String,
    debug: bool,
    cancel_probe: CancellationProbe,
    ftp_username: Option<String>,
    ftp_password: Option<String>,
    created_jobs: Vec<JobHandle>,
    created_claim: Option<VolumeClaimHandle>,
}

impl Supervisor {
    pub fn new(client: Arc<dyn ClusterClient>, config: &SupervisorConfig) -> Self {
        Self {
            client,
            namespace: config.namespace.clone(),
            poll_interval: config.poll_interval,
            filer_registry: config.filer_image_registry.clone(),
            filer_version: config.filer_version.clone(),
            debug: config.debug,
            cancel_probe: CancellationProbe::new(config.cancellation_label_path.clone()),
            ftp_username: config.ftp_username.clone(),
            ftp_password: config.ftp_password.clone(),
            created_jobs: Vec::new(),
            created_claim: None,
        }
    }

    pub async fn run_task(&mut self, task: &Task) -> Result<SupervisorOutcome, SupervisorError> {
        if self.cancel_probe.is_cancelled() {
            return Ok(SupervisorOutcome::Cancelled {
                reason: "Cancelled during init".to_string(),
            });
        }

        let task_name = task
            .task_name()
            .ok_or_else(|| SupervisorError::Args("task has no executors".into()))?
            .to_string();

        let staging = task.needs_staging();
        if staging {
            let claim = VolumeClaimHandle::create(
                self.client.clone(),
                &task.claim_paths(),
                "task-volume",
                format!("{task_name}-pvc"),
                task.resources.disk_gb.max(1),
                self.namespace.clone(),
            )
            .await?;
            self.created_claim = Some(claim);

            if let Some(outcome) = self.run_filer(task, Direction::Download, &task_name).await? {
                return Ok(outcome);
            }
        }

        for executor in &task.executors {
            let spec = patch_pod_spec(executor.spec.clone(), self.created_claim.as_ref());
            let job_name = executor.metadata.name.clone();
            let state = self.submit_and_wait(spec, job_name.clone()).await?;
            match state {
                JobState::Complete => {}
                JobState::Cancelled => {
                    self.cleanup().await;
                    return Ok(SupervisorOutcome::Cancelled {
                        reason: format!("executor {job_name} was cancelled"),
                    });
                }
                other => {
                    self.cleanup().await;
                    return Ok(SupervisorOutcome::JobFailed { job: job_name, state: other });
                }
            }
        }

        if staging {
            if let Some(outcome) = self.run_filer(task, Direction::Upload, &task_name).await? {
                return Ok(outcome);
            }
            if let Some(claim) = self.created_claim.as_mut() {
                claim.delete().await;
            }
        }

        Ok(SupervisorOutcome::Completed)
    }

    async fn run_filer(
        &mut self,
        task: &Task,
        direction: Direction,
        task_name: &str,
    ) -> Result<Option<SupervisorOutcome>, SupervisorError> {
        let claim = self
            .created_claim
            .as_ref()
            .expect("a task with inputs or outputs always creates a claim first");
        let spec = FilerSpecBuilder::new(task, &self.filer_registry, &self.filer_version, self.debug)
            .with_ftp_credentials(self.ftp_username.clone(), self.ftp_password.clone())
            .build(direction, claim);

        let job_name = format!("{task_name}-{}-filer", direction.as_transput_type());
        let state = self.submit_and_wait(spec, job_name.clone()).await?;
        match state {
            JobState::Complete => Ok(None),
            JobState::Cancelled => {
                self.cleanup().await;
                Ok(Some(SupervisorOutcome::Cancelled {
                    reason: format!("filer job {job_name} was cancelled"),
                }))
            }
            other => {
                self.cleanup().await;
                Ok(Some(SupervisorOutcome::JobFailed { job: job_name, state: other }))
            }
        }
    }

    /// Submit, record, then wait: the job is pushed into `created_jobs`
    /// before the wait loop starts, so a panic or early return mid-wait
    /// still leaves it reachable for `cleanup`.
    async fn submit_and_wait(
        &mut self,
        body: Value,
        name: String,
    ) -> Result<JobState, SupervisorError> {
        let mut job = JobHandle::new(self.client.clone(), body, name, self.namespace.clone());
        job.submit().await?;
        self.created_jobs.push(job);
        let probe = &self.cancel_probe;
        let job = self.created_jobs.last_mut().expect("just pushed");
        let state = job.wait(self.poll_interval, || probe.is_cancelled()).await?;
        Ok(state)
    }

    /// Best-effort teardown: delete every job this run created, most
    /// recently submitted first, then the shared claim.
    pub async fn cleanup(&mut self) {
        for job in self.created_jobs.iter_mut().rev() {
            job.delete().await;
        }
        if let Some(claim) = self.created_claim.as_mut() {
            claim.delete().await;
        }
    }
}

/// Replace `containers[0].volumeMounts` and `volumes` on a pod spec wholesale
/// not merged with whatever the executor declared, matching the original's
/// literal overwrite of those two keys.
fn patch_pod_spec(mut spec: Value, claim: Option<&VolumeClaimHandle>) -> Value {
    let Some(claim) = claim else { return spec };

    let mounts: Vec<Value> = claim
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

    if let Some(pod_spec) = spec.pointer_mut("/spec/template/spec") {
        if let Some(containers) = pod_spec.get_mut("containers").and_then(Value::as_array_mut) {
            if let Some(first) = containers.get_mut(0) {
                first["volumeMounts"] = Value::Array(mounts);
            }
        }
        pod_spec["volumes"] = json!([claim.volume()]);
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tesk_cluster::ClusterError;
    use tesk_protocol::{Condition, Executor, ExecutorLabels, ExecutorMetadata, IoEntry, IoType, Resources};

    #[derive(Default)]
    struct FakeCluster {
        job_conditions: Mutex<Vec<Condition>>,
        deleted_jobs: Mutex<Vec<String>>,
        deleted_pvcs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ClusterClient for FakeCluster {
        async fn create_job(&self, _ns: &str, _body: &Value) -> Result<(), ClusterError> {
            Ok(())
        }
        async fn job_conditions(&self, _ns: &str, _name: &str) -> Result<Vec<Condition>, ClusterError> {
            Ok(self.job_conditions.lock().unwrap().clone())
        }
        async fn delete_job(&self, _ns: &str, name: &str) -> Result<(), ClusterError> {
            self.deleted_jobs.lock().unwrap().push(name.to_string());
            Ok(())
        }
        async fn create_pvc(&self, _ns: &str, _body: &Value) -> Result<(), ClusterError> {
            Ok(())
        }
        async fn delete_pvc(&self, _ns: &str, name: &str) -> Result<(), ClusterError> {
            self.deleted_pvcs.lock().unwrap().push(name.to_string());
            Ok(())
        }
    }

    fn config() -> SupervisorConfig {
        SupervisorConfig::resolve(
            "default".into(),
            0,
            "v1".into(),
            false,
            "/tmp/does-not-matter".into(),
        )
    }

    fn bare_executor(name: &str) -> Executor {
        Executor {
            metadata: ExecutorMetadata {
                name: name.into(),
                labels: ExecutorLabels { taskmaster_name: "task-1".into() },
            },
            spec: json!({
                "spec": { "template": { "spec": { "containers": [{ "name": "c" }] } } }
            }),
        }
    }

    #[tokio::test]
    async fn completes_without_staging_when_task_has_no_io() {
        let fake = Arc::new(FakeCluster::default());
        *fake.job_conditions.lock().unwrap() = vec![Condition { ty: "Complete".into(), status: true }];
        let mut supervisor = Supervisor::new(fake.clone(), &config());

        let task = Task {
            executors: vec![bare_executor("exec-1")],
            inputs: vec![],
            outputs: vec![],
            volumes: vec![],
            resources: Resources::default(),
        };

        let outcome = supervisor.run_task(&task).await.unwrap();
        assert_eq!(outcome, SupervisorOutcome::Completed);
        assert!(supervisor.created_claim.is_none());
    }

    #[tokio::test]
    async fn completes_with_staging_in_and_out() {
        let fake = Arc::new(FakeCluster::default());
        *fake.job_conditions.lock().unwrap() = vec![Condition { ty: "Complete".into(), status: true }];
        let mut supervisor = Supervisor::new(fake.clone(), &config());

        let task = Task {
            executors: vec![bare_executor("exec-1")],
            inputs: vec![IoEntry {
                path: "/data/in.txt".into(),
                ty: IoType::File,
                url: Some("http://h/in.txt".into()),
                content: None,
            }],
            outputs: vec![IoEntry {
                path: "/data/out.txt".into(),
                ty: IoType::File,
                url: Some("s3://h/b/out.txt".into()),
                content: None,
            }],
            volumes: vec!["/data".into()],
            resources: Resources { disk_gb: 3 },
        };

        let outcome = supervisor.run_task(&task).await.unwrap();
        assert_eq!(outcome, SupervisorOutcome::Completed);
        assert!(supervisor.created_claim.is_some());
        assert_eq!(supervisor.created_jobs.len(), 3);
        // the claim is deleted on a successful run, but the jobs are not --
        // only cleanup() (cancel/failure/interrupt) deletes jobs.
        assert_eq!(fake.deleted_pvcs.lock().unwrap().len(), 1);
        assert!(fake.deleted_jobs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn completes_with_only_volumes_declared_still_runs_filers() {
        let fake = Arc::new(FakeCluster::default());
        *fake.job_conditions.lock().unwrap() = vec![Condition { ty: "Complete".into(), status: true }];
        let mut supervisor = Supervisor::new(fake.clone(), &config());

        let task = Task {
            executors: vec![bare_executor("exec-1")],
            inputs: vec![],
            outputs: vec![],
            volumes: vec!["/data".into()],
            resources: Resources { disk_gb: 1 },
        };

        let outcome = supervisor.run_task(&task).await.unwrap();
        assert_eq!(outcome, SupervisorOutcome::Completed);
        assert!(supervisor.created_claim.is_some());
        // volumes-only staging still runs both filer jobs plus the executor.
        assert_eq!(supervisor.created_jobs.len(), 3);
        assert_eq!(fake.deleted_pvcs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_at_init_never_submits_anything() {
        let fake = Arc::new(FakeCluster::default());
        let mut supervisor = Supervisor::new(fake.clone(), &config());
        supervisor.cancel_probe = CancellationProbe::new(write_cancelled_label());

        let task = Task {
            executors: vec![bare_executor("exec-1")],
            inputs: vec![IoEntry {
                path: "/data/in.txt".into(),
                ty: IoType::File,
                url: Some("http://h/in.txt".into()),
                content: None,
            }],
            outputs: vec![],
            volumes: vec![],
            resources: Resources { disk_gb: 1 },
        };

        let outcome = supervisor.run_task(&task).await.unwrap();
        assert_eq!(
            outcome,
            SupervisorOutcome::Cancelled { reason: "Cancelled during init".to_string() }
        );
        assert!(supervisor.created_claim.is_none());
        assert!(supervisor.created_jobs.is_empty());
    }

    #[tokio::test]
    async fn mid_task_cancellation_stops_and_cleans_up() {
        let fake = Arc::new(FakeCluster::default());
        // never terminal -- force cancellation via the probe instead.
        fake.job_conditions.lock().unwrap().clear();
        let mut supervisor = Supervisor::new(fake.clone(), &config());
        // force the probe to report cancelled on the first poll.
        supervisor.cancel_probe = CancellationProbe::new(write_cancelled_label());

        let task = Task {
            executors: vec![bare_executor("exec-1")],
            inputs: vec![],
            outputs: vec![],
            volumes: vec![],
            resources: Resources::default(),
        };

        let outcome = supervisor.run_task(&task).await.unwrap();
        match outcome {
            SupervisorOutcome::Cancelled { .. } => {}
            other => panic!("expected Cancelled, got {other:?}"),
        }
        assert_eq!(fake.deleted_jobs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn executor_failure_reports_job_failed_and_cleans_up() {
        let fake = Arc::new(FakeCluster::default());
        *fake.job_conditions.lock().unwrap() = vec![Condition { ty: "Failed".into(), status: true }];
        let mut supervisor = Supervisor::new(fake.clone(), &config());

        let task = Task {
            executors: vec![bare_executor("exec-1"), bare_executor("exec-2")],
            inputs: vec![],
            outputs: vec![],
            volumes: vec![],
            resources: Resources::default(),
        };

        let outcome = supervisor.run_task(&task).await.unwrap();
        match outcome {
            SupervisorOutcome::JobFailed { job, state } => {
                assert_eq!(job, "exec-1");
                assert_eq!(state, JobState::Failed);
            }
            other => panic!("expected JobFailed, got {other:?}"),
        }
        // only the first executor ran; the second must never be submitted.
        assert_eq!(supervisor.created_jobs.len(), 1);
        assert_eq!(fake.deleted_jobs.lock().unwrap().len(), 1);
    }

    fn write_cancelled_label() -> std::path::PathBuf {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "state=\"Cancelled\"\n").unwrap();
        file.keep().unwrap().1
    }
}
