//! Job Handle.

use crate::client::ClusterClient;
use crate::error::ClusterError;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tesk_protocol::JobState;

/// A single cluster job: created in-memory, submitted, polled to
/// completion or cancellation, and (best-effort) deleted.
pub struct JobHandle {
    name: String,
    namespace: String,
    body: Value,
    state: JobState,
    client: Arc<dyn ClusterClient>,
    deleted: bool,
}

impl JobHandle {
    pub fn new(
        client: Arc<dyn ClusterClient>,
        mut body: Value,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        let name = name.into();
        if let Some(metadata) = body.get_mut("metadata").and_then(Value::as_object_mut) {
            metadata.insert("name".to_string(), Value::String(name.clone()));
        }
        Self {
            name,
            namespace: namespace.into(),
            body,
            state: JobState::Initialized,
            client,
            deleted: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Submit the embedded job spec under this handle's namespace.
    pub async fn submit(&mut self) -> Result<(), ClusterError> {
        tracing::debug!("submitting job {}", self.name);
        self.client.create_job(&self.namespace, &self.body).await?;
        self.state = JobState::Running;
        Ok(())
    }

    /// Poll the cluster until the job reaches a terminal state, or a
    /// cancellation is observed between polls. `check_cancelled` is called
    /// exactly once per poll cycle; a positive result deletes the job,
    /// transitions it to `Cancelled`, and returns immediately without
    /// sleeping.
    pub async fn wait<F>(
        &mut self,
        poll_interval: Duration,
        mut check_cancelled: F,
    ) -> Result<JobState, ClusterError>
    where
        F: FnMut() -> bool,
    {
        loop {
            let conditions = self.client.job_conditions(&self.namespace, &self.name).await?;
            self.state = JobState::from_conditions(&conditions);
            if self.state.is_terminal() {
                return Ok(self.state);
            }

            if check_cancelled() {
                self.delete().await;
                self.state = JobState::Cancelled;
                return Ok(self.state);
            }

            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Idempotent, best-effort deletion. Errors are logged, never raised;
    /// cleanup must never fail the cleanup path itself. A second call is a
    /// no-op: it doesn't even reach the cluster client.
    pub async fn delete(&mut self) {
        if self.deleted {
            return;
        }
        self.deleted = true;
        if let Err(err) = self.client.delete_job(&self.namespace, &self.name).await {
            tracing::warn!("failed to delete job {}: {}", self.name, err);
        }
    }
}
