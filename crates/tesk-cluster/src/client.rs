//! The cluster API boundary.
//!
//! This module treats "the cluster's job/volume API" as an external
//! collaborator, assumed to accept declarative specs and report status via
//! a `conditions[]` list. This trait is that boundary: production code talks
//! to it over `reqwest`; tests substitute an in-memory fake so the
//! supervisor's sequencing and cleanup logic can be exercised without a
//! real cluster.

use crate::error::ClusterError;
use async_trait::async_trait;
use serde_json::Value;
use tesk_protocol::Condition;

#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn create_job(&self, namespace: &str, body: &Value) -> Result<(), ClusterError>;
    async fn job_conditions(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<Condition>, ClusterError>;
    async fn delete_job(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;

    async fn create_pvc(&self, namespace: &str, body: &Value) -> Result<(), ClusterError>;
    async fn delete_pvc(&self, namespace: &str, name: &str) -> Result<(), ClusterError>;
}

/// `reqwest`-backed `ClusterClient` talking to a cluster API server that
/// exposes batch jobs and persistent volume claims under a namespace, e.g.
/// `{base_url}/namespaces/{namespace}/jobs`.
pub struct ReqwestClusterClient {
    base_url: String,
    client: reqwest::Client,
}

impl ReqwestClusterClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn jobs_url(&self, namespace: &str) -> String {
        format!("{}/namespaces/{}/jobs", self.base_url, namespace)
    }

    fn job_url(&self, namespace: &str, name: &str) -> String {
        format!("{}/{}", self.jobs_url(namespace), name)
    }

    fn pvcs_url(&self, namespace: &str) -> String {
        format!(
            "{}/namespaces/{}/persistentvolumeclaims",
            self.base_url, namespace
        )
    }

    fn pvc_url(&self, namespace: &str, name: &str) -> String {
        format!("{}/{}", self.pvcs_url(namespace), name)
    }
}

#[async_trait]
impl ClusterClient for ReqwestClusterClient {
    async fn create_job(&self, namespace: &str, body: &Value) -> Result<(), ClusterError> {
        let resp = self
            .client
            .post(self.jobs_url(namespace))
            .json(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClusterError::Rejected(format!(
                "create job: cluster returned {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn job_conditions(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<Condition>, ClusterError> {
        let resp = self.client.get(self.job_url(namespace, name)).send().await?;
        if resp.status().as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(ClusterError::Rejected(format!(
                "get job: cluster returned {}",
                resp.status()
            )));
        }
        let body: Value = resp.json().await?;
        let conditions = body
            .pointer("/status/conditions")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| ClusterError::Rejected(format!("malformed conditions: {e}")))?
            .unwrap_or_default();
        Ok(conditions)
    }

    async fn delete_job(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        let resp = self
            .client
            .delete(self.job_url(namespace, name))
            .send()
            .await?;
        if !resp.status().is_success() && resp.status().as_u16() != 404 {
            tracing::warn!(
                "delete job {} returned non-success status {}; ignoring (best-effort delete)",
                name,
                resp.status()
            );
        }
        Ok(())
    }

    async fn create_pvc(&self, namespace: &str, body: &Value) -> Result<(), ClusterError> {
        let resp = self
            .client
            .post(self.pvcs_url(namespace))
            .json(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClusterError::Rejected(format!(
                "create pvc: cluster returned {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn delete_pvc(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        let resp = self
            .client
            .delete(self.pvc_url(namespace, name))
            .send()
            .await?;
        if !resp.status().is_success() && resp.status().as_u16() != 404 {
            tracing::warn!(
                "delete pvc {} returned non-success status {}; ignoring (best-effort delete)",
                name,
                resp.status()
            );
        }
        Ok(())
    }
}
