//! Task JSON shape, as documented in the external interface for the
//! supervisor's positional `json`/`-f` argument.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Direction of a transput: staging data in before executors run, or
/// staging it out after they finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Download,
    Upload,
}

impl Direction {
    /// The key under which this direction's entries live in the task JSON
    /// (`"inputs"` or `"outputs"`), matching what the filer binary expects
    /// as its `transputtype` positional argument.
    pub fn as_transput_type(self) -> &'static str {
        match self {
            Direction::Download => "inputs",
            Direction::Upload => "outputs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IoType {
    #[serde(rename = "FILE")]
    File,
    #[serde(rename = "DIRECTORY")]
    Directory,
}

/// A single input or output entry. `url` and `content` are mutually
/// exclusive for inputs; outputs always carry `url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IoEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub ty: IoType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl IoEntry {
    /// The directory component to mount for this entry: the entry's path
    /// itself for a `DIRECTORY`, or its parent directory for a `FILE`.
    pub fn mount_path(&self) -> String {
        match self.ty {
            IoType::Directory => self.path.clone(),
            IoType::File => match self.path.rfind('/') {
                Some(0) => "/".to_string(),
                Some(idx) => self.path[..idx].to_string(),
                None => ".".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutorMetadata {
    pub name: String,
    pub labels: ExecutorLabels,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutorLabels {
    #[serde(rename = "taskmaster-name")]
    pub taskmaster_name: String,
}

/// An executor entry. The job spec body is kept as an opaque `Value`;
/// this crate only ever reaches into `spec.template.spec` to patch
/// `containers[0].volumeMounts` and `volumes`, never models the rest of
/// the Kubernetes pod spec.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Executor {
    pub metadata: ExecutorMetadata,
    pub spec: Value,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Resources {
    #[serde(default)]
    pub disk_gb: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Task {
    pub executors: Vec<Executor>,
    #[serde(default)]
    pub inputs: Vec<IoEntry>,
    #[serde(default)]
    pub outputs: Vec<IoEntry>,
    #[serde(default)]
    pub volumes: Vec<String>,
    #[serde(default)]
    pub resources: Resources,
}

impl Task {
    /// Shared task identifier, read from the first executor's
    /// `metadata.labels.taskmaster-name`, per the data model: this label is
    /// required to be the same across every executor of one task.
    pub fn task_name(&self) -> Option<&str> {
        self.executors
            .first()
            .map(|e| e.metadata.labels.taskmaster_name.as_str())
    }

    /// Whether any staging is needed at all. An empty task (no volumes, no
    /// inputs, no outputs) creates no claim and no filer jobs.
    pub fn needs_staging(&self) -> bool {
        !self.volumes.is_empty() || !self.inputs.is_empty() || !self.outputs.is_empty()
    }

    /// The full set of paths that must be mounted into every filer and
    /// executor pod: the declared `volumes[]` union the mount path of every
    /// input and output entry, in declaration order, duplicates included.
    pub fn claim_paths(&self) -> Vec<String> {
        let mut paths = self.volumes.clone();
        paths.extend(self.inputs.iter().map(IoEntry::mount_path));
        paths.extend(self.outputs.iter().map(IoEntry::mount_path));
        paths
    }
}
