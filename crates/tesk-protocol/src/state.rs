//! Job Handle state machine.

use serde::{Deserialize, Serialize};

/// One entry of a cluster job's `status.conditions[]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub ty: String,
    pub status: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Initialized,
    Running,
    Complete,
    Failed,
    /// Condition list present but carrying an unrecognized type/status
    /// combination. Terminal, treated as a failure.
    Error,
    /// Deleted locally in response to a cancellation signal.
    Cancelled,
}

impl JobState {
    /// True once the job can no longer transition further.
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Initialized | JobState::Running)
    }

    /// The state-mapping rule: read only `conditions[0]`. Absent
    /// conditions mean the cluster hasn't populated them yet (the job is
    /// still `Running`, not failed). A present condition with `status` true
    /// and `type` in {Complete, Failed} maps to that state; anything else
    /// present is `Error`.
    pub fn from_conditions(conditions: &[Condition]) -> JobState {
        match conditions.first() {
            None => JobState::Running,
            Some(cond) if cond.status && cond.ty == "Complete" => JobState::Complete,
            Some(cond) if cond.status && cond.ty == "Failed" => JobState::Failed,
            Some(_) => JobState::Error,
        }
    }
}
