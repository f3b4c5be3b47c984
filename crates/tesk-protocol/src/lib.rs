//! Shared data model for the task execution supervisor.
//!
//! Every other crate in the workspace (`tesk-cluster`, `tesk-transput`,
//! `tesk-supervisor`, `tesk-filer`) depends on this one for the task JSON
//! shape, the job state machine, and the error types that cross crate
//! boundaries.

mod error;
mod mount;
mod state;
mod task;
mod transput;

pub use error::TaskError;
pub use mount::{subfolders_in, MountDescriptor};
pub use state::{Condition, JobState};
pub use task::{Direction, Executor, ExecutorLabels, ExecutorMetadata, IoEntry, IoType, Resources, Task};
pub use transput::TransputRequest;
