//! Cluster job and volume-claim handles.
//!
//! This crate is the boundary between the task supervisor and the
//! cluster's job/volume API: an external collaborator that accepts
//! declarative specs and reports status via a `conditions[]` list.

mod client;
mod error;
mod job;
mod volume;

pub use client::{ClusterClient, ReqwestClusterClient};
pub use error::ClusterError;
pub use job::JobHandle;
pub use volume::VolumeClaimHandle;
