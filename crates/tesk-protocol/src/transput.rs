//! `TransputRequest`, the normalized unit the transput engine acts on
//! An `IoEntry` carries a `content` field that the
//! dispatcher intercepts before ever constructing one of these; every
//! `TransputRequest` that exists has a real `url` to act on.

use crate::task::{Direction, IoEntry, IoType};

#[derive(Debug, Clone)]
pub struct TransputRequest {
    pub path: String,
    pub url: String,
    pub ty: IoType,
    pub direction: Direction,
}

impl TransputRequest {
    /// Build a request from an `IoEntry` known to carry a `url`. Returns
    /// `None` for content-bearing entries, which the caller must have
    /// already handled via the content-bypass path.
    pub fn from_entry(entry: &IoEntry, direction: Direction) -> Option<Self> {
        entry.url.clone().map(|url| TransputRequest {
            path: entry.path.clone(),
            url,
            ty: entry.ty,
            direction,
        })
    }
}
