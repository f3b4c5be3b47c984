//! Task execution sequencing: stage data in, run executors in declared
//! order, stage data out, polling a cluster job API and watching for an
//! operator-issued cancellation signal throughout.

mod callback;
mod cancel;
mod config;
mod error;
mod filer_spec;
mod supervisor;

pub use callback::CallbackEmitter;
pub use cancel::CancellationProbe;
pub use config::SupervisorConfig;
pub use error::SupervisorError;
pub use filer_spec::FilerSpecBuilder;
pub use supervisor::{Supervisor, SupervisorOutcome};
