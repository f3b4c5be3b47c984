//! Tracing setup shared by `teskmaster` and `tesk-filer`.
//!
//! Both binaries are short-lived, one-task-and-exit processes, so unlike a
//! long-running daemon there is no rolling file writer here; everything
//! goes to stderr, matching the original Python's
//! `logging.basicConfig(...)` call which logged to stderr by default.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// `app_target` is the crate's own tracing target prefix (e.g.
/// `"tesk_supervisor"`); it is set to `debug` when `debug` is true and
/// `error` otherwise, mirroring the original's
/// `logging.DEBUG if DEBUG else logging.ERROR`. HTTP client internals
/// (`reqwest`, `hyper`, `h2`, `aws_*`) are always capped at `warn`, the Rust
/// equivalent of the original's
/// `logging.getLogger('kubernetes.client').setLevel(logging.CRITICAL)`
/// noise suppression.
pub fn init(app_target: &str, debug: bool) {
    let level = if debug { "debug" } else { "error" };
    let directive = format!(
        "{app_target}={level},reqwest=warn,hyper=warn,h2=warn,aws_config=warn,aws_sdk_s3=warn,aws_smithy_runtime=warn"
    );

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
