//! `teskmaster`: the per-task controller. Takes one task description (as a
//! positional JSON argument, a `--file`, or `-` on stdin), stages its inputs
//! in, runs its executors in order, stages its outputs out, and exits.

use std::io::Read as _;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tesk_cluster::{ClusterClient, ReqwestClusterClient};
use tesk_protocol::Task;
use tesk_supervisor::{CallbackEmitter, Supervisor, SupervisorConfig, SupervisorOutcome};

#[derive(Parser, Debug)]
#[command(name = "teskmaster", about = "Per-task controller for the task execution supervisor")]
struct Args {
    /// Task JSON given directly on the command line.
    json: Option<String>,

    /// Read the task JSON from a file instead (`-` reads stdin).
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,

    #[arg(short = 'n', long = "namespace", default_value = "default")]
    namespace: String,

    #[arg(long = "poll-interval", default_value_t = 5)]
    poll_interval: u64,

    /// Filer image tag. Also reachable as `--fv` for compatibility with the
    /// original two-letter flag, which clap cannot express as a short flag.
    #[arg(long = "filer-version", visible_alias = "fv", default_value = "latest")]
    filer_version: String,

    #[arg(short = 'd', long = "debug")]
    debug: bool,

    #[arg(short = 's', long = "state-file", default_value = "/tmp/.teskstate")]
    state_file: String,
}

fn read_task_source(args: &Args) -> anyhow::Result<String> {
    match (&args.json, &args.file) {
        (Some(json), None) => Ok(json.clone()),
        (None, Some(path)) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        (None, Some(path)) => Ok(std::fs::read_to_string(path)?),
        (Some(_), Some(_)) => anyhow::bail!("pass the task as a positional argument or --file, not both"),
        (None, None) => anyhow::bail!("no task given: pass it as a positional argument, --file, or `-f -` for stdin"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tesk_logging::init("tesk_supervisor", args.debug);

    let raw = read_task_source(&args)?;
    let task: Task = serde_json::from_str(&raw)?;
    let task_id = task.task_name().unwrap_or("unknown-task").to_string();

    let config = SupervisorConfig::resolve(
        args.namespace.clone(),
        args.poll_interval,
        args.filer_version.clone(),
        args.debug,
        args.state_file.clone(),
    );

    let client: Arc<dyn ClusterClient> =
        Arc::new(ReqwestClusterClient::new(config.cluster_api_url.clone()));
    let callback = CallbackEmitter::new(config.callback_url.clone(), task_id);
    let mut supervisor = Supervisor::new(client, &config);

    // Racing the run against Ctrl-C relies on `select!` dropping the losing
    // branch's future before running the winner's body: once `run_task`'s
    // future is dropped, its borrow of `supervisor` is released, so the
    // ctrl_c arm is free to call `supervisor.cleanup()`.
    let outcome = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("received interrupt signal, tearing down task resources");
            supervisor.cleanup().await;
            callback.emit("Cancelled").await;
            std::process::exit(0);
        }
        result = supervisor.run_task(&task) => result?,
    };

    // A cancelled or failed task still exits 0 -- only an unhandled
    // internal error or a bad invocation exits non-zero, matching the
    // original's `exit_cancelled()` always calling `sys.exit(0)`.
    match outcome {
        SupervisorOutcome::Completed => {
            callback.emit("Complete").await;
        }
        SupervisorOutcome::Cancelled { reason } => {
            tracing::warn!("{reason}");
            callback.emit("Cancelled").await;
        }
        SupervisorOutcome::JobFailed { job, state } => {
            tracing::error!("job {job} ended in state {state:?}");
            callback.emit("Error").await;
        }
    }

    Ok(())
}
