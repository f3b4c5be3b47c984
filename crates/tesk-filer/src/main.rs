//! `tesk-filer`: a short-lived job that stages one half (inputs, or
//! outputs) of a task's data in or out of its shared working volume. Run
//! once per direction by the supervisor, inside the same volume mounts the
//! task's executors will use.

use clap::Parser;
use serde::Deserialize;
use tesk_protocol::{Direction, IoEntry};
use tesk_transput::Engine;

#[derive(Parser, Debug)]
#[command(name = "tesk-filer", about = "Stages a task's inputs or outputs in or out of its working volume")]
struct Args {
    /// "inputs" or "outputs" -- which half of `data` to process.
    transputtype: String,

    /// A JSON object carrying the `inputs`/`outputs` entry lists. Both keys
    /// are expected to be present (the inactive one as an empty array).
    data: String,

    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

#[derive(Debug, Deserialize)]
struct TransputData {
    #[serde(default)]
    inputs: Vec<IoEntry>,
    #[serde(default)]
    outputs: Vec<IoEntry>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tesk_logging::init("tesk_filer", args.debug);

    let direction = match args.transputtype.as_str() {
        "inputs" => Direction::Download,
        "outputs" => Direction::Upload,
        other => {
            anyhow::bail!("unknown transput type \"{other}\", expected \"inputs\" or \"outputs\"")
        }
    };

    let data: TransputData = serde_json::from_str(&args.data)?;
    let entries = match direction {
        Direction::Download => &data.inputs,
        Direction::Upload => &data.outputs,
    };

    let engine = Engine::new();
    for entry in entries {
        tracing::info!(path = %entry.path, ?direction, "staging entry");
        if let Err(err) = engine.process(entry, direction).await {
            tracing::error!(path = %entry.path, %err, "transput failed");
            std::process::exit(1);
        }
    }

    Ok(())
}
