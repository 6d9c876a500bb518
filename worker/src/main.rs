//! Worker binary entry point
//!
//! Spawned by the coordinator, one process per pool slot.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use shared::{logging, ProcessId, WorkerId};
use worker::services::{BaselineExecutor, RealIpcCommunicator, DEFAULT_FALLBACK_INTENT};
use worker::Worker;

#[derive(Parser, Debug)]
#[command(name = "worker")]
#[command(about = "Trains locale intent models assigned by the coordinator")]
struct Args {
    /// Pool slot assigned by the coordinator
    #[arg(long)]
    id: u32,

    /// Coordinator listener address
    #[arg(long)]
    coordinator_addr: SocketAddr,

    #[arg(long, default_value = "./data")]
    dataset_dir: PathBuf,

    #[arg(long, default_value = "./models")]
    model_dir: PathBuf,

    /// Train on annot_utt instead of utt
    #[arg(long)]
    use_annot: bool,

    /// Intent reported when an utterance has no known features
    #[arg(long, env = "TRAINPOOL_FALLBACK_INTENT", default_value = DEFAULT_FALLBACK_INTENT)]
    fallback_intent: String,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let worker_id = WorkerId(args.id);
    let process_id = ProcessId::init_worker(args.id);
    logging::init_tracing_with_level(Some(&args.log_level));
    logging::log_startup(process_id, &format!("connecting to {}", args.coordinator_addr));

    // Failures are logged once here; the coordinator only sees the exit status
    match run(worker_id, args).await {
        Ok(()) => {
            logging::log_shutdown(process_id, "terminated by coordinator");
            ExitCode::SUCCESS
        }
        Err(e) => {
            logging::log_error(process_id, "Worker", &e);
            ExitCode::FAILURE
        }
    }
}

async fn run(worker_id: WorkerId, args: Args) -> anyhow::Result<()> {
    let communicator = RealIpcCommunicator::connect(args.coordinator_addr, worker_id).await?;
    let executor = BaselineExecutor::new(args.dataset_dir, args.model_dir)
        .with_use_annot(args.use_annot)
        .with_fallback_intent(args.fallback_intent);

    let mut worker = Worker::new(worker_id, communicator, executor);
    let summary = worker.run().await?;

    logging::log_success(
        ProcessId::current(),
        &format!("{} tasks completed", summary.completed.len()),
    );
    Ok(())
}
