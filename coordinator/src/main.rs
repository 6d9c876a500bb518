//! Main entry point for the coordinator binary
//!
//! Wires the real services into a [`Coordinator`] and prints the final
//! report.

use anyhow::Context;
use clap::Parser;
use tokio::signal;

use coordinator::{
    services::{RealCommunicator, RealFileSystem, RealProcessManager},
    Args, Coordinator, RunConfig,
};
use shared::{logging, process_debug, ProcessId};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads the environment
    dotenv::dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize process ID singleton for coordinator
    ProcessId::init_coordinator();
    logging::init_tracing_with_level(Some(&args.log_level));

    let config = RunConfig::from_args(args).context("invalid configuration")?;
    config.validate().context("invalid configuration")?;

    logging::log_startup(
        ProcessId::current(),
        &format!("coordinator with a pool of {} workers", config.pool_size),
    );
    process_debug!(
        ProcessId::current(),
        "Datasets: {}, Models: {}, Worker: {}",
        config.dataset_dir.display(),
        config.model_dir.display(),
        config.worker_bin.display()
    );

    // Initialize services
    let communicator = RealCommunicator::new();
    let process_manager = RealProcessManager::new(config.worker_bin.clone())
        .with_dataset_dir(config.dataset_dir.clone())
        .with_model_dir(config.model_dir.clone())
        .with_use_annot(config.use_annot)
        .with_log_level(config.log_level.clone());
    let file_system = RealFileSystem::with_dataset_dir(config.dataset_dir.clone());

    // Create coordinator with dependency injection
    let mut coordinator = Coordinator::new(config, communicator, process_manager, file_system);

    // Set up graceful shutdown
    let shutdown_sender = coordinator.get_shutdown_sender();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                logging::log_shutdown(ProcessId::current(), "Received Ctrl+C signal");
                let _ = shutdown_sender.send(()).await;
            }
            Err(err) => {
                logging::log_error(ProcessId::current(), "Signal handling", &err);
            }
        }
    });

    let report = coordinator.run().await.context("training run failed")?;

    println!("{report}");
    logging::log_success(ProcessId::current(), "Coordinator stopped gracefully");
    Ok(())
}
