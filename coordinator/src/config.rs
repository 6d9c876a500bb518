//! Command line and environment configuration for a training run

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use shared::TaskId;

use crate::error::{CoordinatorError, CoordinatorResult};

/// Coordinator for distributing locale training jobs over a worker pool
#[derive(Parser, Debug, Clone)]
#[command(name = "coordinator")]
#[command(about = "Trains one intent model per locale across a pool of worker processes")]
pub struct Args {
    /// Explicit task allow-list (comma separated); scans the dataset directory when omitted
    #[arg(long, env = "TRAINPOOL_TASKS", value_delimiter = ',')]
    pub tasks: Option<Vec<String>>,

    /// Number of worker processes (defaults to the number of CPU cores)
    #[arg(long, env = "TRAINPOOL_POOL_SIZE")]
    pub pool_size: Option<u32>,

    /// Directory containing one <locale>.jsonl dataset per task
    #[arg(long, env = "TRAINPOOL_DATASET_DIR", default_value = "./data")]
    pub dataset_dir: PathBuf,

    /// Directory receiving trained model artifacts
    #[arg(long, env = "TRAINPOOL_MODEL_DIR", default_value = "./models")]
    pub model_dir: PathBuf,

    /// Train on the annotated utterances instead of the plain ones
    #[arg(long, env = "TRAINPOOL_USE_ANNOT")]
    pub use_annot: bool,

    /// Worker listener bind address
    #[arg(long, env = "TRAINPOOL_BIND_ADDR", default_value = "127.0.0.1:0")]
    pub bind_addr: SocketAddr,

    /// Worker executable (defaults to the `worker` binary next to this one)
    #[arg(long, env = "TRAINPOOL_WORKER_BIN")]
    pub worker_bin: Option<PathBuf>,

    /// Write the final run report as JSON to this path
    #[arg(long, env = "TRAINPOOL_REPORT")]
    pub report: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TRAINPOOL_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Resolved settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// `None` means discover tasks from `dataset_dir`
    pub tasks: Option<Vec<TaskId>>,
    pub pool_size: u32,
    pub dataset_dir: PathBuf,
    pub model_dir: PathBuf,
    pub use_annot: bool,
    pub bind_addr: SocketAddr,
    pub worker_bin: PathBuf,
    pub report_path: Option<PathBuf>,
    pub log_level: String,
}

impl RunConfig {
    /// Resolve defaults and parse task identifiers
    pub fn from_args(args: Args) -> CoordinatorResult<Self> {
        let tasks = args
            .tasks
            .map(|names| {
                names
                    .iter()
                    .map(|name| name.trim())
                    .filter(|name| !name.is_empty())
                    .map(TaskId::new)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()
            .map_err(|e| CoordinatorError::config("tasks", e.to_string()))?;

        let worker_bin = match args.worker_bin {
            Some(path) => path,
            None => default_worker_bin()?,
        };

        Ok(Self {
            tasks,
            pool_size: args.pool_size.unwrap_or_else(default_pool_size),
            dataset_dir: args.dataset_dir,
            model_dir: args.model_dir,
            use_annot: args.use_annot,
            bind_addr: args.bind_addr,
            worker_bin,
            report_path: args.report,
            log_level: args.log_level,
        })
    }

    /// Reject settings that cannot produce a run
    pub fn validate(&self) -> CoordinatorResult<()> {
        if self.pool_size == 0 {
            return Err(CoordinatorError::config("pool_size", "must be at least 1"));
        }

        if self.tasks.is_none() && !self.dataset_dir.is_dir() {
            return Err(CoordinatorError::config(
                "dataset_dir",
                format!("{} is not a directory", self.dataset_dir.display()),
            ));
        }

        Ok(())
    }
}

/// One worker per CPU core
pub fn default_pool_size() -> u32 {
    u32::try_from(num_cpus::get()).unwrap_or(u32::MAX).max(1)
}

/// The `worker` binary installed next to the running coordinator
pub fn default_worker_bin() -> CoordinatorResult<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| CoordinatorError::config("worker_bin", format!("cannot locate current executable: {e}")))?;
    Ok(exe.with_file_name(format!("worker{}", std::env::consts::EXE_SUFFIX)))
}
