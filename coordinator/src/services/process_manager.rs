//! Real process management service implementation
//!
//! Spawns worker processes and supervises each one until it is reaped. The
//! exit status of every started worker is reported exactly once on the
//! coordinator's exit channel.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex};

use crate::error::{CoordinatorError, CoordinatorResult};
use crate::traits::{ProcessManager, SpawnedWorker};
use shared::{process_debug, process_error, process_warn, ExitRecord, ProcessId, WorkerId};

/// Real process manager implementation
pub struct RealProcessManager {
    /// Worker executable
    program: PathBuf,

    /// Dataset root passed through to workers
    dataset_dir: PathBuf,

    /// Artifact directory passed through to workers
    model_dir: PathBuf,

    /// Train on annotated utterances
    use_annot: bool,

    /// Log level to pass to spawned processes
    log_level: String,

    /// PIDs of workers that have not been reaped yet
    running: Arc<Mutex<HashMap<WorkerId, u32>>>,
}

impl RealProcessManager {
    /// Create new process manager launching `program` for every worker
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            dataset_dir: PathBuf::from("./data"),
            model_dir: PathBuf::from("./models"),
            use_annot: false,
            log_level: "info".to_string(),
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Configure dataset root (fluent API)
    pub fn with_dataset_dir(mut self, dataset_dir: impl Into<PathBuf>) -> Self {
        self.dataset_dir = dataset_dir.into();
        self
    }

    /// Configure artifact directory (fluent API)
    pub fn with_model_dir(mut self, model_dir: impl Into<PathBuf>) -> Self {
        self.model_dir = model_dir.into();
        self
    }

    /// Configure annotated training (fluent API)
    pub fn with_use_annot(mut self, use_annot: bool) -> Self {
        self.use_annot = use_annot;
        self
    }

    /// Configure log level (fluent API)
    pub fn with_log_level(mut self, log_level: String) -> Self {
        self.log_level = log_level;
        self
    }

    /// Number of spawned workers still running
    pub async fn running_count(&self) -> usize {
        self.running.lock().await.len()
    }

    fn command_for(&self, worker_id: WorkerId, coordinator_addr: SocketAddr) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--id")
            .arg(worker_id.0.to_string())
            .arg("--coordinator-addr")
            .arg(coordinator_addr.to_string())
            .arg("--dataset-dir")
            .arg(&self.dataset_dir)
            .arg("--model-dir")
            .arg(&self.model_dir)
            .arg("--log-level")
            .arg(&self.log_level);

        if self.use_annot {
            cmd.arg("--use-annot");
        }

        // Worker logs go straight to the coordinator's terminal
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit()).stdin(Stdio::null());
        cmd
    }

    /// Spawn a single worker process
    fn spawn_single_worker(&self, worker_id: WorkerId, coordinator_addr: SocketAddr) -> CoordinatorResult<Child> {
        self.command_for(worker_id, coordinator_addr)
            .spawn()
            .map_err(|e| CoordinatorError::WorkerSpawnFailed {
                worker_id,
                message: format!("{}: {e}", self.program.display()),
            })
    }

    /// Wait for the child to exit, then report it
    fn supervise(
        worker_id: WorkerId,
        mut child: Child,
        exits: mpsc::Sender<ExitRecord>,
        running: Arc<Mutex<HashMap<WorkerId, u32>>>,
    ) {
        tokio::spawn(async move {
            let record = match child.wait().await {
                Ok(status) => ExitRecord::from_status(worker_id, status),
                Err(e) => {
                    process_error!(ProcessId::current(), "❌ Lost track of {}: {}", worker_id, e);
                    ExitRecord::abnormal(worker_id, None, None)
                }
            };

            running.lock().await.remove(&worker_id);
            process_debug!(ProcessId::current(), "🪦 {} reaped ({})", worker_id, record.kind);

            if exits.send(record).await.is_err() {
                process_debug!(ProcessId::current(), "Exit of {} not delivered: coordinator gone", worker_id);
            }
        });
    }

    #[cfg(unix)]
    fn request_stop(worker_id: WorkerId, pid: u32) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let Ok(raw) = i32::try_from(pid) else {
            return;
        };
        if let Err(e) = kill(Pid::from_raw(raw), Signal::SIGTERM) {
            process_warn!(ProcessId::current(), "⚠️ Failed to signal {} (PID {}): {}", worker_id, pid, e);
        }
    }

    #[cfg(not(unix))]
    fn request_stop(worker_id: WorkerId, pid: u32) {
        process_warn!(
            ProcessId::current(),
            "⚠️ Cannot signal {} (PID {}) on this platform",
            worker_id,
            pid
        );
    }
}

#[async_trait]
impl ProcessManager for RealProcessManager {
    async fn spawn_pool(
        &self,
        count: u32,
        coordinator_addr: SocketAddr,
        exits: mpsc::Sender<ExitRecord>,
    ) -> CoordinatorResult<Vec<SpawnedWorker>> {
        let mut spawned = Vec::with_capacity(count as usize);

        for i in 0..count {
            // Worker IDs are 1-based (worker_1, worker_2, etc.)
            let worker_id = WorkerId(i + 1);

            match self.spawn_single_worker(worker_id, coordinator_addr) {
                Ok(child) => {
                    let pid = child.id();
                    if let Some(pid) = pid {
                        self.running.lock().await.insert(worker_id, pid);
                    }
                    Self::supervise(worker_id, child, exits.clone(), self.running.clone());

                    process_debug!(
                        ProcessId::current(),
                        "🏭 Spawned {} (PID: {}) connecting to {}",
                        worker_id,
                        pid.map_or_else(|| "?".to_string(), |p| p.to_string()),
                        coordinator_addr
                    );
                    spawned.push(SpawnedWorker { worker_id, pid });
                }
                Err(e) => {
                    process_error!(ProcessId::current(), "⚠️ {}", e);
                    // Continue with other workers
                }
            }
        }

        process_debug!(ProcessId::current(), "🚀 Spawned {} of {} workers", spawned.len(), count);
        Ok(spawned)
    }

    async fn stop_all(&self) -> CoordinatorResult<()> {
        let running: Vec<(WorkerId, u32)> = self.running.lock().await.iter().map(|(id, pid)| (*id, *pid)).collect();

        for (worker_id, pid) in running {
            Self::request_stop(worker_id, pid);
            process_debug!(ProcessId::current(), "🛑 Asked {} to stop", worker_id);
        }

        Ok(())
    }
}
