//! Main coordinator implementation
//!
//! Drives one training run: builds the queue, spawns the pool, then feeds
//! worker events and process exits into [`CoordinatorState`] until every
//! worker has been reaped.

use std::collections::HashMap;

use tokio::sync::mpsc;

use shared::{
    logging, process_debug, process_info, process_warn, CoordinatorMessage, ExitRecord, ProcessId, WorkerId,
    WorkerLifecycle, WorkerMessage,
};

use crate::{
    config::RunConfig,
    core::{CoordinatorState, PendingQueue, RunReport},
    error::{CoordinatorError, CoordinatorResult},
    traits::{Communicator, FileSystem, InboundEvent, ProcessManager},
};

/// Coordinator owning the injected services for one run
pub struct Coordinator<C, P, F>
where
    C: Communicator + Send + Sync + 'static,
    P: ProcessManager + Send + Sync + 'static,
    F: FileSystem + Send + Sync + 'static,
{
    config: RunConfig,

    /// Injected services
    communicator: C,
    process_manager: P,
    file_system: F,

    /// Shutdown signal
    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl<C, P, F> Coordinator<C, P, F>
where
    C: Communicator + Send + Sync + 'static,
    P: ProcessManager + Send + Sync + 'static,
    F: FileSystem + Send + Sync + 'static,
{
    /// Create new coordinator with injected dependencies
    pub fn new(config: RunConfig, communicator: C, process_manager: P, file_system: F) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        Self {
            config,
            communicator,
            process_manager,
            file_system,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Get shutdown sender for external shutdown triggers
    pub fn get_shutdown_sender(&self) -> mpsc::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run the pool to completion and return the finalized report
    pub async fn run(&mut self) -> CoordinatorResult<RunReport> {
        let tasks = match &self.config.tasks {
            Some(tasks) => tasks.clone(),
            None => self.file_system.discover_tasks().await?,
        };
        let queue = PendingQueue::from_tasks(tasks);
        let pool_size = self.config.pool_size;
        logging::log_progress(
            ProcessId::current(),
            "Queued",
            &format!("{} tasks for a pool of {} workers", queue.len(), pool_size),
        );

        let mut state = CoordinatorState::new(queue, pool_size);

        let (listen_addr, mut events) = self.communicator.start_listener(self.config.bind_addr).await?;
        process_debug!(ProcessId::current(), "🏭 Worker listener: {}", listen_addr);

        let (exit_tx, mut exit_rx) = mpsc::channel::<ExitRecord>(pool_size.max(1) as usize);
        let spawned = self.process_manager.spawn_pool(pool_size, listen_addr, exit_tx).await?;
        if spawned.is_empty() {
            self.communicator.shutdown().await?;
            return Err(CoordinatorError::NoWorkers { requested: pool_size });
        }
        if spawned.len() < pool_size as usize {
            process_warn!(
                ProcessId::current(),
                "⚠️ Only {} of {} workers started",
                spawned.len(),
                pool_size
            );
        }
        for worker in &spawned {
            state.register_spawned(worker.worker_id, worker.pid);
        }

        // Exits of workers whose channel is still open wait for the
        // disconnect so their last messages are handled first
        let mut deferred_exits: HashMap<WorkerId, ExitRecord> = HashMap::new();

        loop {
            tokio::select! {
                Some(event) = events.recv() => {
                    if self.handle_event(&mut state, &mut deferred_exits, event).await {
                        break;
                    }
                },

                Some(record) = exit_rx.recv() => {
                    let connected = state
                        .registry()
                        .get(record.worker_id)
                        .is_some_and(|handle| handle.connected);
                    if connected {
                        deferred_exits.insert(record.worker_id, record);
                    } else if Self::apply_exit(&mut state, &record) {
                        break;
                    }
                },

                Some(_) = self.shutdown_rx.recv() => {
                    logging::log_shutdown(
                        ProcessId::current(),
                        &format!("stopping {} active workers", state.active_workers()),
                    );
                    self.process_manager.stop_all().await?;
                },
            }
        }

        self.communicator.shutdown().await?;

        let exited_normally = state.registry().count_retired(WorkerLifecycle::ExitedNormally);
        let exited_abnormally = state.registry().count_retired(WorkerLifecycle::ExitedAbnormally);
        let report = state.finalize();
        process_info!(
            ProcessId::current(),
            "🏁 Run {} finished: {} of {} tasks reported, mean accuracy {:.2}, workers {} normal / {} abnormal",
            report.run_id,
            report.results.len(),
            report.tasks_enqueued,
            report.mean_accuracy,
            exited_normally,
            exited_abnormally
        );

        if let Some(path) = &self.config.report_path {
            self.file_system.write_report(path, &report).await?;
            logging::log_success(ProcessId::current(), &format!("Report written to {}", path.display()));
        }

        Ok(report)
    }

    /// Handle one inbound event; returns true once the pool is drained
    async fn handle_event(
        &self,
        state: &mut CoordinatorState,
        deferred_exits: &mut HashMap<WorkerId, ExitRecord>,
        event: InboundEvent,
    ) -> bool {
        match event {
            InboundEvent::Connected { worker_id, pid } => {
                process_debug!(ProcessId::current(), "🤝 {} connected (PID: {})", worker_id, pid);
                if let Err(e) = state.on_connected(worker_id, pid) {
                    process_warn!(ProcessId::current(), "🚫 {}", e);
                    if matches!(e, CoordinatorError::UnknownWorker { .. }) {
                        self.drop_channel(worker_id).await;
                    }
                }
            }

            InboundEvent::Message { worker_id, message } => {
                let reported = match &message {
                    WorkerMessage::Result { task, accuracy } => Some(format!("{task} at {accuracy:.2}%")),
                    _ => None,
                };

                match state.on_message(worker_id, message) {
                    Ok(Some(reply)) => self.send_reply(worker_id, reply).await,
                    Ok(None) => {
                        if let Some(reported) = reported {
                            logging::log_progress(
                                ProcessId::current(),
                                "Result",
                                &format!(
                                    "{worker_id} trained {reported} ({} of {} assigned reported)",
                                    state.results().len(),
                                    state.assigned()
                                ),
                            );
                        }
                    }
                    Err(e) => {
                        process_warn!(ProcessId::current(), "🚫 {}", e);
                        self.drop_channel(worker_id).await;
                        // Frames already queued from this worker are rejected too
                        state.on_disconnected(worker_id);
                    }
                }
            }

            InboundEvent::Disconnected { worker_id, reason } => {
                match reason {
                    Some(reason) => process_debug!(ProcessId::current(), "🔌 {} disconnected: {}", worker_id, reason),
                    None => process_debug!(ProcessId::current(), "🔌 {} disconnected", worker_id),
                }
                state.on_disconnected(worker_id);

                if let Some(record) = deferred_exits.remove(&worker_id) {
                    return Self::apply_exit(state, &record);
                }
            }
        }

        false
    }

    async fn send_reply(&self, worker_id: WorkerId, reply: CoordinatorMessage) {
        match &reply {
            CoordinatorMessage::Assign { task } => {
                process_debug!(ProcessId::current(), "📤 Assigning {} to {}", task, worker_id)
            }
            CoordinatorMessage::Terminate => {
                process_debug!(ProcessId::current(), "📤 Terminating {}", worker_id)
            }
        }

        // A failed send means the channel is already gone; the exit path handles the rest
        if let Err(e) = self.communicator.send(worker_id, reply).await {
            process_warn!(ProcessId::current(), "⚠️ Reply to {} not delivered: {}", worker_id, e);
        }
    }

    /// Close a misbehaving worker's channel; the run continues without it
    async fn drop_channel(&self, worker_id: WorkerId) {
        if let Err(e) = self.communicator.disconnect(worker_id).await {
            process_warn!(ProcessId::current(), "⚠️ Failed to close channel to {}: {}", worker_id, e);
        }
    }

    /// Retire a reaped worker; returns true once the pool is drained
    fn apply_exit(state: &mut CoordinatorState, record: &ExitRecord) -> bool {
        let Some(outcome) = state.on_exit(record) else {
            process_debug!(ProcessId::current(), "Ignoring exit of inactive {}", record.worker_id);
            return false;
        };

        match outcome.lifecycle {
            WorkerLifecycle::ExitedNormally => {
                process_debug!(ProcessId::current(), "👋 {} exited normally", outcome.worker_id)
            }
            _ => process_warn!(
                ProcessId::current(),
                "💥 {} exited abnormally ({})",
                outcome.worker_id,
                record.kind
            ),
        }

        if let Some(task) = &outcome.lost_task {
            logging::log_loss(
                ProcessId::current(),
                &format!("Task {task}"),
                &format!("{} exited ({}) before reporting it", outcome.worker_id, record.kind),
            );
        }

        outcome.drained
    }
}
