//! Coordinator scheduling state
//!
//! [`CoordinatorState`] is the single owner of the pending queue, the worker
//! registry and the result set. The control loop hands it one event at a
//! time and gets back the reply to send, so every transition below runs
//! without locks.

use chrono::{DateTime, Utc};
use shared::{CoordinatorMessage, ExitRecord, TaskId, TaskResult, WorkerId, WorkerLifecycle, WorkerMessage};
use uuid::Uuid;

use super::{PendingQueue, ResultSet, RunReport, WorkerHandle, WorkerRegistry};
use crate::error::{CoordinatorError, CoordinatorResult};

/// What happened when a worker process was reaped
#[derive(Debug, Clone, PartialEq)]
pub struct ExitOutcome {
    pub worker_id: WorkerId,
    pub lifecycle: WorkerLifecycle,
    /// Task the worker held when it died; never requeued
    pub lost_task: Option<TaskId>,
    /// True once no active worker remains
    pub drained: bool,
}

/// Main coordinator state containing all scheduling information
pub struct CoordinatorState {
    queue: PendingQueue,
    registry: WorkerRegistry,
    results: ResultSet,

    /// Number of `Assign` messages produced so far
    assigned: usize,

    pool_size: u32,
    run_id: Uuid,
    started_at: DateTime<Utc>,
}

impl CoordinatorState {
    pub fn new(queue: PendingQueue, pool_size: u32) -> Self {
        Self {
            queue,
            registry: WorkerRegistry::new(),
            results: ResultSet::new(),
            assigned: 0,
            pool_size,
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    /// Track a freshly spawned worker process
    pub fn register_spawned(&mut self, worker_id: WorkerId, pid: Option<u32>) {
        self.registry.register(WorkerHandle::spawned(worker_id, pid));
    }

    /// A worker identified itself on a new channel
    pub fn on_connected(&mut self, worker_id: WorkerId, pid: u32) -> CoordinatorResult<()> {
        let handle = self
            .registry
            .get_mut(worker_id)
            .ok_or(CoordinatorError::UnknownWorker { worker_id })?;

        if handle.connected {
            return Err(CoordinatorError::violation(worker_id, "second channel for the same worker"));
        }

        handle.connected = true;
        handle.pid.get_or_insert(pid);
        Ok(())
    }

    /// Handle one protocol message and return the reply, if any
    pub fn on_message(
        &mut self,
        worker_id: WorkerId,
        message: WorkerMessage,
    ) -> CoordinatorResult<Option<CoordinatorMessage>> {
        let handle = self
            .registry
            .get_mut(worker_id)
            .ok_or(CoordinatorError::UnknownWorker { worker_id })?;

        if !handle.connected {
            return Err(CoordinatorError::violation(
                worker_id,
                format!("{} without an open channel", message.kind()),
            ));
        }

        match message {
            WorkerMessage::Hello { .. } => Err(CoordinatorError::violation(worker_id, "repeated hello")),

            WorkerMessage::RequestTask => {
                if handle.terminated {
                    return Ok(Some(CoordinatorMessage::Terminate));
                }
                if let Some(task) = &handle.in_flight {
                    return Err(CoordinatorError::violation(
                        worker_id,
                        format!("requested a task while {task} is unreported"),
                    ));
                }

                match self.queue.pop_front() {
                    Some(task) => {
                        handle.in_flight = Some(task.clone());
                        handle.lifecycle = WorkerLifecycle::Busy;
                        self.assigned += 1;
                        Ok(Some(CoordinatorMessage::Assign { task }))
                    }
                    None => {
                        handle.terminated = true;
                        handle.lifecycle = WorkerLifecycle::AwaitingAssignment;
                        Ok(Some(CoordinatorMessage::Terminate))
                    }
                }
            }

            WorkerMessage::Result { task, accuracy } => {
                match &handle.in_flight {
                    Some(assigned) if *assigned == task => {}
                    Some(assigned) => {
                        return Err(CoordinatorError::violation(
                            worker_id,
                            format!("result for {task} while {assigned} is assigned"),
                        ));
                    }
                    None => {
                        return Err(CoordinatorError::violation(
                            worker_id,
                            format!("result for {task} with no task assigned"),
                        ));
                    }
                }

                if !TaskResult::is_valid_accuracy(accuracy) {
                    return Err(CoordinatorError::ResultRejected {
                        task,
                        reason: format!("accuracy {accuracy} outside [0, 100]"),
                    });
                }

                handle.in_flight = None;
                handle.lifecycle = WorkerLifecycle::AwaitingAssignment;
                handle.completed += 1;
                self.results.push(TaskResult::new(task, accuracy));
                Ok(None)
            }
        }
    }

    /// The worker's channel went away; its process may still be running
    pub fn on_disconnected(&mut self, worker_id: WorkerId) {
        if let Some(handle) = self.registry.get_mut(worker_id) {
            handle.connected = false;
        }
    }

    /// A worker process was reaped; remove it from the active set
    ///
    /// Returns `None` for workers that are not (or no longer) active.
    pub fn on_exit(&mut self, record: &ExitRecord) -> Option<ExitOutcome> {
        let terminated = self.registry.get(record.worker_id)?.terminated;
        let lifecycle = if record.is_normal() && terminated {
            WorkerLifecycle::ExitedNormally
        } else {
            WorkerLifecycle::ExitedAbnormally
        };

        let handle = self.registry.retire(record.worker_id, lifecycle)?;
        Some(ExitOutcome {
            worker_id: handle.worker_id,
            lifecycle,
            lost_task: handle.in_flight,
            drained: self.registry.is_empty(),
        })
    }

    /// No active worker remains
    pub fn is_drained(&self) -> bool {
        self.registry.is_empty()
    }

    /// Sort and reduce the results into the final report
    pub fn finalize(self) -> RunReport {
        let tasks_enqueued = self.queue.enqueued();
        let (results, mean_accuracy) = self.results.finalize();

        RunReport {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            pool_size: self.pool_size,
            tasks_enqueued,
            tasks_assigned: self.assigned,
            results,
            mean_accuracy,
        }
    }

    pub fn assigned(&self) -> usize {
        self.assigned
    }

    pub fn active_workers(&self) -> usize {
        self.registry.active_count()
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn registry(&self) -> &WorkerRegistry {
        &self.registry
    }
}
