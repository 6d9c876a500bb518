//! Worker implementation with dependency injection
//!
//! A worker runs one job at a time and only asks for the next one after the
//! previous result has been sent.

use shared::{logging, process_debug, process_info, CoordinatorMessage, ProcessId, TaskId, TaskResult, WorkerId, WorkerMessage};

use crate::error::{WorkerError, WorkerResult};
use crate::traits::{IpcCommunicator, JobExecutor};

/// Where the worker is in its request/execute cycle
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerPhase {
    Start,
    /// `RequestTask` sent, waiting for the reply
    AwaitingAssignment,
    Executing(TaskId),
    Exited,
}

/// What a worker did before it was terminated
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSummary {
    pub worker_id: WorkerId,
    pub completed: Vec<TaskResult>,
}

/// Worker with dependency injection
pub struct Worker<C, E>
where
    C: IpcCommunicator,
    E: JobExecutor,
{
    worker_id: WorkerId,
    communicator: C,
    executor: E,
    phase: WorkerPhase,
}

impl<C, E> Worker<C, E>
where
    C: IpcCommunicator,
    E: JobExecutor,
{
    /// Create new worker instance
    pub fn new(worker_id: WorkerId, communicator: C, executor: E) -> Self {
        Self {
            worker_id,
            communicator,
            executor,
            phase: WorkerPhase::Start,
        }
    }

    pub fn phase(&self) -> &WorkerPhase {
        &self.phase
    }

    /// Request, execute and report until the coordinator says stop
    ///
    /// Returns once `Terminate` arrives. A closed channel or a failed job
    /// ends the loop with an error so the process exits non-zero.
    pub async fn run(&mut self) -> WorkerResult<WorkerSummary> {
        let mut completed = Vec::new();

        loop {
            self.communicator.send(WorkerMessage::RequestTask).await?;
            self.phase = WorkerPhase::AwaitingAssignment;

            let reply = self.communicator.recv().await?;
            match reply {
                Some(CoordinatorMessage::Assign { task }) => {
                    process_debug!(ProcessId::current(), "📥 Assigned {}", task);
                    self.phase = WorkerPhase::Executing(task.clone());

                    let outcome = self.executor.execute(&task).await?;
                    logging::log_progress(
                        ProcessId::current(),
                        "Trained",
                        &format!(
                            "{} accuracy {:.2}% ({})",
                            task,
                            outcome.accuracy,
                            outcome.artifact_path.display()
                        ),
                    );

                    self.communicator
                        .send(WorkerMessage::Result {
                            task: task.clone(),
                            accuracy: outcome.accuracy,
                        })
                        .await?;
                    completed.push(TaskResult::new(task, outcome.accuracy));
                }

                Some(CoordinatorMessage::Terminate) => {
                    self.phase = WorkerPhase::Exited;
                    process_info!(
                        ProcessId::current(),
                        "👋 {} terminated after {} tasks",
                        self.worker_id,
                        completed.len()
                    );
                    return Ok(WorkerSummary {
                        worker_id: self.worker_id,
                        completed,
                    });
                }

                None => {
                    self.phase = WorkerPhase::Exited;
                    return Err(WorkerError::ChannelClosed);
                }
            }
        }
    }
}
