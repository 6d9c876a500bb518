//! Worker trait definitions for dependency injection

use std::path::PathBuf;

use async_trait::async_trait;
use shared::{CoordinatorMessage, TaskId, WorkerMessage};

use crate::error::WorkerResult;

/// What a finished training job produced
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    /// Percentage of test utterances classified correctly
    pub accuracy: f64,
    pub artifact_path: PathBuf,
}

/// The worker's end of its channel to the coordinator
#[mockall::automock]
#[async_trait]
pub trait IpcCommunicator: Send {
    /// Send one message to the coordinator
    async fn send(&mut self, message: WorkerMessage) -> WorkerResult<()>;

    /// Wait for the next coordinator message; `None` once the channel is closed
    async fn recv(&mut self) -> WorkerResult<Option<CoordinatorMessage>>;
}

/// Trains and evaluates the model for one task
#[mockall::automock]
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// Run the whole job for `task`, writing its model artifact
    async fn execute(&self, task: &TaskId) -> WorkerResult<JobOutcome>;
}
