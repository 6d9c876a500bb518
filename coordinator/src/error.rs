//! Coordinator-specific error types

use shared::{SharedError, TaskId, WorkerId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Failed to spawn worker process: {worker_id}: {message}")]
    WorkerSpawnFailed { worker_id: WorkerId, message: String },

    #[error("No worker process could be started (requested {requested})")]
    NoWorkers { requested: u32 },

    #[error("Protocol violation from {worker_id}: {message}")]
    ProtocolViolation { worker_id: WorkerId, message: String },

    #[error("Unknown worker: {worker_id}")]
    UnknownWorker { worker_id: WorkerId },

    #[error("Worker not connected: {worker_id}")]
    WorkerNotConnected { worker_id: WorkerId },

    #[error("Result for {task} rejected: {reason}")]
    ResultRejected { task: TaskId, reason: String },

    #[error("File system operation failed: {operation} on {path}")]
    FileSystemError { operation: String, path: String },

    #[error("Configuration error: {field}: {message}")]
    ConfigurationError { field: String, message: String },

    #[error("Network communication error: {message}")]
    NetworkError { message: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoordinatorError {
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::NetworkError { message: message.into() }
    }

    pub fn violation(worker_id: WorkerId, message: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            worker_id,
            message: message.into(),
        }
    }

    /// Errors that only concern one worker's channel and must not end the run
    pub fn is_channel_local(&self) -> bool {
        matches!(
            self,
            Self::ProtocolViolation { .. }
                | Self::UnknownWorker { .. }
                | Self::WorkerNotConnected { .. }
                | Self::ResultRejected { .. }
        )
    }
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
