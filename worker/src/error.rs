//! Worker error types

use std::path::PathBuf;

use shared::{SharedError, TaskId};
use thiserror::Error;

/// Result type for worker operations
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Worker error types
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Coordinator closed the channel")]
    ChannelClosed,

    #[error("Protocol violation: {message}")]
    ProtocolViolation { message: String },

    #[error("Training {task} failed: {message}")]
    Execution { task: TaskId, message: String },

    #[error("Dataset not found: {}", path.display())]
    DatasetMissing { path: PathBuf },

    #[error("Invalid dataset {} line {line}: {message}", path.display())]
    InvalidDataset { path: PathBuf, line: usize, message: String },

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

impl WorkerError {
    pub fn execution(task: &TaskId, message: impl Into<String>) -> Self {
        Self::Execution {
            task: task.clone(),
            message: message.into(),
        }
    }
}
