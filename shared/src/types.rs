//! Core shared types and identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::errors::{SharedError, SharedResult};

/// Global process ID singleton - set once at startup
static PROCESS_ID: OnceLock<ProcessId> = OnceLock::new();

/// Identity reported before `init_*` has run (unit tests, library use)
static FALLBACK_PROCESS_ID: ProcessId = ProcessId::Coordinator;

/// Process identifier for any component in the system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessId {
    /// Coordinator process (singleton)
    Coordinator,
    /// Worker process with its pool slot number
    Worker(u32),
}

impl ProcessId {
    /// Initialize the global process ID for the coordinator
    pub fn init_coordinator() -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Coordinator)
    }

    /// Initialize the global process ID for a worker with explicit ID
    pub fn init_worker(id: u32) -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Worker(id))
    }

    /// Get the global process ID, or the coordinator identity if none was set
    pub fn current() -> &'static ProcessId {
        PROCESS_ID.get().unwrap_or(&FALLBACK_PROCESS_ID)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessId::Coordinator => write!(f, "coordinator"),
            ProcessId::Worker(id) => write!(f, "worker_{id}"),
        }
    }
}

/// Pool slot number of a worker process (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub u32);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker_{}", self.0)
    }
}

/// Locale code naming one dataset/model pair, e.g. `en-US`
///
/// Task identifiers double as file-name stems for datasets and model
/// artifacts, so they may not be empty or contain path separators.
/// Ordering is lexicographic on the string form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> SharedResult<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() || trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
            return Err(SharedError::InvalidTaskId { input: id });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TaskId {
    type Error = SharedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TaskId::new(value)
    }
}

impl From<TaskId> for String {
    fn from(task: TaskId) -> Self {
        task.0
    }
}

impl std::str::FromStr for TaskId {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskId::new(s)
    }
}

/// Outcome of one successfully completed task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task: TaskId,
    /// Percentage of correctly classified test utterances, in [0, 100]
    pub accuracy: f64,
}

impl TaskResult {
    pub fn new(task: TaskId, accuracy: f64) -> Self {
        Self { task, accuracy }
    }

    /// Whether an accuracy value lies in the reportable range
    pub fn is_valid_accuracy(accuracy: f64) -> bool {
        accuracy.is_finite() && (0.0..=100.0).contains(&accuracy)
    }
}
