//! Coordinator ↔ Worker communication messages
//!
//! Each direction has its own closed set of variants. Both sides match them
//! exhaustively, so adding a variant is a protocol change and must come with
//! a bump of [`crate::codec::PROTOCOL_VERSION`].

use serde::{Deserialize, Serialize};

use crate::types::{TaskId, WorkerId};

/// Messages sent from Worker to Coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkerMessage {
    /// First frame on a new connection, binds the channel to a pool slot
    Hello { worker_id: WorkerId, pid: u32 },

    /// Worker is ready for new work
    RequestTask,

    /// Assigned task finished successfully
    Result { task: TaskId, accuracy: f64 },
}

/// Messages sent from Coordinator to Worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CoordinatorMessage {
    /// Perform this task next
    Assign { task: TaskId },

    /// No more work; exit
    Terminate,
}

impl WorkerMessage {
    /// Short name used in logs and protocol errors
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerMessage::Hello { .. } => "hello",
            WorkerMessage::RequestTask => "request-task",
            WorkerMessage::Result { .. } => "result",
        }
    }
}

impl CoordinatorMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            CoordinatorMessage::Assign { .. } => "assign",
            CoordinatorMessage::Terminate => "terminate",
        }
    }
}
