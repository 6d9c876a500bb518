//! Worker process supervision types
//!
//! The coordinator observes each worker process twice: through its message
//! channel and through the OS exit status. [`ExitRecord`] is what the
//! process supervisor reports when a child is reaped.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::WorkerId;

/// Lifecycle of a worker as tracked by the coordinator
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerLifecycle {
    /// Process started, no request received yet
    Spawned,
    /// Worker has no task and is expected to request one
    AwaitingAssignment,
    /// Worker holds exactly one assigned task
    Busy,
    /// Process exited after receiving `Terminate`
    ExitedNormally,
    /// Process exited without being told to
    ExitedAbnormally,
}

/// How a worker process ended, as seen by the OS
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ExitKind {
    /// Exit status 0
    Normal,
    /// Non-zero exit code, killed by a signal, or status unavailable
    Abnormal { code: Option<i32>, signal: Option<i32> },
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitKind::Normal => write!(f, "exit code 0"),
            ExitKind::Abnormal { code: Some(code), .. } => write!(f, "exit code {code}"),
            ExitKind::Abnormal { signal: Some(signal), .. } => write!(f, "signal {signal}"),
            ExitKind::Abnormal { .. } => write!(f, "unknown exit status"),
        }
    }
}

/// Supervision record emitted once per reaped worker process
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ExitRecord {
    pub worker_id: WorkerId,
    pub kind: ExitKind,
}

impl ExitRecord {
    pub fn normal(worker_id: WorkerId) -> Self {
        Self { worker_id, kind: ExitKind::Normal }
    }

    pub fn abnormal(worker_id: WorkerId, code: Option<i32>, signal: Option<i32>) -> Self {
        Self { worker_id, kind: ExitKind::Abnormal { code, signal } }
    }

    /// Build a record from an OS exit status
    pub fn from_status(worker_id: WorkerId, status: std::process::ExitStatus) -> Self {
        if status.success() {
            return Self::normal(worker_id);
        }

        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self::abnormal(worker_id, status.code(), signal)
    }

    pub fn is_normal(&self) -> bool {
        self.kind == ExitKind::Normal
    }
}
