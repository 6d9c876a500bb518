//! Message types for the training pool
//!
//! This module organizes all inter-process communication messages by category:
//! - `worker`: Coordinator ↔ Worker protocol messages
//! - `process`: Worker process lifecycle and supervision records

pub mod process;
pub mod worker;

// Re-export commonly used types at module level for convenience
pub use worker::{CoordinatorMessage, WorkerMessage};

pub use process::{ExitKind, ExitRecord, WorkerLifecycle};
