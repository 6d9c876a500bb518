//! Shared types for the locale training pool
//!
//! Contains only truly shared types for inter-process communication between
//! the coordinator and its worker processes, plus the wire codec and the
//! logging setup every process uses.

pub mod codec;
pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

// Re-export only inter-process communication messages
pub use messages::{
    // Worker ↔ Coordinator communication
    CoordinatorMessage, WorkerMessage,

    // Process supervision types
    ExitKind, ExitRecord, WorkerLifecycle,
};
