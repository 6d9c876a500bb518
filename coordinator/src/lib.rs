//! Coordinator library for distributing locale training jobs
//!
//! This library owns the scheduling side of the training pool: it builds the
//! task queue, spawns a bounded pool of worker processes, hands out tasks as
//! workers ask for them, and collects their results into a sorted report.

pub mod config;
pub mod coordinator;
pub mod core;
pub mod error;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::{Args, RunConfig};
pub use coordinator::Coordinator;
pub use core::{CoordinatorState, PendingQueue, ResultSet, RunReport, WorkerHandle, WorkerRegistry};
pub use error::{CoordinatorError, CoordinatorResult};
pub use traits::{Communicator, FileSystem, InboundEvent, ProcessManager, SpawnedWorker};
pub use traits::{MockCommunicator, MockFileSystem, MockProcessManager};
