//! Trait definitions with mockall annotations for testing
//!
//! The coordinator talks to the outside world through three seams: the
//! worker message channels, the worker processes themselves, and the file
//! system. Each is a trait so the scheduling logic can be driven end to end
//! without real sockets or child processes.

use std::net::SocketAddr;
use std::path::Path;

use shared::{CoordinatorMessage, ExitRecord, TaskId, WorkerId, WorkerMessage};
use tokio::sync::mpsc;

use crate::core::RunReport;
use crate::error::CoordinatorResult;

/// Event delivered by the communicator to the coordinator's control loop
///
/// Events for one worker arrive in the order that worker sent them.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// A worker opened its channel and identified itself
    Connected { worker_id: WorkerId, pid: u32 },

    /// A protocol message from an identified worker
    Message { worker_id: WorkerId, message: WorkerMessage },

    /// The worker's channel closed, cleanly (`reason == None`) or not
    Disconnected { worker_id: WorkerId, reason: Option<String> },
}

/// A worker process started by the process manager
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedWorker {
    pub worker_id: WorkerId,
    pub pid: Option<u32>,
}

/// Per-worker message channels
#[mockall::automock]
#[async_trait::async_trait]
pub trait Communicator: Send + Sync {
    /// Bind the worker listener
    ///
    /// # Returns
    /// The bound address (workers are told to connect there) and the stream
    /// of inbound events from every worker channel
    async fn start_listener(
        &self,
        bind_addr: SocketAddr,
    ) -> CoordinatorResult<(SocketAddr, mpsc::Receiver<InboundEvent>)>;

    /// Queue a message on one worker's channel
    async fn send(&self, worker_id: WorkerId, message: CoordinatorMessage) -> CoordinatorResult<()>;

    /// Close one worker's channel (used after a protocol violation)
    async fn disconnect(&self, worker_id: WorkerId) -> CoordinatorResult<()>;

    /// Stop accepting connections and close every channel
    async fn shutdown(&self) -> CoordinatorResult<()>;
}

/// Worker process lifecycle management
#[mockall::automock]
#[async_trait::async_trait]
pub trait ProcessManager: Send + Sync {
    /// Spawn `count` worker processes pointed at `coordinator_addr`
    ///
    /// One [`ExitRecord`] is sent on `exits` for every spawned worker once
    /// its process has been reaped. Workers that fail to start are skipped
    /// and get no record.
    async fn spawn_pool(
        &self,
        count: u32,
        coordinator_addr: SocketAddr,
        exits: mpsc::Sender<ExitRecord>,
    ) -> CoordinatorResult<Vec<SpawnedWorker>>;

    /// Ask every still-running worker to stop (interrupted runs only)
    async fn stop_all(&self) -> CoordinatorResult<()>;
}

/// File system access for dataset discovery and report output
#[mockall::automock]
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    /// List task identifiers for every dataset under the dataset root, sorted
    async fn discover_tasks(&self) -> CoordinatorResult<Vec<TaskId>>;

    /// Persist the finalized run report as JSON
    async fn write_report(&self, path: &Path, report: &RunReport) -> CoordinatorResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that mock traits can be instantiated
    #[tokio::test]
    async fn test_mock_trait_instantiation() {
        let _mock_communicator = MockCommunicator::new();
        let _mock_process_manager = MockProcessManager::new();
        let _mock_file_system = MockFileSystem::new();
    }
}
