//! Registry of live worker handles

use std::collections::BTreeMap;

use shared::{TaskId, WorkerId, WorkerLifecycle};

/// Coordinator-side view of one worker process
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerHandle {
    pub worker_id: WorkerId,
    pub pid: Option<u32>,
    pub lifecycle: WorkerLifecycle,
    /// Task assigned and not yet reported
    pub in_flight: Option<TaskId>,
    /// Whether `Terminate` has been sent
    pub terminated: bool,
    pub connected: bool,
    pub completed: u32,
}

impl WorkerHandle {
    pub fn spawned(worker_id: WorkerId, pid: Option<u32>) -> Self {
        Self {
            worker_id,
            pid,
            lifecycle: WorkerLifecycle::Spawned,
            in_flight: None,
            terminated: false,
            connected: false,
            completed: 0,
        }
    }
}

/// Active set of workers plus the handles of those that already exited
#[derive(Debug, Default)]
pub struct WorkerRegistry {
    active: BTreeMap<WorkerId, WorkerHandle>,
    retired: Vec<WorkerHandle>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handle: WorkerHandle) {
        self.active.insert(handle.worker_id, handle);
    }

    pub fn get(&self, worker_id: WorkerId) -> Option<&WorkerHandle> {
        self.active.get(&worker_id)
    }

    pub fn get_mut(&mut self, worker_id: WorkerId) -> Option<&mut WorkerHandle> {
        self.active.get_mut(&worker_id)
    }

    /// Move a worker out of the active set with its final lifecycle state
    pub fn retire(&mut self, worker_id: WorkerId, lifecycle: WorkerLifecycle) -> Option<WorkerHandle> {
        let mut handle = self.active.remove(&worker_id)?;
        handle.lifecycle = lifecycle;
        handle.connected = false;
        self.retired.push(handle.clone());
        Some(handle)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn count_retired(&self, lifecycle: WorkerLifecycle) -> usize {
        self.retired.iter().filter(|h| h.lifecycle == lifecycle).count()
    }
}
