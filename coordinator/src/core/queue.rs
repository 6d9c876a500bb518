//! FIFO of tasks still waiting for a worker

use std::collections::{HashSet, VecDeque};

use shared::TaskId;

/// Ordered, finite task queue
///
/// Populated once at construction and only ever drained; there is no way to
/// push a task back in.
#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    tasks: VecDeque<TaskId>,
    enqueued: usize,
}

impl PendingQueue {
    /// Build the queue, keeping the first occurrence of any repeated task
    pub fn from_tasks<I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = TaskId>,
    {
        let mut seen = HashSet::new();
        let tasks: VecDeque<TaskId> = tasks.into_iter().filter(|task| seen.insert(task.clone())).collect();
        let enqueued = tasks.len();
        Self { tasks, enqueued }
    }

    /// Remove and return the earliest-enqueued task
    pub fn pop_front(&mut self) -> Option<TaskId> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of tasks the queue was built with
    pub fn enqueued(&self) -> usize {
        self.enqueued
    }
}
