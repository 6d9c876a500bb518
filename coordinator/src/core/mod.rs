//! Core scheduling state
//!
//! Everything in here is synchronous and owned by a single control task:
//! the pending queue, the worker registry, and the result set. The async
//! shell in [`crate::coordinator`] feeds events in and ships replies out.

pub mod queue;
pub mod registry;
pub mod results;
pub mod state;

pub use queue::PendingQueue;
pub use registry::{WorkerHandle, WorkerRegistry};
pub use results::{mean_accuracy, ResultSet, RunReport};
pub use state::{CoordinatorState, ExitOutcome};
