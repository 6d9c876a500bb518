//! Worker library for the locale training pool
//!
//! A worker connects back to its coordinator, asks for tasks one at a time,
//! trains and evaluates an intent classifier for each assigned locale, and
//! reports the test accuracy.

pub mod core;
pub mod error;
pub mod services;
pub mod traits;
pub mod worker_impl;

// Re-export main types
pub use error::{WorkerError, WorkerResult};
pub use traits::{IpcCommunicator, JobExecutor, JobOutcome};
pub use traits::{MockIpcCommunicator, MockJobExecutor};
pub use worker_impl::{Worker, WorkerPhase, WorkerSummary};
