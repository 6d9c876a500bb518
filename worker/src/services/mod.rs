//! Service implementations for the worker

pub mod executor;
pub mod ipc_communicator;

pub use executor::{load_artifact, BaselineExecutor, ModelArtifact, DEFAULT_FALLBACK_INTENT};
pub use ipc_communicator::RealIpcCommunicator;
