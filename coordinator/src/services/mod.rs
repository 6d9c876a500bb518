//! Service implementations
//!
//! Real implementations of the coordinator's service traits. These handle
//! the actual sockets, child processes and files.

pub mod communicator;
pub mod file_system;
pub mod process_manager;

// Re-export all service implementations
pub use communicator::RealCommunicator;
pub use file_system::RealFileSystem;
pub use process_manager::RealProcessManager;
