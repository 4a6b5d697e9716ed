#![doc = include_str!("../README.md")]

mod permissions;
mod shutdown;
mod spawn;
mod supervisor;

pub use permissions::ensure_executable;
pub use shutdown::{ChildExit, shutdown_child};
pub use supervisor::{DEFAULT_STOP_GRACE, LocalProcessSupervisor};

// Re-export core types for convenience
pub use llamahub_core::ports::{
    LaunchSpec, ProcessError, ProcessSupervisorPort, RunHandle, StopOutcome,
};
