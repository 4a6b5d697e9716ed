//! Core services.
//!
//! Services sit on top of the ports and hold the domain rules. Adapters
//! receive a `LifecycleManager` from their composition root and never touch
//! engines or supervisors directly.

mod lifecycle;

pub use lifecycle::{DownloadRequestOutcome, LifecycleManager, RunRequestOutcome, StopRunOutcome};
