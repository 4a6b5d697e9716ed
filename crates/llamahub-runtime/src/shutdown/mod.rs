//! Graceful process shutdown.

mod child;

pub use child::{ChildExit, shutdown_child};
