//! Progress observation and rate limiting.

mod observer;
mod throttle;

pub use observer::{ObserverConfig, observe_progress};
pub use throttle::ProgressThrottle;
