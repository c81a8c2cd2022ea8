// Domain Layer - Queue state and its invariants

pub mod config;
pub mod metrics;
pub mod task;
pub mod throttle;

// Re-exports
pub use config::{QueueConfig, ThrottleConfig};
pub use metrics::{Metrics, QueueStats};
pub use task::{Sequence, TaskId};
pub use throttle::ThrottleWindow;
