// Taskgate Core - Admission & Scheduling Engine
// NO runtime wiring or config sources here; the composition root owns those

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{Queue, Submission};
pub use domain::{Metrics, QueueConfig, QueueStats, TaskId, ThrottleConfig};
pub use error::{QueueError, Result};
pub use port::{Operation, OperationOutput};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
