// Port Layer - Interfaces at the edges of the queue

pub mod operation;
pub mod time_provider;

// Re-exports
pub use operation::{Operation, OperationOutput};
pub use time_provider::{MonotonicTimeProvider, TimeProvider};
