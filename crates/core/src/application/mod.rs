// Application Layer - The queue engine

pub mod queue;

// Re-exports
pub use queue::{Queue, Submission};
