// Central Error Type for the Queue

use thiserror::Error;

/// Outcome error of a submitted task
///
/// Every variant except `Operation` is produced by the queue itself.
/// `Operation` carries the operation's own error unchanged.
#[derive(Error, Debug)]
pub enum QueueError<E> {
    #[error("Queue full: admission rejected")]
    QueueFull,

    #[error("Timed out waiting in queue")]
    TimedOut,

    #[error("Operation did not return a pending result")]
    OperationInvalid,

    #[error("Operation panicked: {0}")]
    OperationPanicked(String),

    #[error("Task abandoned before it settled")]
    Abandoned,

    #[error("Operation failed: {0}")]
    Operation(E),
}

impl<E> QueueError<E> {
    /// True for errors raised by the queue rather than the operation
    pub fn is_engine_error(&self) -> bool {
        !matches!(self, QueueError::Operation(_))
    }

    /// Unwrap the operation's own error, if that is what this is
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            QueueError::Operation(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type of a settled submission
pub type Result<T, E> = std::result::Result<T, QueueError<E>>;
