// Operation Port
// The contract between the queue and the work it schedules

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;

/// What an operation hands back when the queue invokes it
pub enum OperationOutput<T, E> {
    /// A pending result the queue can await
    Pending(BoxFuture<'static, Result<T, E>>),
    /// Nothing awaitable; the task fails with `QueueError::OperationInvalid`
    Unrecognized,
}

impl<T, E> OperationOutput<T, E> {
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        OperationOutput::Pending(future.boxed())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, OperationOutput::Pending(_))
    }
}

impl<T, E> std::fmt::Debug for OperationOutput<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationOutput::Pending(_) => write!(f, "Pending"),
            OperationOutput::Unrecognized => write!(f, "Unrecognized"),
        }
    }
}

/// A unit of deferred work, invoked at most once when dispatched
///
/// Implemented for every `FnOnce() -> OperationOutput<T, E>` closure.
/// `Queue::submit` covers the common case of a closure returning a future.
pub trait Operation<T, E>: Send + 'static {
    fn invoke(self: Box<Self>) -> OperationOutput<T, E>;
}

impl<T, E, F> Operation<T, E> for F
where
    F: FnOnce() -> OperationOutput<T, E> + Send + 'static,
{
    fn invoke(self: Box<Self>) -> OperationOutput<T, E> {
        (*self)()
    }
}
