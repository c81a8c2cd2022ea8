// Submission - caller side of a queued task

use crate::domain::TaskId;
use crate::error::QueueError;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

pub(crate) type Completion<T, E> = oneshot::Sender<Result<T, QueueError<E>>>;

/// Pending result of `Queue::submit`
///
/// Resolves with the operation's value, the operation's error wrapped in
/// `QueueError::Operation`, or one of the queue's own errors. Dropping it does
/// not cancel the task.
#[must_use = "a submission does nothing for the caller unless awaited"]
pub struct Submission<T, E> {
    id: Option<TaskId>,
    receiver: oneshot::Receiver<Result<T, QueueError<E>>>,
}

impl<T, E> Submission<T, E> {
    pub(crate) fn pending(id: TaskId) -> (Self, Completion<T, E>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                id: Some(id),
                receiver: rx,
            },
            tx,
        )
    }

    /// A submission that is already settled with `error`
    pub(crate) fn rejected(error: QueueError<E>) -> Self {
        let (tx, rx) = oneshot::channel();
        // The receiver is alive right here, so this cannot fail
        let _ = tx.send(Err(error));
        Self { id: None, receiver: rx }
    }

    /// Id assigned at admission; `None` when admission was rejected
    pub fn id(&self) -> Option<TaskId> {
        self.id
    }
}

impl<T, E> Future for Submission<T, E> {
    type Output = Result<T, QueueError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|settled| settled.unwrap_or(Err(QueueError::Abandoned)))
    }
}

impl<T, E> std::fmt::Debug for Submission<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submission").field("id", &self.id).finish()
    }
}
