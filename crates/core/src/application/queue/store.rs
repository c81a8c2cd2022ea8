// Slot Store - pending task records addressed by id

use super::submission::Completion;
use crate::domain::{Sequence, TaskId};
use crate::error::QueueError;
use crate::port::Operation;
use std::collections::HashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::error;

/// One admitted task
///
/// Lives in the store from admission until it settles. While waiting it holds
/// its operation and an optional timeout timer; dispatch takes both.
pub(crate) struct TaskRecord<T, E> {
    operation: Option<Box<dyn Operation<T, E>>>,
    completion: Completion<T, E>,
    timer: Option<JoinHandle<()>>,
    admitted_at: Instant,
}

impl<T, E> TaskRecord<T, E> {
    pub(crate) fn new(operation: Box<dyn Operation<T, E>>, completion: Completion<T, E>) -> Self {
        Self {
            operation: Some(operation),
            completion,
            timer: None,
            admitted_at: Instant::now(),
        }
    }

    /// True until the task is dispatched
    pub(crate) fn is_waiting(&self) -> bool {
        self.operation.is_some()
    }

    pub(crate) fn arm_timer(&mut self, timer: JoinHandle<()>) {
        if let Some(previous) = self.timer.replace(timer) {
            previous.abort();
        }
    }

    /// Disarm the timer and hand out the operation; `None` if already taken
    pub(crate) fn take_for_dispatch(&mut self) -> Option<Box<dyn Operation<T, E>>> {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.operation.take()
    }

    pub(crate) fn admitted_at(&self) -> Instant {
        self.admitted_at
    }

    /// Deliver the outcome to the caller; a dropped `Submission` is fine
    pub(crate) fn settle(self, outcome: Result<T, QueueError<E>>) {
        if let Some(timer) = self.timer {
            timer.abort();
        }
        let _ = self.completion.send(outcome);
    }
}

/// Id-addressed task records plus the counter that hands out ids
pub(crate) struct SlotStore<T, E> {
    slots: HashMap<TaskId, TaskRecord<T, E>>,
    ids: Sequence,
}

impl<T, E> SlotStore<T, E> {
    pub(crate) fn new(id_bound: u64) -> Self {
        Self {
            slots: HashMap::new(),
            ids: Sequence::new(id_bound),
        }
    }

    /// Id the next `insert` will use
    pub(crate) fn next_id(&self) -> TaskId {
        self.ids.peek()
    }

    /// Store `record` under the next id
    pub(crate) fn insert(&mut self, record: TaskRecord<T, E>) -> TaskId {
        let id = self.ids.advance();
        if let Some(evicted) = self.slots.insert(id, record) {
            // Only possible when ID_WRAP_BOUND tasks are pending at once
            error!(task_id = %id, "Task id collided after wraparound, failing older task");
            evicted.settle(Err(QueueError::Abandoned));
        }
        id
    }

    pub(crate) fn get(&self, id: TaskId) -> Option<&TaskRecord<T, E>> {
        self.slots.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Option<&mut TaskRecord<T, E>> {
        self.slots.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: TaskId) -> Option<TaskRecord<T, E>> {
        self.slots.remove(&id)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}
