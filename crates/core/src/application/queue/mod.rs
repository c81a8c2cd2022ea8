//! Queue engine
//!
//! Admission, dispatch and completion of operations under three independent
//! limits: concurrency, queue depth and a throttle window, plus a per-task
//! wait timeout.
//!
//! All state lives behind one mutex and every transition (submit, dispatch,
//! finish, expire) runs to completion while holding it. The lock is never held
//! across an `.await`, and operations are invoked only after it is released.
//! Follow-up dispatches (throttle retry, stale slot skip) are posted to the
//! runtime as new tasks instead of recursing.
//!
//! Every method that can arm a timer or start an operation must be called
//! from within a tokio runtime.

pub mod constants;
mod panic_guard;
mod store;
mod submission;

pub use panic_guard::{execute_guarded, panic_message, PanicGuardResult};
pub use submission::Submission;

use crate::domain::{Metrics, QueueConfig, QueueStats, Sequence, TaskId, ThrottleWindow};
use crate::error::QueueError;
use crate::port::{MonotonicTimeProvider, Operation, OperationOutput, TimeProvider};
use constants::ID_WRAP_BOUND;
use futures::future::BoxFuture;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use store::{SlotStore, TaskRecord};
use tracing::{debug, error, trace, warn};

/// Mutable scheduling state, guarded by `Shared::state`
struct QueueState<T, E> {
    store: SlotStore<T, E>,
    cursor: Sequence,
    metrics: Metrics,
    throttle: Option<ThrottleWindow>,
    stats: QueueStats,
}

struct Shared<T, E> {
    config: QueueConfig,
    time_provider: Arc<dyn TimeProvider>,
    state: Mutex<QueueState<T, E>>,
}

/// Bounded, throttled admission queue for async operations
///
/// Cloning yields another handle to the same queue.
pub struct Queue<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for Queue<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// What the scheduler decided while holding the lock
enum Decision<T, E> {
    Idle,
    Start(TaskId, Box<dyn Operation<T, E>>),
}

impl<T, E> Queue<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create a queue on the monotonic tokio clock
    pub fn new(config: QueueConfig) -> Self {
        Self::with_time_provider(config, Arc::new(MonotonicTimeProvider::new()))
    }

    /// Create a queue with an injected clock for the throttle window
    pub fn with_time_provider(config: QueueConfig, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self::with_parts(config, time_provider, ID_WRAP_BOUND)
    }

    pub(crate) fn with_parts(
        config: QueueConfig,
        time_provider: Arc<dyn TimeProvider>,
        id_bound: u64,
    ) -> Self {
        debug!(?config, "Queue::new");
        let now = time_provider.now_millis();
        let throttle = config.throttle.map(|t| ThrottleWindow::new(t, now));

        Self {
            shared: Arc::new(Shared {
                config,
                time_provider,
                state: Mutex::new(QueueState {
                    store: SlotStore::new(id_bound),
                    cursor: Sequence::new(id_bound),
                    metrics: Metrics::default(),
                    throttle,
                    stats: QueueStats::default(),
                }),
            }),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.shared.config
    }

    /// Tasks currently running
    pub fn active(&self) -> usize {
        self.lock().metrics.active
    }

    /// Tasks waiting to run
    pub fn queued(&self) -> usize {
        self.lock().metrics.queued
    }

    pub fn metrics(&self) -> Metrics {
        self.lock().metrics
    }

    pub fn stats(&self) -> QueueStats {
        self.lock().stats.clone()
    }

    /// Queue a closure that produces the task's future when dispatched
    pub fn submit<F, Fut>(&self, operation: F) -> Submission<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.submit_operation(move || OperationOutput::pending(operation()))
    }

    /// Queue an operation
    ///
    /// Fails immediately with `QueueError::QueueFull` when the waiting count
    /// has reached `max_queued`, without touching any state. Otherwise the
    /// task gets an id, a timeout timer if configured, and one dispatch
    /// attempt before this returns.
    pub fn submit_operation<O>(&self, operation: O) -> Submission<T, E>
    where
        O: Operation<T, E>,
    {
        let submission = {
            let mut state = self.lock();

            if let Some(max) = self.shared.config.max_queued {
                if state.metrics.queued >= max {
                    state.stats.rejected += 1;
                    warn!(
                        queued = state.metrics.queued,
                        max_queued = max,
                        "Queue full, rejecting submission"
                    );
                    return Submission::rejected(QueueError::QueueFull);
                }
            }

            let (submission, completion) = Submission::pending(state.store.next_id());
            let id = state.store.insert(TaskRecord::new(Box::new(operation), completion));
            state.metrics.admit();
            state.stats.submitted += 1;
            let metrics = state.metrics;
            state.stats.observe(&metrics);

            // Armed last: spawning outside a runtime panics, and the counters
            // must already agree with the store by then
            if let Some(timeout) = self.shared.config.timeout {
                let timer = self.arm_timeout(id, timeout);
                if let Some(record) = state.store.get_mut(id) {
                    record.arm_timer(timer);
                }
            }

            trace!(
                task_id = %id,
                active = metrics.active,
                queued = metrics.queued,
                "Task admitted"
            );
            submission
        };

        self.dispatch();
        submission
    }

    /// Start the next queued task if every limit allows it
    ///
    /// Safe to call at any time; with nothing queued, or with concurrency
    /// saturated, it changes nothing.
    pub fn dispatch(&self) {
        if let Decision::Start(id, operation) = self.decide() {
            self.run(id, operation);
        }
    }

    fn decide(&self) -> Decision<T, E> {
        let mut state = self.lock();

        if state.metrics.queued < 1 {
            return Decision::Idle;
        }

        if let Some(max) = self.shared.config.max_concurrent {
            if state.metrics.active >= max {
                trace!(active = state.metrics.active, "Concurrency saturated");
                return Decision::Idle;
            }
        }

        let now = self.shared.time_provider.now_millis();
        let delay = match state.throttle.as_mut() {
            Some(window) => window.compute_delay(now),
            None => Duration::ZERO,
        };
        if !delay.is_zero() {
            if state.metrics.active == 0 {
                // Nothing running will trigger dispatch again, so wake ourselves
                debug!(delay_ms = delay.as_millis() as u64, "Throttled, retrying after window");
                self.retry_after(delay);
            } else {
                trace!(delay_ms = delay.as_millis() as u64, "Throttled, waiting for completion");
            }
            return Decision::Idle;
        }

        let id = state.cursor.advance();
        let operation = match state.store.get_mut(id) {
            Some(record) => match record.take_for_dispatch() {
                Some(operation) => {
                    let waited = record.admitted_at().elapsed();
                    debug!(task_id = %id, waited_ms = waited.as_millis() as u64, "Dispatching task");
                    operation
                }
                None => {
                    error!(task_id = %id, "Cursor reached a task that already started");
                    self.retry_now();
                    return Decision::Idle;
                }
            },
            None => {
                // Vacated by a timeout; move on without recursing
                trace!(task_id = %id, "Skipping vacated slot");
                self.retry_now();
                return Decision::Idle;
            }
        };

        state.metrics.start();
        state.stats.dispatched += 1;
        let metrics = state.metrics;
        state.stats.observe(&metrics);

        Decision::Start(id, operation)
    }

    /// Invoke a dispatched operation and route its outcome into `finish`
    fn run(&self, id: TaskId, operation: Box<dyn Operation<T, E>>) {
        let output = execute_guarded(AssertUnwindSafe(move || operation.invoke()));

        match output {
            PanicGuardResult::Success(OperationOutput::Pending(future)) => {
                self.await_outcome(id, future);
            }
            PanicGuardResult::Success(OperationOutput::Unrecognized) => {
                warn!(task_id = %id, "Operation returned no pending result");
                self.finish(id, Err(QueueError::OperationInvalid));
            }
            PanicGuardResult::Panicked(msg) => {
                self.finish(id, Err(QueueError::OperationPanicked(msg)));
            }
        }
    }

    fn await_outcome(&self, id: TaskId, future: BoxFuture<'static, Result<T, E>>) {
        let queue = self.clone();
        tokio::spawn(async move {
            // Spawned separately so a panic while polling stays in that task
            let outcome = match tokio::task::spawn(future).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(QueueError::Operation(e)),
                Err(join_err) if join_err.is_panic() => {
                    let msg = panic_message(join_err.into_panic());
                    error!(task_id = %id, panic_msg = %msg, "Operation panicked while running");
                    Err(QueueError::OperationPanicked(msg))
                }
                Err(join_err) => {
                    warn!(task_id = %id, error = %join_err, "Operation cancelled");
                    Err(QueueError::Abandoned)
                }
            };
            queue.finish(id, outcome);
        });
    }

    /// Settle a task that was running and free its slot
    fn finish(&self, id: TaskId, outcome: Result<T, QueueError<E>>) {
        let record = {
            let mut state = self.lock();
            state.metrics.finish();
            match &outcome {
                Ok(_) => state.stats.succeeded += 1,
                Err(_) => state.stats.failed += 1,
            }
            let record = state.store.remove(id);
            trace!(
                task_id = %id,
                succeeded = outcome.is_ok(),
                active = state.metrics.active,
                queued = state.metrics.queued,
                "Task finished"
            );
            record
        };

        match record {
            Some(record) => record.settle(outcome),
            None => error!(task_id = %id, "Finished task has no slot"),
        }

        self.dispatch();
    }

    /// Fail a task that is still waiting when its timeout fires
    fn expire(&self, id: TaskId) {
        let record = {
            let mut state = self.lock();
            match state.store.get(id) {
                Some(record) if record.is_waiting() => {}
                // Already dispatched or settled; the timer lost the race
                _ => return,
            }
            state.metrics.expire();
            state.stats.timed_out += 1;
            warn!(
                task_id = %id,
                queued = state.metrics.queued,
                "Task timed out waiting in queue"
            );
            state.store.remove(id)
        };

        if let Some(record) = record {
            record.settle(Err(QueueError::TimedOut));
        }

        self.dispatch();
    }

    fn arm_timeout(&self, id: TaskId, timeout: Duration) -> tokio::task::JoinHandle<()> {
        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            queue.expire(id);
        })
    }

    fn retry_after(&self, delay: Duration) {
        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.dispatch();
        });
    }

    fn retry_now(&self) {
        let queue = self.clone();
        tokio::spawn(async move {
            queue.dispatch();
        });
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T, E>> {
        // No transition panics mid-update, so a poisoned state is still consistent
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T, E> std::fmt::Debug for Queue<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("config", &self.shared.config)
            .field("metrics", &self.metrics())
            .finish()
    }
}
