// Panic isolation for operation invocation
use super::constants::UNKNOWN_PANIC_MESSAGE;
use std::any::Any;
use std::panic::{catch_unwind, UnwindSafe};
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed successfully
    Success(T),
    /// Execution panicked
    Panicked(String),
}

/// Execute a closure with panic isolation
///
/// If the closure panics, the panic is caught and returned as
/// `PanicGuardResult::Panicked`, so a misbehaving operation cannot unwind
/// through the queue while its counters are mid-update.
///
/// # Example
/// ```text
/// let result = execute_guarded(|| panic!("test panic"));
///
/// match result {
///     PanicGuardResult::Panicked(msg) => println!("Caught panic: {}", msg),
///     PanicGuardResult::Success(_) => {}
/// }
/// ```
pub fn execute_guarded<F, T>(f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T + UnwindSafe,
{
    match catch_unwind(f) {
        Ok(result) => PanicGuardResult::Success(result),
        Err(payload) => {
            let panic_msg = panic_message(payload);
            error!(panic_msg = %panic_msg, "Operation panicked while being invoked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

/// Extract a readable message from a panic payload
///
/// Shared with the spawned-future path, where the payload arrives through
/// `JoinError::into_panic`.
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        UNKNOWN_PANIC_MESSAGE.to_string()
    }
}
