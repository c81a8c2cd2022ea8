// Time Provider Port (for testability)

use tokio::time::Instant;

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Milliseconds on a monotonic clock; only differences are meaningful
    fn now_millis(&self) -> i64;
}

/// Monotonic clock anchored at construction (production)
///
/// Reads tokio's clock, so it follows `tokio::time::pause` in tests.
pub struct MonotonicTimeProvider {
    origin: Instant,
}

impl MonotonicTimeProvider {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for MonotonicTimeProvider {
    fn now_millis(&self) -> i64 {
        i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX)
    }
}
