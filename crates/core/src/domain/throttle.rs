//! Throttle window
//!
//! Fixed window that resets lazily: the first dispatch attempt at or after
//! `close_at` opens a fresh window of `interval` length and counts itself as
//! its first hit.

use super::config::ThrottleConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ThrottleWindow {
    rate: u32,
    interval_ms: i64,
    hits: u32,
    close_at: i64,
}

impl ThrottleWindow {
    /// Create a window that is already expired at `now_ms`
    pub fn new(config: ThrottleConfig, now_ms: i64) -> Self {
        Self {
            rate: config.rate,
            interval_ms: i64::try_from(config.interval.as_millis()).unwrap_or(i64::MAX),
            hits: 0,
            close_at: now_ms,
        }
    }

    /// Decide whether a dispatch may happen at `now_ms`
    ///
    /// Returns zero when allowed, and records the hit. Returns the time left in
    /// the current window when it is saturated, without touching any state.
    /// Call once per dispatch decision.
    pub fn compute_delay(&mut self, now_ms: i64) -> Duration {
        if self.hits >= self.rate && now_ms < self.close_at {
            let remaining = (self.close_at - now_ms).max(0);
            return Duration::from_millis(remaining as u64);
        }

        if now_ms >= self.close_at {
            self.hits = 1;
            self.close_at = now_ms.saturating_add(self.interval_ms);
        } else {
            self.hits += 1;
        }

        Duration::ZERO
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn close_at(&self) -> i64 {
        self.close_at
    }
}
