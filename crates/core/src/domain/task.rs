// Task identity

use std::fmt;

/// Task identifier, unique among pending tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic counter that wraps to zero when it reaches `bound`
///
/// The queue keeps two of these: one allocates ids, the other is the dispatch
/// cursor. Both walk the same sequence, so the cursor visits ids in exactly
/// the order they were handed out.
#[derive(Debug, Clone)]
pub struct Sequence {
    next: u64,
    bound: u64,
}

impl Sequence {
    /// # Panics
    /// Panics if `bound` is zero.
    pub fn new(bound: u64) -> Self {
        assert!(bound > 0, "sequence bound must be positive");
        Self { next: 0, bound }
    }

    /// Return the current position and step forward
    pub fn advance(&mut self) -> TaskId {
        let current = self.next;
        self.next += 1;
        if self.next == self.bound {
            self.next = 0;
        }
        TaskId(current)
    }

    /// Position the next `advance` will return
    pub fn peek(&self) -> TaskId {
        TaskId(self.next)
    }
}
