// Queue Metrics

/// Live queue counters
///
/// `active` counts tasks whose operation has been invoked and not yet settled;
/// `queued` counts tasks admitted but not yet dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub active: usize,
    pub queued: usize,
}

impl Metrics {
    /// A task was admitted
    pub(crate) fn admit(&mut self) {
        self.queued += 1;
    }

    /// A queued task was dispatched
    pub(crate) fn start(&mut self) {
        self.queued = self.queued.saturating_sub(1);
        self.active += 1;
    }

    /// A running task settled
    pub(crate) fn finish(&mut self) {
        self.active = self.active.saturating_sub(1);
    }

    /// A queued task left without running (timeout)
    pub(crate) fn expire(&mut self) {
        self.queued = self.queued.saturating_sub(1);
    }
}

/// Cumulative counters since the queue was created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub submitted: u64,
    pub rejected: u64,
    pub dispatched: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub peak_active: usize,
    pub peak_queued: usize,
}

impl QueueStats {
    pub(crate) fn observe(&mut self, metrics: &Metrics) {
        self.peak_active = self.peak_active.max(metrics.active);
        self.peak_queued = self.peak_queued.max(metrics.queued);
    }

    /// Tasks that reached a final outcome
    pub fn settled(&self) -> u64 {
        self.succeeded + self.failed + self.timed_out
    }
}
