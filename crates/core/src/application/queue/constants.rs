// Queue constants (no magic values)

/// Id counter and dispatch cursor wrap to zero when they reach this value
///
/// Ids only collide if this many tasks are pending at once.
pub const ID_WRAP_BOUND: u64 = u64::MAX;

/// Message recorded when a panic payload is neither `&str` nor `String`
pub const UNKNOWN_PANIC_MESSAGE: &str = "Unknown panic";
