// Queue Configuration

use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::warn;

/// Throttle window: at most `rate` dispatches per `interval`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub rate: u32,
    pub interval: Duration,
}

impl ThrottleConfig {
    pub fn new(rate: u32, interval: Duration) -> Self {
        Self { rate, interval }
    }
}

/// Queue configuration
///
/// Every limit is optional; `None` means unbounded. Immutable once a queue is
/// built from it.
///
/// Deserialization is lenient: each field is merged onto the defaults on its
/// own, and a field holding the wrong type is ignored rather than failing the
/// whole record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct QueueConfig {
    /// Hard cap on simultaneously running tasks
    pub max_concurrent: Option<usize>,
    /// Hard cap on tasks waiting to run
    pub max_queued: Option<usize>,
    /// Max time a task may wait in the queue before failing with `TimedOut`
    pub timeout: Option<Duration>,
    /// Dispatch rate limit
    pub throttle: Option<ThrottleConfig>,
}

impl QueueConfig {
    /// Configuration with every limit disabled
    pub fn unbounded() -> Self {
        Self::default()
    }
}

impl From<Value> for QueueConfig {
    fn from(value: Value) -> Self {
        let mut config = Self::default();

        let fields = match value {
            Value::Object(fields) => fields,
            Value::Null => return config,
            other => {
                warn!(value = %other, "Queue config is not an object, using defaults");
                return config;
            }
        };

        if let Some(limit) = field(&fields, "max_concurrent").and_then(count) {
            config.max_concurrent = limit;
        }
        if let Some(limit) = field(&fields, "max_queued").and_then(count) {
            config.max_queued = limit;
        }
        if let Some(timeout) = field(&fields, "timeout").and_then(millis) {
            // A timeout too long to represent never fires
            config.timeout = timeout.filter(|t| *t < Duration::MAX);
        }
        if let Some(throttle) = fields.get("throttle") {
            config.throttle = parse_throttle(throttle);
        }

        config
    }
}

/// Look up a numeric field, ignoring `null` and warning on any other type
fn field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a serde_json::Number> {
    match fields.get(key)? {
        Value::Number(n) => Some(n),
        Value::Null => None,
        other => {
            warn!(field = key, value = %other, "Ignoring queue config field with wrong type");
            None
        }
    }
}

/// Count limit: negative means unbounded, fractions are floored
fn count(n: &serde_json::Number) -> Option<Option<usize>> {
    if let Some(v) = n.as_u64() {
        return Some(Some(usize::try_from(v).unwrap_or(usize::MAX)));
    }
    let v = n.as_f64()?;
    if v < 0.0 {
        Some(None)
    } else {
        Some(Some(v.floor() as usize))
    }
}

/// Millisecond duration: only positive values arm anything, and values past
/// `Duration::MAX` saturate
fn millis(n: &serde_json::Number) -> Option<Option<Duration>> {
    let v = n.as_f64()?;
    if v <= 0.0 {
        return Some(None);
    }
    let duration = Duration::try_from_secs_f64(v / 1000.0).unwrap_or_else(|_| {
        warn!(millis = v, "Duration out of range, saturating");
        Duration::MAX
    });
    Some(Some(duration))
}

fn parse_throttle(value: &Value) -> Option<ThrottleConfig> {
    let fields = match value {
        Value::Object(fields) => fields,
        Value::Null => return None,
        other => {
            warn!(value = %other, "Ignoring throttle config that is not an object");
            return None;
        }
    };

    let rate = field(fields, "rate").and_then(count).flatten()?;
    let interval = field(fields, "interval").and_then(millis).flatten()?;
    if rate == 0 {
        return None;
    }

    Some(ThrottleConfig {
        rate: u32::try_from(rate).unwrap_or(u32::MAX),
        interval,
    })
}
