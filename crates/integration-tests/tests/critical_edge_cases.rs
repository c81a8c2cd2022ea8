//! Critical Edge Cases
//!
//! Behaviour at the boundaries: misbehaving operations, independent
//! instances, counters under load and config read from JSON.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::json;
use taskgate_core::{OperationOutput, Queue, QueueConfig, QueueError};
use tokio::time::sleep;

fn single_lane() -> QueueConfig {
    QueueConfig {
        max_concurrent: Some(1),
        ..Default::default()
    }
}

/// Edge Case 1: Two queues never share limits or counters
#[tokio::test]
async fn test_instances_are_independent() {
    let first: Queue<u32, String> = Queue::new(single_lane());
    let second: Queue<u32, String> = Queue::new(single_lane());

    let _busy = first.submit(|| async {
        sleep(Duration::from_millis(200)).await;
        Ok(1)
    });
    assert_eq!(first.active(), 1);
    assert_eq!(second.active(), 0);

    let value = second.submit(|| async { Ok(2) }).await.unwrap();
    assert_eq!(value, 2);
    assert_eq!(first.stats().submitted, 1);
    assert_eq!(second.stats().submitted, 1);

    println!("✅ Edge Case 1: Queue instances are independent");
}

/// Edge Case 2: An operation with nothing to await fails alone
#[tokio::test]
async fn test_invalid_operation_keeps_queue_moving() {
    let queue: Queue<u32, String> = Queue::new(single_lane());

    let invalid = queue.submit_operation(|| OperationOutput::<u32, String>::Unrecognized);
    let next = queue.submit(|| async { Ok(7) });

    assert!(matches!(invalid.await, Err(QueueError::OperationInvalid)));
    assert_eq!(next.await.unwrap(), 7);
    assert_eq!(queue.active(), 0);
    assert_eq!(queue.queued(), 0);

    println!("✅ Edge Case 2: Invalid operation rejected, queue keeps moving");
}

/// Edge Case 3: Panics are contained in the task that raised them
#[tokio::test]
async fn test_panicking_operations_are_isolated() {
    let queue: Queue<u32, String> = Queue::new(single_lane());

    let on_invoke = queue.submit_operation(|| -> OperationOutput<u32, String> {
        panic!("panic on invoke")
    });
    let on_poll = queue.submit(|| async {
        sleep(Duration::from_millis(10)).await;
        if queue_is_doomed() {
            panic!("panic while polling");
        }
        Ok(0)
    });
    let healthy = queue.submit(|| async { Ok(3) });

    assert!(matches!(on_invoke.await, Err(QueueError::OperationPanicked(msg)) if msg == "panic on invoke"));
    assert!(matches!(on_poll.await, Err(QueueError::OperationPanicked(msg)) if msg == "panic while polling"));
    assert_eq!(healthy.await.unwrap(), 3);
    assert_eq!(queue.stats().failed, 2);
    assert_eq!(queue.active(), 0);

    println!("✅ Edge Case 3: Operation panics isolated");
}

fn queue_is_doomed() -> bool {
    true
}

/// Edge Case 4: active and queued stay within limits under load
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_limits_hold_under_load() {
    const MAX_CONCURRENT: usize = 4;
    const MAX_QUEUED: usize = 16;

    let queue: Queue<usize, String> = Queue::new(QueueConfig {
        max_concurrent: Some(MAX_CONCURRENT),
        max_queued: Some(MAX_QUEUED),
        ..Default::default()
    });
    let peak_running = Arc::new(AtomicUsize::new(0));

    let submissions: Vec<_> = (0..100usize)
        .map(|i| {
            let observer = queue.clone();
            let peak_running = Arc::clone(&peak_running);
            queue.submit(move || async move {
                peak_running.fetch_max(observer.active(), Ordering::SeqCst);
                sleep(Duration::from_millis(5)).await;
                Ok(i)
            })
        })
        .collect();

    let results = join_all(submissions).await;
    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(QueueError::QueueFull)))
        .count();

    assert_eq!(accepted + rejected, 100);
    assert!(peak_running.load(Ordering::SeqCst) <= MAX_CONCURRENT);

    let stats = queue.stats();
    assert!(stats.peak_active <= MAX_CONCURRENT);
    assert!(stats.peak_queued <= MAX_QUEUED);
    assert_eq!(stats.rejected as usize, rejected);
    assert_eq!(stats.succeeded as usize, accepted);
    assert_eq!(queue.active(), 0);
    assert_eq!(queue.queued(), 0);

    println!(
        "✅ Edge Case 4: Limits held under load ({} accepted, {} rejected)",
        accepted, rejected
    );
}

/// Edge Case 5: Dropping a submission does not cancel its task
#[tokio::test]
async fn test_dropped_submission_still_runs() {
    let queue: Queue<u32, String> = Queue::new(single_lane());
    let ran = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&ran);
    drop(queue.submit(move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }));

    let value = queue.submit(|| async { Ok(5) }).await.unwrap();
    assert_eq!(value, 5);
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert_eq!(queue.stats().succeeded, 2);

    println!("✅ Edge Case 5: Dropped submission still runs");
}

/// Edge Case 6: Config read from JSON merges leniently onto defaults
#[tokio::test]
async fn test_config_from_json() {
    let config: QueueConfig = serde_json::from_value(json!({
        "max_concurrent": 2.7,
        "max_queued": "lots",
        "timeout": -5,
        "throttle": { "rate": 3, "interval": 250 }
    }))
    .unwrap();

    assert_eq!(config.max_concurrent, Some(2));
    assert_eq!(config.max_queued, None);
    assert_eq!(config.timeout, None);
    let throttle = config.throttle.unwrap();
    assert_eq!(throttle.rate, 3);
    assert_eq!(throttle.interval, Duration::from_millis(250));

    let queue: Queue<u32, String> = Queue::new(config.clone());
    assert_eq!(queue.config(), &config);

    println!("✅ Edge Case 6: Config from JSON merged leniently");
}

/// Edge Case 7: Zero concurrency admits tasks but never runs them
#[tokio::test]
async fn test_zero_concurrency_never_dispatches() {
    let queue: Queue<u32, String> = Queue::new(QueueConfig {
        max_concurrent: Some(0),
        timeout: Some(Duration::from_millis(50)),
        ..Default::default()
    });

    let result = queue.submit(|| async { Ok(1) }).await;
    assert!(matches!(result, Err(QueueError::TimedOut)));
    assert_eq!(queue.stats().dispatched, 0);

    println!("✅ Edge Case 7: Zero concurrency never dispatches");
}
