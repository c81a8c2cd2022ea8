//! Throttle Definition of Done (DoD) Integration Tests
//!
//! A throttled queue with no concurrency or queue limits: at most
//! THROTTLE_RATE dispatches per THROTTLE_INTERVAL window, on real time.

use std::time::{Duration, Instant};

use futures::future::join_all;
use taskgate_core::{Queue, QueueConfig, ThrottleConfig};
use tokio::time::sleep;

const TEST_DELAY: u64 = 100;
const TEST_VALUE: u32 = 42;
const THROTTLE_ITERATIONS: u64 = 4;
const THROTTLE_RATE: u32 = 2;
const THROTTLE_INTERVAL: u64 = 500;

async fn some_operation(delay_ms: u64) -> Result<u32, String> {
    sleep(Duration::from_millis(delay_ms)).await;
    Ok(TEST_VALUE)
}

fn throttled_queue() -> Queue<u32, String> {
    Queue::new(QueueConfig {
        throttle: Some(ThrottleConfig::new(
            THROTTLE_RATE,
            Duration::from_millis(THROTTLE_INTERVAL),
        )),
        ..Default::default()
    })
}

/// DoD 1-3: Window admits `rate` tasks, holds the rest, spreads completion
#[tokio::test]
async fn test_throttled_window_metrics_and_timing() {
    let queue = throttled_queue();
    let rate = THROTTLE_RATE as usize;
    let start = Instant::now();
    let mut submissions = Vec::new();

    for _ in 0..THROTTLE_ITERATIONS {
        for _ in 0..THROTTLE_RATE {
            submissions.push(queue.submit(|| some_operation(TEST_DELAY)));

            if submissions.len() > rate {
                assert_eq!(queue.active(), rate);
                assert_eq!(queue.queued(), submissions.len() - rate);
            } else {
                assert_eq!(queue.active(), submissions.len());
            }
        }
    }
    println!("✅ DoD 1: Throttled window metrics verified");

    let results = join_all(submissions).await;
    assert!(results.iter().all(|r| matches!(r, Ok(v) if *v == TEST_VALUE)));
    println!("✅ DoD 2: All throttled operations resolved");

    assert!(
        start.elapsed() >= Duration::from_millis((THROTTLE_ITERATIONS - 1) * THROTTLE_INTERVAL),
        "Throttled batch finished too early: {:?}",
        start.elapsed()
    );
    assert_eq!(queue.stats().dispatched, THROTTLE_ITERATIONS * THROTTLE_RATE as u64);
    assert_eq!(queue.active(), 0);
    assert_eq!(queue.queued(), 0);

    println!("✅ DoD 3: Throttled completion timing verified");
}

/// DoD 4: An idle queue opens a fresh window once the old one closes
#[tokio::test]
async fn test_window_reopens_after_idle() {
    let queue = throttled_queue();

    for _ in 0..THROTTLE_RATE {
        queue.submit(|| some_operation(0)).await.unwrap();
    }
    sleep(Duration::from_millis(THROTTLE_INTERVAL + TEST_DELAY)).await;

    let start = Instant::now();
    let value = queue.submit(|| some_operation(0)).await.unwrap();
    assert_eq!(value, TEST_VALUE);
    assert!(start.elapsed() < Duration::from_millis(THROTTLE_INTERVAL));

    println!("✅ DoD 4: Throttle window reopens after idle");
}
