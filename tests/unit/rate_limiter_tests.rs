/*!
 * Tests for the per-model batch gate
 */

use std::time::Duration;

use yantwai::progress_store::RateLimitEntry;
use yantwai::rate_limiter::RateLimiter;

fn limiter() -> RateLimiter {
    RateLimiter::new(Duration::from_secs(66))
}

fn bucket(last_batch_time: f64, last_batch_size: u64) -> Option<RateLimitEntry> {
    Some(RateLimitEntry {
        last_batch_time,
        last_batch_size,
    })
}

#[test]
fn test_required_delay_withNoPriorBatch_shouldNotDelay() {
    // empty bucket means last_batch_size 0, combined load equals pending
    assert_eq!(limiter().required_delay(None, 10, 10, 1_000.0), None);
}

#[test]
fn test_required_delay_withCombinedLoadOverBudget_shouldDelayRemaining() {
    // 10 just dispatched at t=1000, 5 pending, budget 10: 15 > 10
    let delay = limiter()
        .required_delay(bucket(1_000.0, 10), 5, 10, 1_030.0)
        .expect("should throttle");
    assert!((delay.as_secs_f64() - 36.0).abs() < 0.001);
}

#[test]
fn test_required_delay_withLoadWithinBudget_shouldProceedImmediately() {
    // 3 + 5 = 8 <= 10, no wait even though the interval has not elapsed
    assert_eq!(limiter().required_delay(bucket(1_000.0, 3), 5, 10, 1_001.0), None);
}

#[test]
fn test_required_delay_withIntervalElapsed_shouldProceed() {
    // combined load exceeds budget but 66s have passed
    assert_eq!(limiter().required_delay(bucket(1_000.0, 10), 10, 10, 1_066.0), None);
}

#[test]
fn test_required_delay_atExactBudgetBoundary_shouldProceed() {
    // combined load equal to the budget does not throttle
    assert_eq!(limiter().required_delay(bucket(1_000.0, 5), 5, 10, 1_001.0), None);
}

#[test]
fn test_required_delay_withNoPendingWork_shouldNotDelay() {
    assert_eq!(limiter().required_delay(bucket(1_000.0, 10), 0, 10, 1_001.0), None);
}

#[test]
fn test_required_delay_withZeroBatchSize_shouldNotDelay() {
    assert_eq!(limiter().required_delay(bucket(1_000.0, 10), 5, 0, 1_001.0), None);
}

#[test]
fn test_required_delay_shrinksAsTimePasses() {
    let lim = limiter();
    let early = lim.required_delay(bucket(1_000.0, 10), 10, 10, 1_010.0).unwrap();
    let late = lim.required_delay(bucket(1_000.0, 10), 10, 10, 1_050.0).unwrap();
    assert!(early > late);
    assert!((early.as_secs_f64() - 56.0).abs() < 0.001);
    assert!((late.as_secs_f64() - 16.0).abs() < 0.001);
}
