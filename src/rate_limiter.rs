/*!
 * Per-model batch rate limiting.
 *
 * Throttling only triggers when the new load would combine with the prior
 * batch to exceed the tier's batch budget; a batch that fits within the
 * budget proceeds immediately regardless of elapsed time.
 */

use log::info;
use std::time::Duration;

use crate::progress_store::{ProgressStore, RateLimitEntry};

/// Gate enforcing a minimum interval between over-budget batches
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    interval: Duration,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Delay required before dispatching `pending_count` more tasks against
    /// a bucket, given the tier's batch budget. Pure so tests can pin the
    /// clock; `now_unix_secs` is the current wall-clock time.
    pub fn required_delay(
        &self,
        bucket: Option<RateLimitEntry>,
        pending_count: usize,
        batch_size: usize,
        now_unix_secs: f64,
    ) -> Option<Duration> {
        if pending_count == 0 || batch_size == 0 {
            return None;
        }
        let bucket = bucket.unwrap_or_default();

        let elapsed = now_unix_secs - bucket.last_batch_time;
        let remaining = self.interval.as_secs_f64() - elapsed;
        let combined_load = bucket.last_batch_size as usize + pending_count;

        if remaining > 0.0 && combined_load > batch_size {
            Some(Duration::from_secs_f64(remaining))
        } else {
            None
        }
    }

    /// Sleep until the model's bucket permits another batch
    pub async fn enforce(
        &self,
        store: &ProgressStore,
        model_id: &str,
        pending_count: usize,
        batch_size: usize,
    ) {
        let now = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
        if let Some(delay) =
            self.required_delay(store.rate_limit_entry(model_id), pending_count, batch_size, now)
        {
            info!(
                "Rate limiting for model {} - sleeping {:.2} seconds",
                model_id,
                delay.as_secs_f64()
            );
            tokio::time::sleep(delay).await;
        }
    }
}
