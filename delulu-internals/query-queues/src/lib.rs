//! Delulu Query Queues
//! Copyright (c) 2026 Mamy Ratsimbazafy
//! Licensed and distributed under either of
//!   * MIT license (license terms at the root of the package or at http://opensource.org/licenses/MIT).
//!   * Apache v2 license (license terms at the root of the package or at http://www.apache.org/licenses/LICENSE-2.0).
//! at your option. This file may not be copied, modified, or distributed except according to those terms.

//! delulu-internals/query-queues
//! Transport-side work queue: caps in-flight calls, enforces a queries-per-second
//! budget and retries transient failures with exponential backoff and jitter.
//!
//! Callers decide which failures are transient through a classifier closure;
//! anything else is surfaced immediately as [`QueryQueueError::Permanent`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tokio::time;

#[derive(Debug, Error)]
pub enum QueryQueueError {
    #[error("gave up after {attempts} attempts: {source}")]
    MaxRetriesExceeded {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },
    #[error("non-retryable failure: {0}")]
    Permanent(#[source] anyhow::Error),
    #[error("queue is closed")]
    QueueClosed,
}

impl QueryQueueError {
    /// The error returned by the last attempt, if any.
    pub fn last_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::MaxRetriesExceeded { source, .. } => Some(source),
            Self::Permanent(e) => Some(e),
            Self::QueueClosed => None,
        }
    }
}

/// Backoff schedule applied between attempts.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Extra random delay, as a fraction of the current delay (0.0 disables jitter).
    pub jitter_factor: f64,
    pub exponential: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            jitter_factor: 0.5,
            exponential: true,
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Delay before retry number `retry` (1-based), before jitter.
    pub fn base_delay(&self, retry: u32) -> Duration {
        if !self.exponential || retry <= 1 {
            return self.initial_delay.min(self.max_delay);
        }
        let factor = 2u32.saturating_pow(retry - 1);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter_factor <= 0.0 {
            return delay;
        }
        let jitter_ms = (delay.as_millis() as f64 * self.jitter_factor) as u64;
        let extra = rand::thread_rng().gen_range(0..=jitter_ms);
        delay + Duration::from_millis(extra)
    }
}

/// Token bucket refilled once per interval.
#[derive(Debug)]
struct TokenBucket {
    capacity: u64,
    tokens: u64,
    last_refill: Instant,
    refill_interval: Duration,
}

impl TokenBucket {
    fn new(capacity: u64) -> Self {
        Self {
            capacity,
            tokens: capacity,
            last_refill: Instant::now(),
            refill_interval: Duration::from_secs(1),
        }
    }

    /// Takes a token, or returns how long to wait before the next refill.
    fn try_take(&mut self, now: Instant) -> Result<(), Duration> {
        let elapsed = now.saturating_duration_since(self.last_refill);
        if elapsed >= self.refill_interval {
            let refill = (elapsed.as_secs_f64() * self.capacity as f64) as u64;
            self.tokens = self.tokens.saturating_add(refill).min(self.capacity);
            self.last_refill = now;
        }
        if self.tokens > 0 {
            self.tokens -= 1;
            Ok(())
        } else {
            Err(self.refill_interval.saturating_sub(elapsed))
        }
    }
}

/// A work queue that limits concurrent calls to an external service,
/// optionally paces them to a QPS budget, and retries transient failures.
///
/// Clones share the same limits.
///
/// ```ignore
/// let queue = QueryQueue::with_qps_limit(2).retry_policy(RetryPolicy::no_retry());
/// let body = queue.run(|| async { fetch().await }, |e| is_transient(e)).await?;
/// ```
#[derive(Clone, Debug)]
pub struct QueryQueue {
    permits: Arc<Semaphore>,
    bucket: Option<Arc<Mutex<TokenBucket>>>,
    policy: RetryPolicy,
}

impl Default for QueryQueue {
    fn default() -> Self {
        Self::with_concurrency_limit(4)
    }
}

impl QueryQueue {
    /// At most `max_concurrent` calls in flight, no pacing.
    pub fn with_concurrency_limit(max_concurrent: u64) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent as usize)),
            bucket: None,
            policy: RetryPolicy::default(),
        }
    }

    /// At most `qps_limit` calls started per second (and in flight).
    pub fn with_qps_limit(qps_limit: u64) -> Self {
        let qps_limit = qps_limit.max(1);
        Self {
            permits: Arc::new(Semaphore::new(qps_limit as usize)),
            bucket: Some(Arc::new(Mutex::new(TokenBucket::new(qps_limit)))),
            policy: RetryPolicy::default(),
        }
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Stop accepting work; queued and future callers get `QueueClosed`.
    pub fn close(&self) {
        self.permits.close();
    }

    async fn acquire_token(&self) {
        let Some(bucket) = &self.bucket else {
            return;
        };
        loop {
            let wait = {
                let mut bucket = bucket.lock().await;
                match bucket.try_take(Instant::now()) {
                    Ok(()) => return,
                    Err(wait) => wait,
                }
            };
            time::sleep(wait.max(Duration::from_millis(10))).await;
        }
    }

    /// Run `f` under the queue limits, retrying while `is_retryable` says so.
    pub async fn run<T, F, Fut, R>(&self, mut f: F, is_retryable: R) -> Result<T, QueryQueueError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, anyhow::Error>> + Send,
        R: Fn(&anyhow::Error) -> bool + Send,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| QueryQueueError::QueueClosed)?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            self.acquire_token().await;

            let err = match f().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !is_retryable(&err) {
                return Err(QueryQueueError::Permanent(err));
            }
            if attempt > self.policy.max_retries {
                return Err(QueryQueueError::MaxRetriesExceeded {
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = self.policy.jittered(self.policy.base_delay(attempt));
            tracing::debug!(attempt, ?delay, "retrying after transient failure: {err:#}");
            time::sleep(delay).await;
        }
    }

    /// Run `f`, treating every failure as transient.
    pub async fn with_retry<T, F, Fut>(&self, f: F) -> Result<T, QueryQueueError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, anyhow::Error>> + Send,
    {
        self.run(f, |_| true).await
    }
}
