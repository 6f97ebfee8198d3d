//! Pacing policies applied between items of a bulk operation.
//!
//! A limiter is awaited *between* units of work, never before the first one,
//! so a single-item batch never waits.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Suspend until the next unit of work may start.
    async fn pace(&self);
}

/// No pacing at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl RateLimiter for NoDelay {
    async fn pace(&self) {}
}

/// Sleep for a fixed interval between items.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl FixedDelay {
    pub fn from_millis(ms: u64) -> Self {
        FixedDelay(Duration::from_millis(ms))
    }
}

#[async_trait]
impl RateLimiter for FixedDelay {
    async fn pace(&self) {
        if !self.0.is_zero() {
            sleep(self.0).await;
        }
    }
}

/// Allows bursts of up to `capacity` items, then one item per `refill_every`.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u32,
    refill_every: Duration,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

impl TokenBucket {
    /// Start with a full bucket. A zero capacity is treated as one.
    pub fn new(capacity: u32, refill_every: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            refill_every,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        if self.refill_every.is_zero() {
            state.tokens = self.capacity;
            state.last_refill = now;
            return;
        }
        let elapsed = now.saturating_duration_since(state.last_refill);
        let earned = elapsed.as_nanos() / self.refill_every.as_nanos();
        if earned == 0 {
            return;
        }
        let missing = self.capacity - state.tokens;
        if earned >= u128::from(missing) {
            state.tokens = self.capacity;
            state.last_refill = now;
        } else {
            // earned < missing <= capacity, so it fits in u32.
            let earned = earned as u32;
            state.tokens += earned;
            state.last_refill += self.refill_every * earned;
        }
    }
}

#[async_trait]
impl RateLimiter for TokenBucket {
    async fn pace(&self) {
        let mut state = self.state.lock().await;
        self.refill(&mut state, Instant::now());
        if state.tokens > 0 {
            state.tokens -= 1;
            return;
        }
        let ready_at = state.last_refill + self.refill_every;
        sleep(ready_at.saturating_duration_since(Instant::now())).await;
        // The token earned while sleeping is spent immediately.
        state.last_refill = ready_at;
    }
}
