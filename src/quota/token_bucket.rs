// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Token-bucket rate limiter guarding generation requests
//!
//! Advisory throttling only: it keeps accidental rapid re-clicks from
//! bursting the upstream API, it is not an abuse control.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Result of a consume attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeOutcome {
    pub ok: bool,
    /// Estimated wait before the next token, set only when `ok` is false
    pub cooldown_ms: Option<u64>,
}

impl ConsumeOutcome {
    fn granted() -> Self {
        Self {
            ok: true,
            cooldown_ms: None,
        }
    }

    fn denied(cooldown: Duration) -> Self {
        Self {
            ok: false,
            cooldown_ms: Some(cooldown.as_millis() as u64),
        }
    }
}

/// Capped permit counter refilled at a fixed rate.
///
/// Invariant: `0 <= tokens <= capacity`.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: u32,
    tokens: u32,
    refill_interval: Duration,
    last_refill_at: Instant,
}

impl TokenBucket {
    /// A full bucket whose refill clock starts now
    pub fn new(capacity: u32, refill_interval: Duration) -> Self {
        Self::starting_at(capacity, refill_interval, Instant::now())
    }

    /// A full bucket whose refill clock starts at `now` (for testing)
    pub fn starting_at(capacity: u32, refill_interval: Duration, now: Instant) -> Self {
        Self {
            capacity,
            tokens: capacity,
            refill_interval,
            last_refill_at: now,
        }
    }

    pub fn tokens(&self) -> u32 {
        self.tokens
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn last_refill_at(&self) -> Instant {
        self.last_refill_at
    }

    /// Add one token per whole elapsed interval, capped at capacity.
    ///
    /// The refill clock advances by whole intervals only, so a partially
    /// elapsed interval carries over to the next refill. A full bucket
    /// pins the clock to `now` so idle time is not banked.
    pub fn refill_at(&mut self, now: Instant) -> u32 {
        if self.tokens >= self.capacity {
            self.tokens = self.capacity;
            self.last_refill_at = now;
            return 0;
        }

        let elapsed = now.saturating_duration_since(self.last_refill_at);
        let interval_ms = self.refill_interval.as_millis().max(1);
        let intervals = (elapsed.as_millis() / interval_ms) as u64;
        if intervals == 0 {
            return 0;
        }

        let missing = (self.capacity - self.tokens) as u64;
        let added = intervals.min(missing) as u32;
        self.tokens += added;

        if self.tokens == self.capacity {
            self.last_refill_at = now;
        } else {
            self.last_refill_at += self.refill_interval * added;
        }
        added
    }

    /// Refill, then take one token if available
    pub fn try_consume_at(&mut self, now: Instant) -> ConsumeOutcome {
        self.refill_at(now);
        if self.tokens > 0 {
            self.tokens -= 1;
            return ConsumeOutcome::granted();
        }
        let since_refill = now.saturating_duration_since(self.last_refill_at);
        ConsumeOutcome::denied(self.refill_interval.saturating_sub(since_refill))
    }
}

/// Shared limiter owned by the application context
pub struct GenerationRateLimiter {
    bucket: Mutex<TokenBucket>,
}

impl GenerationRateLimiter {
    pub fn new(capacity: u32, refill_interval: Duration) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(capacity, refill_interval)),
        }
    }

    pub fn from_bucket(bucket: TokenBucket) -> Self {
        Self {
            bucket: Mutex::new(bucket),
        }
    }

    pub fn try_consume(&self) -> ConsumeOutcome {
        self.try_consume_at(Instant::now())
    }

    pub fn try_consume_at(&self, now: Instant) -> ConsumeOutcome {
        let mut bucket = self.bucket.lock().unwrap_or_else(|e| e.into_inner());
        let outcome = bucket.try_consume_at(now);
        debug!(
            ok = outcome.ok,
            tokens = bucket.tokens(),
            cooldown_ms = ?outcome.cooldown_ms,
            "Rate limiter consume"
        );
        outcome
    }

    pub fn refill_at(&self, now: Instant) -> u32 {
        let mut bucket = self.bucket.lock().unwrap_or_else(|e| e.into_inner());
        bucket.refill_at(now)
    }

    pub fn tokens(&self) -> u32 {
        self.bucket.lock().unwrap_or_else(|e| e.into_inner()).tokens()
    }

    /// Periodically refill the bucket until `cancel` fires.
    ///
    /// Consumption refills lazily as well; the ticker only keeps the
    /// observable token count fresh between consumes.
    pub fn spawn_refill_ticker(
        self: Arc<Self>,
        tick: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        self.refill_at(Instant::now());
                    }
                }
            }
        })
    }
}
