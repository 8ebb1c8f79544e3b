//! Sliding-window-log admission control.
//!
//! Exact timestamps of admitted actions are kept for one window. A check
//! prunes everything at or before `now - window`, denies when the remaining
//! count has reached the limit, and otherwise records `now`.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::core::models::{RateLimitConfig, RateLimitDecision};

/// Limiter for one logical action.
///
/// The log sits behind a mutex so that a check and the record that follows
/// it happen atomically across threads.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    pub fn check_and_record(&self) -> RateLimitDecision {
        self.check_and_record_at(Instant::now())
    }

    /// Same as [`check_and_record`](Self::check_and_record) with an explicit
    /// clock reading. Readings are expected to be non-decreasing.
    pub fn check_and_record_at(&self, now: Instant) -> RateLimitDecision {
        let window = self.config.window();
        let mut log = self.log();

        if let Some(window_start) = now.checked_sub(window) {
            while log.front().is_some_and(|&t| t <= window_start) {
                log.pop_front();
            }
        }

        if log.len() >= self.config.max_requests() as usize {
            let retry_after_seconds = log.front().map_or(0, |&oldest| {
                ceil_seconds((oldest + window).saturating_duration_since(now))
            });
            debug!(
                "Rate limit reached ({} in window), retry after {}s",
                log.len(),
                retry_after_seconds
            );
            return RateLimitDecision::Denied {
                retry_after_seconds,
            };
        }

        // keep the log ascending even if a caller's clock reading lags
        let recorded = log.back().map_or(now, |&last| last.max(now));
        log.push_back(recorded);
        RateLimitDecision::Allowed
    }

    /// Clears all history. Meant for session boundaries such as sign-out.
    pub fn reset(&self) {
        self.log().clear();
    }

    /// Number of timestamps currently held.
    #[must_use]
    pub fn recorded(&self) -> usize {
        self.log().len()
    }

    fn log(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.timestamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn ceil_seconds(d: Duration) -> u64 {
    let secs = d.as_nanos().div_ceil(1_000_000_000);
    u64::try_from(secs).unwrap_or(u64::MAX)
}
