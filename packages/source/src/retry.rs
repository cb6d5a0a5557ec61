//! Backoff policy for provider throttling.
//!
//! Only HTTP 429 is retried. Each consecutive throttle on the same page
//! doubles the wait, starting from the configured initial backoff
//! (600ms, 1.2s, 2.4s, ...). After `max_retries` consecutive throttles the
//! page is abandoned and the fetch fails with whatever it already has.

use std::time::Duration;

/// Upper bound on the doubling exponent so the delay cannot overflow.
const MAX_DOUBLINGS: u32 = 16;

/// Exponential backoff for throttled page requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleBackoff {
    /// Wait before the first retry.
    pub initial: Duration,
    /// Consecutive throttles tolerated on a single page.
    pub max_retries: u32,
}

impl ThrottleBackoff {
    /// Creates a policy from an initial delay and a retry ceiling.
    #[must_use]
    pub const fn new(initial: Duration, max_retries: u32) -> Self {
        Self {
            initial,
            max_retries,
        }
    }

    /// Delay before retry number `attempt` (zero-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(MAX_DOUBLINGS);
        self.initial.saturating_mul(factor)
    }

    /// Whether another retry is allowed after `attempts` retries so far.
    #[must_use]
    pub const fn allows(&self, attempts: u32) -> bool {
        attempts < self.max_retries
    }
}
