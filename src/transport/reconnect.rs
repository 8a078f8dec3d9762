//! Reconnection policy.
//!
//! Backoff is linear: the n-th consecutive retry waits `base_delay * n`.
//! With the defaults that is 3s, 6s, 9s, 12s, 15s, after which the
//! transport stays disconnected until `connect()` is called again.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Retries allowed after consecutive unintended closes.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Delay unit multiplied by the attempt number.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(3000);

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Tuning for the reconnection controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Retries before giving up.
    pub max_attempts: u32,
    /// Delay unit; attempt `n` waits `n * base_delay`.
    pub base_delay: Duration,
}

impl ReconnectPolicy {
    /// Creates a policy.
    #[inline]
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Returns the delay before retry number `attempt` (1-based).
    #[inline]
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
#[inline]
#[must_use]
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

// ============================================================================
// Backoff
// ============================================================================

/// Decision taken after an unintended close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Schedule one reconnection after `delay`.
    Retry {
        /// 1-based retry number.
        attempt: u32,
        /// Wait before reconnecting.
        delay: Duration,
    },
    /// Attempts are used up; stay disconnected.
    Exhausted {
        /// Retries made before giving up.
        attempts: u32,
    },
}

// ============================================================================
// ReconnectState
// ============================================================================

/// Attempt counter driven by the transport.
#[derive(Debug, Clone)]
pub struct ReconnectState {
    attempt_count: u32,
    policy: ReconnectPolicy,
}

impl ReconnectState {
    /// Creates a counter at zero attempts.
    #[inline]
    #[must_use]
    pub const fn new(policy: ReconnectPolicy) -> Self {
        Self {
            attempt_count: 0,
            policy,
        }
    }

    /// Returns retries made since the last successful open.
    #[inline]
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Returns the policy.
    #[inline]
    #[must_use]
    pub const fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Resets the counter. Called on open and on explicit disconnect.
    #[inline]
    pub fn reset(&mut self) {
        self.attempt_count = 0;
    }

    /// Records an unintended close and decides what to do next.
    pub fn on_unintended_close(&mut self) -> Backoff {
        if self.attempt_count >= self.policy.max_attempts {
            return Backoff::Exhausted {
                attempts: self.attempt_count,
            };
        }

        self.attempt_count += 1;
        Backoff::Retry {
            attempt: self.attempt_count,
            delay: self.policy.delay_for(self.attempt_count),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(3000));
    }

    #[test]
    fn test_linear_delays_then_exhausted() {
        let mut state = ReconnectState::new(ReconnectPolicy::default());

        let delays: Vec<u64> = (0..5)
            .map(|_| match state.on_unintended_close() {
                Backoff::Retry { delay, .. } => saturating_millis(delay),
                Backoff::Exhausted { .. } => panic!("exhausted too early"),
            })
            .collect();

        assert_eq!(delays, vec![3000, 6000, 9000, 12000, 15000]);
        assert_eq!(
            state.on_unintended_close(),
            Backoff::Exhausted { attempts: 5 }
        );
        assert_eq!(state.attempt_count(), 5);
    }

    #[test]
    fn test_reset_restarts_schedule() {
        let mut state = ReconnectState::new(ReconnectPolicy::default());
        state.on_unintended_close();
        state.on_unintended_close();

        state.reset();

        assert_eq!(state.attempt_count(), 0);
        assert_eq!(
            state.on_unintended_close(),
            Backoff::Retry {
                attempt: 1,
                delay: Duration::from_millis(3000)
            }
        );
    }

    #[test]
    fn test_saturating_millis() {
        assert_eq!(saturating_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(saturating_millis(Duration::ZERO), 0);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn test_zero_attempts_never_retries() {
        let mut state = ReconnectState::new(ReconnectPolicy::new(0, Duration::from_secs(1)));
        assert_eq!(
            state.on_unintended_close(),
            Backoff::Exhausted { attempts: 0 }
        );
    }

    proptest! {
        #[test]
        fn prop_retries_exactly_max_attempts(max in 0u32..20, base_ms in 1u64..10_000) {
            let policy = ReconnectPolicy::new(max, Duration::from_millis(base_ms));
            let mut state = ReconnectState::new(policy);

            let mut retries = 0u32;
            while let Backoff::Retry { attempt, delay } = state.on_unintended_close() {
                retries += 1;
                prop_assert_eq!(attempt, retries);
                prop_assert_eq!(delay, Duration::from_millis(base_ms * u64::from(attempt)));
            }

            prop_assert_eq!(retries, max);
            prop_assert_eq!(state.on_unintended_close(), Backoff::Exhausted { attempts: max });
        }
    }
}
