//! Retry decisions, separated from the I/O loop that executes them.
//!
//! A pure function of (error kind, attempt count) so the backoff behavior
//! is unit-testable without any network.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::ErrorKind;

/// What the worker should do with a failed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Requeue the task after the given delay.
    Retry(Duration),
    /// Record the task as permanently failed.
    GiveUp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retry ceiling for transient errors.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    /// Upper bound of the random jitter added to each delay.
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter_ms: 250,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Decide what to do after a failed attempt. `attempt` counts attempts
    /// already consumed, so 0 means the first try just failed.
    pub fn decide(&self, kind: ErrorKind, attempt: u32) -> RetryDecision {
        match kind {
            ErrorKind::Fatal => RetryDecision::GiveUp,
            // One retry rules out a loading race; a settled page with the
            // wrong structure will not improve on further attempts.
            ErrorKind::Parse => {
                if attempt == 0 {
                    RetryDecision::Retry(Duration::from_millis(self.config.base_delay_ms))
                } else {
                    RetryDecision::GiveUp
                }
            }
            ErrorKind::Transient => {
                if attempt >= self.config.max_attempts {
                    RetryDecision::GiveUp
                } else {
                    RetryDecision::Retry(self.backoff(attempt))
                }
            }
        }
    }

    /// Exponential backoff, capped, with bounded jitter. The cap applies
    /// after jitter so the sequence never decreases.
    fn backoff(&self, attempt: u32) -> Duration {
        let exponential =
            self.config.base_delay_ms as f64 * self.config.backoff_multiplier.powi(attempt as i32);
        let jitter = if self.config.jitter_ms > 0 {
            fastrand::u64(..=self.config.jitter_ms)
        } else {
            0
        };
        let total = (exponential as u64)
            .saturating_add(jitter)
            .min(self.config.max_delay_ms);
        Duration::from_millis(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn policy_without_jitter(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_attempts,
            jitter_ms: 0,
            ..RetryConfig::default()
        })
    }

    #[test]
    fn transient_delays_are_nonnegative_and_nondecreasing() {
        let policy = policy_without_jitter(10);
        let mut last = Duration::ZERO;
        for attempt in 0..9 {
            match policy.decide(ErrorKind::Transient, attempt) {
                RetryDecision::Retry(delay) => {
                    assert!(delay >= last, "delay shrank at attempt {attempt}");
                    last = delay;
                }
                RetryDecision::GiveUp => panic!("gave up below the ceiling at {attempt}"),
            }
        }
    }

    #[test]
    fn transient_gives_up_at_ceiling() {
        let policy = policy_without_jitter(3);
        for attempt in 0..3 {
            assert!(matches!(
                policy.decide(ErrorKind::Transient, attempt),
                RetryDecision::Retry(_)
            ));
        }
        assert_eq!(policy.decide(ErrorKind::Transient, 3), RetryDecision::GiveUp);
        assert_eq!(policy.decide(ErrorKind::Transient, 4), RetryDecision::GiveUp);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(7)]
    fn fatal_always_gives_up(#[case] attempt: u32) {
        let policy = policy_without_jitter(5);
        assert_eq!(policy.decide(ErrorKind::Fatal, attempt), RetryDecision::GiveUp);
    }

    #[test]
    fn parse_errors_retry_exactly_once() {
        let policy = policy_without_jitter(5);
        assert!(matches!(
            policy.decide(ErrorKind::Parse, 0),
            RetryDecision::Retry(_)
        ));
        assert_eq!(policy.decide(ErrorKind::Parse, 1), RetryDecision::GiveUp);
        assert_eq!(policy.decide(ErrorKind::Parse, 2), RetryDecision::GiveUp);
    }

    #[test]
    fn delays_are_capped() {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: 50,
            base_delay_ms: 1_000,
            max_delay_ms: 8_000,
            backoff_multiplier: 2.0,
            jitter_ms: 0,
        });
        match policy.decide(ErrorKind::Transient, 20) {
            RetryDecision::Retry(delay) => assert_eq!(delay, Duration::from_millis(8_000)),
            RetryDecision::GiveUp => panic!("should still retry"),
        }
    }
}
