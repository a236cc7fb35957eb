//! Retry policy for launch attempts

use std::time::Duration;

/// Delay between consecutive failed launch attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// Doubles after every failure, capped at `max`
    Exponential { initial: Duration, max: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Backoff::Fixed(Duration::from_secs(3)))
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first launch; zero is treated as one.
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Whether another attempt is allowed after `failed` attempts
    pub fn should_retry(&self, failed: u32) -> bool {
        failed < self.max_attempts
    }

    /// Delay to wait after the `failed`-th failure (1-based)
    pub fn delay_after(&self, failed: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let exponent = failed.saturating_sub(1).min(31);
                initial
                    .checked_mul(1u32 << exponent)
                    .map(|d| d.min(max))
                    .unwrap_or(max)
            }
        }
    }

    /// Upper bound on the time spent sleeping between attempts
    pub fn total_backoff(&self) -> Duration {
        let waits = self.max_attempts - 1;
        match self.backoff {
            Backoff::Fixed(delay) => delay.saturating_mul(waits),
            Backoff::Exponential { .. } => {
                // The delay stops growing after the 32nd failure.
                let growing = waits.min(32);
                (1..=growing)
                    .map(|n| self.delay_after(n))
                    .fold(Duration::ZERO, Duration::saturating_add)
                    .saturating_add(self.delay_after(32).saturating_mul(waits - growing))
            }
        }
    }
}
