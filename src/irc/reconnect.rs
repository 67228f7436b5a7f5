//! Backoff between reconnect attempts.

use std::time::Duration;

use rand::RngExt;

const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// How the read loop retries after the transport drops.
///
/// The default retries forever every two seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub interval: Duration,
    /// `None` retries indefinitely.
    pub max_attempts: Option<u32>,
    /// Upper bound of the random delay added to `interval`.
    pub jitter: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_attempts: None,
            jitter: Duration::ZERO,
        }
    }
}

impl ReconnectPolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Sleep before the next attempt.
    pub fn delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.interval;
        }
        let max_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        let extra = rand::rng().random_range(0..=max_ms);
        self.interval + Duration::from_millis(extra)
    }

    /// Whether `attempts` consecutive failures used up the budget.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}
