use std::time::Duration;

use crate::config::ConfigError;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
/// Default growth factor between consecutive delays.
pub const DEFAULT_MULTIPLIER: f64 = 2.0;
/// Default ceiling for a single delay.
pub const DEFAULT_MAX_DELAY_SECS: u64 = 60;
/// Default retry bound.
pub const DEFAULT_MAX_RETRIES: u32 = 10;
/// Jitter perturbs each delay by at most this fraction, up or down.
pub const JITTER_FRACTION: f64 = 0.1;

/// Exponential backoff policy for rate-limited calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Factor applied to the delay after each retry (>= 1.0).
    pub multiplier: f64,

    /// Upper bound for any single delay, server hints included.
    pub max_delay: Duration,

    /// Retries allowed after the first call. `None` retries forever.
    pub max_retries: Option<u32>,

    /// Randomize delays by up to [`JITTER_FRACTION`].
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            multiplier: DEFAULT_MULTIPLIER,
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
            max_retries: Some(DEFAULT_MAX_RETRIES),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Retries until success, never giving up on rate limits.
    pub fn unbounded() -> Self {
        Self {
            max_retries: None,
            ..Self::default()
        }
    }

    /// Deterministic policy: no jitter.
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    pub fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retry number `retry` (1-based), before jitter.
    ///
    /// `base * multiplier^(retry - 1)`, raised to `hint` when the server sent
    /// one, and capped at `max_delay`.
    pub fn delay_for(&self, retry: u32, hint: Option<Duration>) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let scaled = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let delay = Duration::try_from_secs_f64(scaled).unwrap_or(self.max_delay);

        hint.map_or(delay, |hint| delay.max(hint))
            .min(self.max_delay)
    }

    /// Applies jitter to `delay` when enabled.
    pub fn jittered(&self, delay: Duration) -> Duration {
        if !self.jitter {
            return delay;
        }
        let offset = JITTER_FRACTION * (2.0 * rand::random::<f64>() - 1.0);
        Duration::try_from_secs_f64(delay.as_secs_f64() * (1.0 + offset)).unwrap_or(delay)
    }

    /// Returns `true` once `retries` retries have been spent.
    pub fn exhausted(&self, retries: u32) -> bool {
        self.max_retries.is_some_and(|max| retries >= max)
    }

    /// Checks the multiplier and delay bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                name: "retry.multiplier",
                reason: format!("must be a finite number >= 1.0, got {}", self.multiplier),
            });
        }
        if self.max_delay < self.base_delay {
            return Err(ConfigError::InvalidValue {
                name: "retry.max_delay",
                reason: format!(
                    "{:?} is shorter than the base delay {:?}",
                    self.max_delay, self.base_delay
                ),
            });
        }
        Ok(())
    }
}
