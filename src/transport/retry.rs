use rand::Rng;
use tokio::time::Duration;

use crate::config::Config;

/// Backoff policy for transient failures.
///
/// Defaults give the fixed schedule 1s, 2s, 4s across three retries (four
/// attempts total). Jitter is off by default so the schedule is exact.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter_factor: 0.0,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            max_retries: cfg.max_retries,
            base_delay_ms: cfg.retry_base_ms,
            max_delay_ms: cfg.retry_max_ms,
            jitter_factor: cfg.retry_jitter,
        }
    }

    /// Delay before re-issuing attempt number `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms as f64 * 2.0_f64.powi(attempt as i32);
        let clamped = base.min(self.max_delay_ms as f64);

        if self.jitter_factor <= 0.0 {
            return Duration::from_millis(clamped as u64);
        }

        let jitter_range = clamped * self.jitter_factor;
        let jitter: f64 = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
        let final_delay = (clamped + jitter).max(0.0);

        Duration::from_millis(final_delay as u64)
    }
}
