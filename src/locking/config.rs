//! Locking configuration
//!
//! Non-positive inputs self-correct to defaults, and `max_delay` is never
//! below `base_delay`.

use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BASE_DELAY_MS: u64 = 100;
pub const DEFAULT_MAX_DELAY_MS: u64 = 2000;
pub const DEFAULT_TIMEOUT_MS: u64 = 200;

/// Raw YAML shape, signed so negative values can be corrected rather than rejected
#[derive(Debug, Default, Deserialize)]
struct RawLockingConfig {
    #[serde(default)]
    max_attempts: i64,
    #[serde(default)]
    base_delay_ms: i64,
    #[serde(default)]
    max_delay_ms: i64,
    #[serde(default)]
    timeout_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "RawLockingConfig")]
pub struct LockingConfig {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    timeout: Duration,
}

impl LockingConfig {
    pub fn new(max_attempts: i64, base_delay_ms: i64, max_delay_ms: i64, timeout_ms: i64) -> Self {
        let max_attempts = u32::try_from(max_attempts)
            .ok()
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let base_delay_ms = positive_or(base_delay_ms, DEFAULT_BASE_DELAY_MS);
        let max_delay_ms = positive_or(max_delay_ms, DEFAULT_MAX_DELAY_MS).max(base_delay_ms);
        let timeout_ms = positive_or(timeout_ms, DEFAULT_TIMEOUT_MS);

        Self {
            max_attempts,
            base_delay: Duration::from_millis(base_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Upper bound on lock attempts per account
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Wait bound of a single attempt
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl From<RawLockingConfig> for LockingConfig {
    fn from(raw: RawLockingConfig) -> Self {
        Self::new(
            raw.max_attempts,
            raw.base_delay_ms,
            raw.max_delay_ms,
            raw.timeout_ms,
        )
    }
}

fn positive_or(value: i64, default: u64) -> u64 {
    if value > 0 { value as u64 } else { default }
}
