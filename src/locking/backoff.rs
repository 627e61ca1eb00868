//! Exponential backoff with jitter
//!
//! `delay = min(max_delay, base_delay * 2^attempt)`, then ±25% uniform jitter.

use std::time::Duration;

use rand::Rng;

/// Backoff delay using the thread-local RNG
pub fn delay(attempt: u32, base_delay: Duration, max_delay: Duration) -> Duration {
    delay_with_rng(attempt, base_delay, max_delay, &mut rand::thread_rng())
}

/// Backoff delay with an explicit random source (seed it for deterministic tests)
pub fn delay_with_rng<R: Rng + ?Sized>(
    attempt: u32,
    base_delay: Duration,
    max_delay: Duration,
    rng: &mut R,
) -> Duration {
    let delay = capped_delay_ms(attempt, base_delay, max_delay);
    let jitter = delay / 4;
    if jitter == 0 {
        return Duration::from_millis(delay);
    }
    let offset = rng.gen_range(0..=jitter * 2);
    Duration::from_millis(delay - jitter + offset)
}

/// Delay before jitter, in milliseconds
fn capped_delay_ms(attempt: u32, base_delay: Duration, max_delay: Duration) -> u64 {
    let base = base_delay.as_millis().min(u64::MAX as u128) as u64;
    let max = max_delay.as_millis().min(u64::MAX as u128) as u64;
    let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    base.saturating_mul(factor).min(max)
}
