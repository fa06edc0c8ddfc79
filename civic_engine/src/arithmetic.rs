/// Civic kernel: Arithmetic Primitives
///
/// Integer only. Statistics saturate instead of overflowing and
/// never drop below zero.

/// Milliseconds per minute.
pub const MINUTE_MS: i64 = 60 * 1000;

/// Milliseconds per day.
pub const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

/// Add a signed delta to a statistic, clamping the result at zero.
pub fn apply_delta(value: i64, delta: i64) -> i64 {
    value.saturating_add(delta).max(0)
}

/// Smallest ballot count `k` with `k >= numerator/denominator * total`.
///
/// `⌈2/3 · 5⌉ = 4`, `⌈3/4 · 4⌉ = 3`. A zero denominator is treated as
/// an unreachable threshold.
pub fn supermajority(total: usize, numerator: u32, denominator: u32) -> usize {
    if denominator == 0 {
        return usize::MAX;
    }
    let scaled = (total as u64).saturating_mul(u64::from(numerator));
    let den = u64::from(denominator);
    let ceil = scaled / den + u64::from(scaled % den != 0);
    usize::try_from(ceil).unwrap_or(usize::MAX)
}

/// Add `amount` percentage points to `current`, capped at `cap`.
pub fn add_percentage(current: u32, amount: u32, cap: u32) -> u32 {
    current.saturating_add(amount).min(cap)
}

/// `value * percent / 100`, truncating toward zero.
pub fn scale_by_percent(value: i64, percent: i64) -> i64 {
    value.saturating_mul(percent) / 100
}

/// Remaining cooldown in milliseconds, or `None` once the window has elapsed.
///
/// A missing `last` timestamp means the action was never taken.
pub fn remaining_cooldown(last: Option<i64>, now: i64, window: i64) -> Option<i64> {
    let last = last?;
    let elapsed = now.saturating_sub(last);
    if elapsed < window {
        Some(window.saturating_sub(elapsed))
    } else {
        None
    }
}
